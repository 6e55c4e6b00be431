use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use galman::config::{Config, ConfigError};
use galman::review::KeyMap;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.hash_width, 32);
    assert_eq!(config.size_width, 8);
    assert_eq!(config.bindings.quit, vec!["q"]);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
hash_width = 16
ignored_extensions = ["xmp", ".JSON"]
use_trash = true
viewer = "mpv --mute=yes"
view_delay = 2

[bindings]
accept = ["Enter", "y"]
quit = ["Esc", "Ctrl+q"]
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.hash_width, 16);
    assert_eq!(config.size_width, 8);
    assert!(config.use_trash);
    assert_eq!(config.viewer.as_deref(), Some("mpv --mute=yes"));
    assert_eq!(config.view_delay, 2);
    assert_eq!(config.bindings.accept, vec!["Enter", "y"]);
    // Unset nested keys keep their defaults
    assert_eq!(config.bindings.reject, vec!["8", "\\"]);
    assert!(KeyMap::from_bindings(&config.bindings).is_ok());
}

#[test]
fn test_config_later_layers_win() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "view_delay = 7\nstrict = true\n").unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Serialized::default("view_delay", 9));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.view_delay, 9);
    assert!(config.strict);
}

#[test]
fn test_config_invalid_width_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "size_width = 17\n").unwrap();

    let err = Config::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::KeyFormat(_)));
}

#[test]
fn test_config_type_error_reported() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "hash_width = \"wide\"\n").unwrap();

    let err = Config::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_config_missing_explicit_file() {
    let temp_dir = tempdir().unwrap();
    let err = Config::load(Some(&temp_dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}
