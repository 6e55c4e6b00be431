use clap::Parser;
use galman::cli::Cli;
use galman::error::ExitCode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Temp workspace with an empty config file so the user's own config never
/// leaks into a test run.
struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let mut argv = vec![
            "galman".to_string(),
            "-q".to_string(),
            "--no-color".to_string(),
            "--config".to_string(),
            self.config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        galman::run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_import_then_reimport() {
    let ws = Workspace::new();
    let source = ws.path("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.jpg"), b"alpha").unwrap();
    fs::write(source.join("b.jpg"), b"alpha").unwrap();
    fs::write(source.join("c.mp4"), b"gamma").unwrap();
    let col = ws.path("col");

    let code = ws.run(&["import", s(&col), s(&source)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(count_files(&col.join(".airlock")), 2);

    let code = ws.run(&["import", s(&col), s(&source)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(count_files(&col.join(".airlock")), 2);
    assert!(col.join(".blacklist").is_file());
    assert!(col.join(".whitelist").is_file());
}

#[test]
fn test_import_missing_source_fails_before_bootstrap() {
    let ws = Workspace::new();
    let col = ws.path("col");

    let result = ws.run(&["import", s(&col), s(&ws.path("nowhere"))]);
    assert!(result.is_err());
    assert!(!col.exists());
}

#[test]
fn test_import_source_is_file() {
    let ws = Workspace::new();
    let file = ws.path("file.jpg");
    fs::write(&file, b"x").unwrap();

    let result = ws.run(&["import", s(&ws.path("col")), s(&file)]);
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("not a directory"));
}

#[cfg(unix)]
#[test]
fn test_import_partial_success_and_strict() {
    use std::os::unix::fs::symlink;

    let ws = Workspace::new();
    let source = ws.path("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("good.jpg"), b"good").unwrap();
    symlink(ws.path("void"), source.join("bad.jpg")).unwrap();

    let code = ws.run(&["import", s(&ws.path("lenient")), s(&source)]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);

    let result = ws.run(&["import", s(&ws.path("strict")), s(&source), "--strict"]);
    assert!(result.is_err());
    // The collection was still closed cleanly
    assert!(ws.path("strict").join(".blacklist").is_file());
}

#[test]
fn test_import_json_output() {
    let ws = Workspace::new();
    let source = ws.path("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.jpg"), b"alpha").unwrap();

    let code = ws
        .run(&["import", s(&ws.path("col")), s(&source), "--output", "json"])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_review_empty_inbox_exits_cleanly() {
    let ws = Workspace::new();
    let col = ws.path("col");

    let code = ws.run(&["review", s(&col)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    // Reviewing bootstraps the layout
    assert!(col.join(".airlock").is_dir());
    assert!(col.join("Gallery").is_dir());
}

#[test]
fn test_view_empty_gallery_exits_cleanly() {
    let ws = Workspace::new();
    let code = ws.run(&["view", s(&ws.path("col")), "--delay", "1"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_status_requires_existing_collection() {
    let ws = Workspace::new();
    assert!(ws.run(&["status", s(&ws.path("col"))]).is_err());
    assert!(!ws.path("col").exists());
}

#[test]
fn test_status_after_import() {
    let ws = Workspace::new();
    let source = ws.path("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.jpg"), b"alpha").unwrap();
    let col = ws.path("col");
    ws.run(&["import", s(&col), s(&source)]).unwrap();

    assert_eq!(ws.run(&["status", s(&col)]).unwrap(), ExitCode::Success);
    assert_eq!(
        ws.run(&["status", s(&col), "--output", "json"]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_status_leaves_collection_untouched() {
    let ws = Workspace::new();
    let col = ws.path("col");
    fs::create_dir(&col).unwrap();
    fs::write(col.join(".whitelist"), "ff\n00\n").unwrap();

    assert_eq!(ws.run(&["status", s(&col)]).unwrap(), ExitCode::Success);
    assert!(!col.join(".airlock").exists());
    assert!(!col.join("Gallery").exists());
    assert!(!col.join(".blacklist").exists());
    assert_eq!(fs::read_to_string(col.join(".whitelist")).unwrap(), "ff\n00\n");
}

#[test]
fn test_invalid_config_is_fatal() {
    let ws = Workspace::new();
    fs::write(&ws.config, "hash_width = 0\n").unwrap();

    let err = ws.run(&["status", s(&ws.dir.path())]).unwrap_err();
    assert!(format!("{err:#}").contains("configuration"));
}

#[test]
fn test_collection_root_is_a_file() {
    let ws = Workspace::new();
    let source = ws.path("src");
    fs::create_dir(&source).unwrap();
    let not_a_dir = ws.path("col");
    fs::write(&not_a_dir, b"oops").unwrap();

    assert!(ws.run(&["import", s(&not_a_dir), s(&source)]).is_err());
}
