use galman::collection::{Collection, AIRLOCK_DIR};
use galman::import::{IgnoreReason, IgnoredExtensions, ImportConfig, ImportOutcome, Importer};
use galman::scanner::{compute_key, ContentKey, KeyFormat, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn importer() -> Importer {
    Importer::new(KeyFormat::default(), ImportConfig::default())
}

fn staged_names(collection: &Collection) -> Vec<String> {
    collection
        .staged_files()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_identical_files_under_different_names() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("downloads");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.jpg"), b"same bytes").unwrap();
    fs::write(source.join("b.jpg"), b"same bytes").unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = importer().import_from(&collection, &source).unwrap();

    let key = compute_key(&source.join("a.jpg"), &KeyFormat::default()).unwrap();
    assert_eq!(staged_names(&collection), vec![format!("{key}.jpg")]);
    assert_eq!(report.copied_count(), 1);
    assert_eq!(report.ignored_count(), 1);
    assert!(matches!(
        report.entries[1].outcome,
        ImportOutcome::Ignored {
            reason: IgnoreReason::AlreadyStaged,
            ..
        }
    ));
}

#[test]
fn test_second_import_ignores_everything() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir_all(source.join("nested")).unwrap();
    fs::write(source.join("one.png"), b"one").unwrap();
    fs::write(source.join("nested/two.gif"), b"two").unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let first = importer().import_from(&collection, &source).unwrap();
    let second = importer().import_from(&collection, &source).unwrap();

    assert_eq!(first.copied_count(), 2);
    assert_eq!(second.copied_count(), 0);
    assert_eq!(second.ignored_count(), 2);
    assert_eq!(staged_names(&collection).len(), 2);
}

#[test]
fn test_files_visited_deepest_first() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir_all(source.join("b/deep")).unwrap();
    fs::write(source.join("a.jpg"), b"top").unwrap();
    fs::write(source.join("b/deep/c.jpg"), b"deepest").unwrap();
    fs::write(source.join("b/d.jpg"), b"middle").unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = importer().import_from(&collection, &source).unwrap();

    let order: Vec<_> = report
        .entries
        .iter()
        .map(|e| e.source.strip_prefix(&source).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        order,
        vec![
            Path::new("b/deep/c.jpg").to_path_buf(),
            Path::new("b/d.jpg").to_path_buf(),
            Path::new("a.jpg").to_path_buf(),
        ]
    );
}

#[test]
fn test_json_sidecars_always_ignored() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("photo.jpg"), b"pixels").unwrap();
    fs::write(source.join("photo.json"), b"{}").unwrap();
    fs::write(source.join("LOUD.JSON"), b"{}").unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = importer().import_from(&collection, &source).unwrap();

    let ignored: Vec<_> = report
        .entries
        .iter()
        .filter(|e| {
            matches!(
                e.outcome,
                ImportOutcome::Ignored {
                    reason: IgnoreReason::IgnoredExtension,
                    key: None
                }
            )
        })
        .collect();
    assert_eq!(ignored.len(), 2);
    assert_eq!(staged_names(&collection).len(), 1);
}

#[test]
fn test_custom_ignored_extensions() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("clip.json"), b"{}").unwrap();
    fs::write(source.join("notes.xmp"), b"<x/>").unwrap();

    let config = ImportConfig {
        ignored_extensions: IgnoredExtensions::new(["xmp"]),
        ..ImportConfig::default()
    };
    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = Importer::new(KeyFormat::default(), config)
        .import_from(&collection, &source)
        .unwrap();

    assert_eq!(report.copied_count(), 1);
    assert!(staged_names(&collection)[0].ends_with(".json"));
}

#[test]
fn test_narrow_key_format() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("x.webm"), vec![7u8; 300]).unwrap();

    let format = KeyFormat::new(8, 4).unwrap();
    let collection = Collection::open(&dir.path().join("col")).unwrap();
    Importer::new(format, ImportConfig::default())
        .import_from(&collection, &source)
        .unwrap();

    let names = staged_names(&collection);
    assert_eq!(names.len(), 1);
    let (key, ext) = names[0].split_at(12);
    assert_eq!(ext, ".webm");
    assert!(key.ends_with("012c"));
}

#[test]
fn test_size_wider_than_field_is_kept_whole() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("x.webm"), vec![7u8; 300]).unwrap();

    let format = KeyFormat::new(8, 2).unwrap();
    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let importer = Importer::new(format, ImportConfig::default());
    importer.import_from(&collection, &source).unwrap();

    let names = staged_names(&collection);
    assert_eq!(names.len(), 1);
    let (key, ext) = names[0].split_at(11);
    assert_eq!(ext, ".webm");
    assert!(key.ends_with("12c"));
    assert_eq!(
        ContentKey::from_staged_name(&names[0], &format).unwrap().as_str(),
        key
    );

    // Still recognised as staged on the next run
    let report = importer.import_from(&collection, &source).unwrap();
    assert_eq!(report.copied_count(), 0);
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_copied_not_linked() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let outside = dir.path().join("real.jpg");
    fs::write(&outside, b"linked content").unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    symlink(&outside, source.join("link.jpg")).unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = importer().import_from(&collection, &source).unwrap();

    assert_eq!(report.copied_count(), 1);
    let staged = collection.staged_files().unwrap();
    let meta = fs::symlink_metadata(&staged[0]).unwrap();
    assert!(meta.file_type().is_file());
    assert_eq!(fs::read(&staged[0]).unwrap(), b"linked content");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_reported_as_failure() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    symlink(dir.path().join("missing"), source.join("broken.jpg")).unwrap();
    fs::write(source.join("fine.jpg"), b"fine").unwrap();

    let collection = Collection::open(&dir.path().join("col")).unwrap();
    let report = importer().import_from(&collection, &source).unwrap();

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.copied_count(), 1);
    assert!(report.has_failures());

    let strict = Importer::new(
        KeyFormat::default(),
        ImportConfig {
            strict: true,
            ..ImportConfig::default()
        },
    );
    let other = Collection::open(&dir.path().join("col2")).unwrap();
    assert!(strict.import_from(&other, &source).is_err());
}

#[cfg(unix)]
#[test]
fn test_directory_links_followed_only_when_enabled() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let elsewhere = dir.path().join("elsewhere");
    fs::create_dir(&elsewhere).unwrap();
    fs::write(elsewhere.join("far.jpg"), b"far away").unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    symlink(&elsewhere, source.join("linked_dir")).unwrap();

    let plain = Collection::open(&dir.path().join("plain")).unwrap();
    let report = importer().import_from(&plain, &source).unwrap();
    assert_eq!(report.copied_count(), 0);

    let following = Importer::new(
        KeyFormat::default(),
        ImportConfig {
            walker: WalkerConfig {
                follow_dir_links: true,
            },
            ..ImportConfig::default()
        },
    );
    let followed = Collection::open(&dir.path().join("followed")).unwrap();
    let report = following.import_from(&followed, &source).unwrap();
    assert_eq!(report.copied_count(), 1);
}

#[test]
fn test_inbox_lives_under_airlock() {
    let dir = tempdir().unwrap();
    let collection = Collection::open(dir.path()).unwrap();
    assert_eq!(collection.inbox_path(), dir.path().join(AIRLOCK_DIR));
}
