use galman::collection::{
    Collection, CollectionError, AIRLOCK_DIR, BLACKLIST_FILE, STAGING_TEMP_PREFIX, WHITELIST_FILE,
};
use galman::scanner::ContentKey;
use galman::store::{self, DecisionSet};
use std::fs;
use tempfile::tempdir;

const KEY_A: &str = "0123456789abcdef0123456789abcdef00000010";
const KEY_B: &str = "fedcba9876543210fedcba9876543210000000ff";

#[test]
fn test_decision_file_replaced_by_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(WHITELIST_FILE)).unwrap();

    let err = Collection::open(dir.path()).unwrap_err();
    assert!(matches!(err, CollectionError::Persistence(_)));
}

#[test]
fn test_blank_lines_and_crlf_tolerated() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(BLACKLIST_FILE),
        format!("\r\n{KEY_B}\r\n\r\n{KEY_A}\r\n\n"),
    )
    .unwrap();

    let collection = Collection::open(dir.path()).unwrap();
    assert_eq!(collection.rejected().len(), 2);
    assert!(collection.is_rejected(&ContentKey::from_stored(KEY_A)));
    collection.close().unwrap();

    // Rewritten sorted and clean
    let content = fs::read_to_string(dir.path().join(BLACKLIST_FILE)).unwrap();
    assert_eq!(content, format!("{KEY_A}\n{KEY_B}\n"));
}

#[test]
fn test_empty_line_never_matches_everything() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(WHITELIST_FILE), "\n\n").unwrap();

    let collection = Collection::open(dir.path()).unwrap();
    assert!(collection.accepted().is_empty());
    assert!(!collection.is_known(&ContentKey::from_stored("")));
}

#[test]
fn test_missing_decision_file_recreated() {
    let dir = tempdir().unwrap();
    {
        let mut collection = Collection::open(dir.path()).unwrap();
        collection.mark_rejected(ContentKey::from_stored(KEY_A));
    }
    fs::remove_file(dir.path().join(WHITELIST_FILE)).unwrap();

    let collection = Collection::open(dir.path()).unwrap();
    assert!(dir.path().join(WHITELIST_FILE).is_file());
    assert!(collection.is_rejected(&ContentKey::from_stored(KEY_A)));
}

#[test]
fn test_leftover_staging_temp_ignored() {
    let dir = tempdir().unwrap();
    let collection = Collection::open(dir.path()).unwrap();
    let airlock = dir.path().join(AIRLOCK_DIR);
    fs::write(airlock.join(format!("{STAGING_TEMP_PREFIX}abc123")), b"partial").unwrap();
    fs::write(airlock.join(format!("{KEY_A}.jpg")), b"whole").unwrap();

    let staged = collection.staged_files().unwrap();
    assert_eq!(staged.len(), 1);
    assert!(staged[0].ends_with(format!("{KEY_A}.jpg")));
}

#[test]
fn test_store_save_replaces_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys");
    fs::write(&path, "stale\n").unwrap();

    let set: DecisionSet = [KEY_B, KEY_A]
        .into_iter()
        .map(ContentKey::from_stored)
        .collect();
    store::save(&path, &set).unwrap();

    assert_eq!(store::load(&path).unwrap(), set);
    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}
