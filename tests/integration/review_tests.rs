use galman::collection::{Collection, BLACKLIST_FILE, GALLERY_DIR, WHITELIST_FILE};
use galman::import::{ImportConfig, Importer};
use galman::review::{
    events, PlaybackSurface, ReviewConfig, ReviewEvent, ReviewSession, SessionOutcome, SurfaceError,
};
use galman::scanner::{compute_key, ContentKey, KeyFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Surface that answers every `show` with the next scripted event.
struct Scripted {
    script: Vec<ReviewEvent>,
    sender: std::sync::mpsc::Sender<ReviewEvent>,
    shown: Vec<PathBuf>,
}

impl PlaybackSurface for Scripted {
    fn show(&mut self, path: &Path, _position: usize, _total: usize) -> Result<(), SurfaceError> {
        self.shown.push(path.to_path_buf());
        if !self.script.is_empty() {
            let event = self.script.remove(0);
            let _ = self.sender.send(event);
        }
        Ok(())
    }

    fn stop(&mut self) {}
}

fn review(collection: &mut Collection, script: &[ReviewEvent]) -> galman::review::ReviewSummary {
    let (tx, rx) = events::channel();
    let mut surface = Scripted {
        script: script.to_vec(),
        sender: tx,
        shown: Vec::new(),
    };
    ReviewSession::new(collection, KeyFormat::default(), ReviewConfig::default())
        .unwrap()
        .run(&mut surface, &rx)
        .unwrap()
}

fn setup(content: &[u8], name: &str) -> (TempDir, PathBuf, PathBuf, ContentKey) {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join(name), content).unwrap();
    let key = compute_key(&source.join(name), &KeyFormat::default()).unwrap();
    let root = dir.path().join("col");
    (dir, source, root, key)
}

fn import(collection: &Collection, source: &Path) -> galman::import::ImportReport {
    Importer::new(KeyFormat::default(), ImportConfig::default())
        .import_from(collection, source)
        .unwrap()
}

#[test]
fn test_reject_then_reimport_copies_nothing() {
    let (_dir, source, root, key) = setup(b"unwanted", "meme.jpg");

    let mut collection = Collection::open(&root).unwrap();
    import(&collection, &source);
    let summary = review(&mut collection, &[ReviewEvent::Reject]);
    assert_eq!(summary.blacklisted, 1);
    collection.close().unwrap();

    let blacklist = fs::read_to_string(root.join(BLACKLIST_FILE)).unwrap();
    assert_eq!(blacklist, format!("{key}\n"));

    let collection = Collection::open(&root).unwrap();
    assert!(collection.staged_files().unwrap().is_empty());
    assert!(collection.is_known(&key));
    let report = import(&collection, &source);
    assert_eq!(report.copied_count(), 0);
    assert!(collection.staged_files().unwrap().is_empty());
}

#[test]
fn test_accept_lands_in_gallery() {
    let (_dir, source, root, key) = setup(b"keeper", "cat.png");

    let mut collection = Collection::open(&root).unwrap();
    import(&collection, &source);
    review(&mut collection, &[ReviewEvent::Accept]);
    collection.close().unwrap();

    let gallery_file = root.join(GALLERY_DIR).join(format!("{key}.png"));
    assert_eq!(fs::read(&gallery_file).unwrap(), b"keeper");
    let whitelist = fs::read_to_string(root.join(WHITELIST_FILE)).unwrap();
    assert!(whitelist.lines().any(|l| l == key.as_str()));

    let collection = Collection::open(&root).unwrap();
    assert!(collection.is_accepted(&key));
    assert!(collection.staged_files().unwrap().is_empty());
}

#[test]
fn test_mixed_session_and_quit() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src");
    fs::create_dir(&source).unwrap();
    for (name, body) in [("1.jpg", "first"), ("2.jpg", "second"), ("3.jpg", "third")] {
        fs::write(source.join(name), body).unwrap();
    }
    let root = dir.path().join("col");

    let mut collection = Collection::open(&root).unwrap();
    import(&collection, &source);
    let summary = review(
        &mut collection,
        &[ReviewEvent::Accept, ReviewEvent::Reject, ReviewEvent::Quit],
    );

    assert_eq!(summary.outcome, SessionOutcome::Aborted);
    assert_eq!(summary.whitelisted, 1);
    assert_eq!(summary.blacklisted, 1);
    assert_eq!(summary.remaining, 1);
    assert_eq!(collection.staged_files().unwrap().len(), 1);
    assert_eq!(collection.gallery_files().unwrap().len(), 1);
    collection.close().unwrap();

    // The undecided file is presented again next time
    let mut collection = Collection::open(&root).unwrap();
    let summary = review(&mut collection, &[ReviewEvent::Reject]);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.outcome, SessionOutcome::Complete);
}

#[test]
fn test_decisions_survive_without_close() {
    let (_dir, source, root, key) = setup(b"crashy", "a.gif");

    {
        let mut collection = Collection::open(&root).unwrap();
        import(&collection, &source);
        review(&mut collection, &[ReviewEvent::Reject]);
        std::mem::forget(collection);
    }

    // Each decision is flushed as it is made
    let blacklist = fs::read_to_string(root.join(BLACKLIST_FILE)).unwrap();
    assert!(blacklist.contains(key.as_str()));
}

#[test]
fn test_hand_renamed_file_keyed_by_content() {
    let (_dir, _source, root, key) = setup(b"renamed", "x.jpg");

    let mut collection = Collection::open(&root).unwrap();
    fs::write(collection.inbox_path().join("holiday.jpg"), b"renamed").unwrap();
    review(&mut collection, &[ReviewEvent::Accept]);

    assert!(collection.is_accepted(&key));
    assert!(collection.output_path().join("holiday.jpg").is_file());
}

#[test]
fn test_accept_after_lost_whitelist_completes() {
    let (_dir, source, root, key) = setup(b"moved, never recorded", "clip.mp4");

    let mut collection = Collection::open(&root).unwrap();
    import(&collection, &source);
    review(&mut collection, &[ReviewEvent::Accept]);
    collection.close().unwrap();

    // The move happened but the whitelist write was lost
    fs::write(root.join(WHITELIST_FILE), "").unwrap();

    let mut collection = Collection::open(&root).unwrap();
    assert_eq!(import(&collection, &source).copied_count(), 1);
    let summary = review(&mut collection, &[ReviewEvent::Accept]);
    assert_eq!(summary.whitelisted, 1);
    assert_eq!(summary.failed, 0);
    collection.close().unwrap();

    let collection = Collection::open(&root).unwrap();
    assert!(collection.is_accepted(&key));
    assert!(collection.staged_files().unwrap().is_empty());
    assert_eq!(collection.gallery_files().unwrap().len(), 1);
}
