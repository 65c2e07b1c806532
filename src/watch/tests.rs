use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::classifier::EventClassifier;
use super::debouncer::{DEBOUNCE_MS, Debouncer, is_temp_file};
use super::types::ChangeKind;
use super::{FsWatcher, WatchEvent};
use crate::asset::glob::GlobList;
use crate::utils::path::normalize_path;

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn globs(patterns: &[&str]) -> GlobList {
    let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
    GlobList::new(&patterns).unwrap()
}

// =============================================================================
// Debouncer
// =============================================================================

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.css"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.css"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.css"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.css")], ChangeKind::Created);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/b.css")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/c.css")], ChangeKind::Removed);
}

#[test]
fn test_metadata_change_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], metadata_kind()));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css.swp", "/tmp/.a.css", "/tmp/a.css~"], modify_kind()));
    assert!(debouncer.changes.is_empty());

    assert!(is_temp_file(Path::new("/x/base.css.bak")));
    assert!(!is_temp_file(Path::new("/x/base.css")));
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.css", "/tmp/a.css"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.css")], ChangeKind::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], create_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.css")], ChangeKind::Created);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], remove_kind()));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], remove_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.css")], ChangeKind::Removed);
}

#[test]
fn test_take_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.css"], modify_kind()));

    let dur = debouncer.sleep_duration();
    assert!(dur <= Duration::from_millis(DEBOUNCE_MS));
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
    let taken = debouncer.take_if_ready().unwrap();
    assert_eq!(taken.len(), 1);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.take_if_ready().is_none());
}

// =============================================================================
// EventClassifier
// =============================================================================

#[test]
fn test_correct_by_existence() {
    let tmp = TempDir::new().unwrap();
    let existing = tmp.path().join("kept.css");
    std::fs::write(&existing, "").unwrap();
    let gone_created = tmp.path().join("gone-created.css");
    let gone_modified = tmp.path().join("gone-modified.css");

    let mut changes = FxHashMap::default();
    changes.insert(existing.clone(), ChangeKind::Removed);
    changes.insert(gone_created.clone(), ChangeKind::Created);
    changes.insert(gone_modified.clone(), ChangeKind::Modified);

    EventClassifier::correct_by_existence(&mut changes);

    assert_eq!(changes[&existing], ChangeKind::Modified);
    assert!(!changes.contains_key(&gone_created));
    assert_eq!(changes[&gone_modified], ChangeKind::Removed);
}

#[test]
fn test_classify_filters_by_glob_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let root = normalize_path(tmp.path());
    let css = root.join("src/css");
    std::fs::create_dir_all(css.join("partials")).unwrap();
    std::fs::write(css.join("partials/b.css"), "").unwrap();
    std::fs::write(css.join("a.css"), "").unwrap();
    std::fs::write(css.join("notes.md"), "").unwrap();

    let mut raw = FxHashMap::default();
    raw.insert(css.join("partials/b.css"), ChangeKind::Modified);
    raw.insert(css.join("a.css"), ChangeKind::Created);
    raw.insert(css.join("notes.md"), ChangeKind::Modified);
    raw.insert(css.join("partials"), ChangeKind::Modified);
    raw.insert(css.join("deleted.css"), ChangeKind::Removed);

    let events = EventClassifier::classify(raw, &root, &globs(&["src/css/**/*.css"]))
        .unwrap()
        .into_events();

    assert_eq!(
        events,
        vec![
            WatchEvent { kind: ChangeKind::Created, path: css.join("a.css") },
            WatchEvent { kind: ChangeKind::Removed, path: css.join("deleted.css") },
            WatchEvent { kind: ChangeKind::Modified, path: css.join("partials/b.css") },
        ]
    );
}

#[test]
fn test_classify_nothing_actionable() {
    let tmp = TempDir::new().unwrap();
    let root = normalize_path(tmp.path());
    let mut raw = FxHashMap::default();
    raw.insert(root.join("README.md"), ChangeKind::Removed);
    assert!(EventClassifier::classify(raw, &root, &globs(&["src/**/*.css"])).is_none());
}

// =============================================================================
// FsWatcher
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_watcher_delivers_matching_change() {
    let tmp = TempDir::new().unwrap();
    let root = normalize_path(tmp.path());
    let dir = root.join("src/css");
    std::fs::create_dir_all(&dir).unwrap();

    let watcher = FsWatcher::new(&root, globs(&["src/css/**/*.css"])).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    tokio::spawn(watcher.run(tx));

    std::fs::write(dir.join("ignored.txt"), "x").unwrap();
    std::fs::write(dir.join("base.css"), "body{}").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.path, dir.join("base.css"));
    assert!(event.kind.is_actionable());
}
