//! Tests for in-memory archive semantics
//!
//! These tests verify:
//! - Open/create behavior and dirty tracking
//! - Tree navigation through FolderId handles
//! - Entry lifecycle before any sync (fresh entries, immediate erase)
//! - Tombstone slot reuse in the folder slab
//! - Typed navigation and validation errors

use std::path::PathBuf;

use packfs::{Archive, Config, EntryKind, PackError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn scratch() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.pack");
    (temp_dir, path)
}

/// Write a source file with the given bytes, returning its path
fn write_source(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// =============================================================================
// Open / Create
// =============================================================================

#[test]
fn test_open_creates_missing_archive() {
    let (_temp, path) = scratch();

    let archive = Archive::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(archive.folder_count(), 1); // just the root
    assert_eq!(archive.data_size(), 0);
    assert!(archive.is_dirty()); // must be synced once to be loadable
}

#[test]
fn test_open_missing_without_create_fails() {
    let (_temp, path) = scratch();
    let config = Config::builder().create_if_missing(false).build();

    let result = Archive::open_with(&path, config);

    assert!(matches!(result, Err(PackError::Io(_))));
    assert!(!path.exists());
}

#[test]
fn test_open_zero_length_file_starts_fresh() {
    let (_temp, path) = scratch();
    std::fs::write(&path, b"").unwrap();

    let archive = Archive::open(&path).unwrap();

    assert_eq!(archive.folder_count(), 1);
    assert!(archive.is_dirty());
}

#[test]
fn test_open_garbage_file_fails_with_corruption() {
    let (_temp, path) = scratch();
    std::fs::write(&path, b"definitely not an archive trailer").unwrap();

    let result = Archive::open(&path);

    assert!(matches!(result, Err(PackError::Corruption(_))));
}

#[test]
fn test_open_tiny_file_fails_with_corruption() {
    let (_temp, path) = scratch();
    std::fs::write(&path, b"x").unwrap();

    let result = Archive::open(&path);

    assert!(matches!(result, Err(PackError::Corruption(_))));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_root_parent_is_root() {
    let (_temp, path) = scratch();
    let archive = Archive::open(&path).unwrap();

    let root = archive.root();

    assert_eq!(archive.parent(root), root);
}

#[test]
fn test_child_folder_navigation() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    let docs = archive.add_folder(root, "docs").unwrap();

    let (index, entry) = archive.entries(root).next().unwrap();
    assert_eq!(entry.name(), "docs");
    assert_eq!(entry.kind(), EntryKind::Folder);

    assert_eq!(archive.child_folder(root, index).unwrap(), docs);
    assert_eq!(archive.parent(docs), root);
}

#[test]
fn test_child_folder_on_file_entry_fails() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    let source = write_source(&temp, "src.bin", b"data");

    archive.add_file(root, "file.bin", &source).unwrap();

    let (index, _) = archive.entries(root).next().unwrap();
    let result = archive.child_folder(root, index);
    assert!(matches!(result, Err(PackError::NotAFolder)));
}

#[test]
fn test_extract_on_folder_entry_fails() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    archive.add_folder(root, "docs").unwrap();

    let (index, _) = archive.entries(root).next().unwrap();
    let dest = temp.path().join("out.bin");
    let result = archive.extract(root, index, &dest);
    assert!(matches!(result, Err(PackError::NotAFile)));
}

// =============================================================================
// Entry Lifecycle (pre-sync)
// =============================================================================

#[test]
fn test_fresh_file_entry_is_uncommitted() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    let source = write_source(&temp, "src.bin", b"payload");

    archive.add_file(root, "file.bin", &source).unwrap();

    let (_, entry) = archive.entries(root).next().unwrap();
    assert!(!entry.is_committed());
    assert_eq!(entry.size(), 0); // no byte range until sync
    assert!(archive.is_dirty());
}

#[test]
fn test_removing_fresh_entry_erases_immediately() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    let source = write_source(&temp, "src.bin", b"payload");

    archive.add_file(root, "file.bin", &source).unwrap();
    let (index, _) = archive.entries(root).next().unwrap();
    archive.remove(root, index);

    assert_eq!(archive.entries(root).count(), 0);
}

#[test]
fn test_duplicate_names_are_permitted() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    let source = write_source(&temp, "src.bin", b"payload");

    archive.add_file(root, "same", &source).unwrap();
    archive.add_file(root, "same", &source).unwrap();

    let names: Vec<_> = archive
        .entries(root)
        .map(|(_, e)| e.name().to_string())
        .collect();
    assert_eq!(names, ["same", "same"]);
}

#[test]
fn test_name_with_nul_byte_is_rejected() {
    let (temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();
    let source = write_source(&temp, "src.bin", b"payload");

    let result = archive.add_file(root, "bad\0name", &source);
    assert!(matches!(result, Err(PackError::InvalidName(_))));

    let result = archive.add_folder(root, "bad\0dir");
    assert!(matches!(result, Err(PackError::InvalidName(_))));
}

// =============================================================================
// Folder Slab
// =============================================================================

#[test]
fn test_fresh_folder_removal_reuses_slot() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    let first = archive.add_folder(root, "first").unwrap();
    assert_eq!(archive.folder_count(), 2);

    let (index, _) = archive.entries(root).next().unwrap();
    archive.remove(root, index);
    assert_eq!(archive.folder_count(), 2); // tombstoned, not shrunk

    let second = archive.add_folder(root, "second").unwrap();
    assert_eq!(archive.folder_count(), 2); // slot revived, no growth
    assert_eq!(second, first);
}

#[test]
fn test_slab_grows_when_no_tombstones() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    archive.add_folder(root, "a").unwrap();
    archive.add_folder(root, "b").unwrap();
    archive.add_folder(root, "c").unwrap();

    assert_eq!(archive.folder_count(), 4);
}

#[test]
fn test_nested_folders_record_their_parent() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    let outer = archive.add_folder(root, "outer").unwrap();
    let inner = archive.add_folder(outer, "inner").unwrap();

    assert_eq!(archive.parent(inner), outer);
    assert_eq!(archive.parent(outer), root);
}

// =============================================================================
// Dirty Tracking
// =============================================================================

#[test]
fn test_sync_clears_dirty_and_mutation_sets_it_again() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    assert!(archive.is_dirty());
    archive.sync().unwrap();
    assert!(!archive.is_dirty());

    archive.add_folder(root, "docs").unwrap();
    assert!(archive.is_dirty());
}

#[test]
fn test_remove_marks_archive_dirty() {
    let (_temp, path) = scratch();
    let mut archive = Archive::open(&path).unwrap();
    let root = archive.root();

    archive.add_folder(root, "docs").unwrap();
    archive.sync().unwrap();
    assert!(!archive.is_dirty());

    let (index, _) = archive.entries(root).next().unwrap();
    archive.remove(root, index);
    assert!(archive.is_dirty());
}
