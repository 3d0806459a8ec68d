//! Command layer (spec §4.12): the six user-facing operations, each
//! implemented purely in terms of the engine (`strategy`, `chain`) and a
//! `Store`. Kept free of any CLI/argument-parsing concerns so it can be
//! exercised directly in tests, with `main.rs` as the only caller that
//! knows about `clap` or touches a destination path.

use crate::chain::{self, VersionSource};
use crate::error::Error;
use crate::format::Metadata;
use crate::store::Store;
use crate::strategy;

/// Records a new version of `name` with the given `bytes`, returning the
/// metadata of the version just written.
pub fn track(store: &Store, name: &str, bytes: &[u8], message: &str) -> Result<Metadata, Error> {
    store.track(name, bytes, message)
}

/// Byte-level summary of the difference between two tracked versions, for
/// the CLI's `diff` subcommand. The engine only produces COPY/INSERT
/// instructions, not a human-readable line diff, so this reports sizes
/// and operation count rather than reformatting the operation stream.
pub struct DiffSummary {
    pub operation_count: usize,
    pub bytes_added: u64,
    pub bytes_copied: u64,
    pub bytes_removed: u64,
}

/// Reconstructs both `v1` and `v2` of `name` and summarizes the delta
/// between them. Computed on demand against the reconstructed bytes,
/// independent of whatever consecutive deltas the store happens to have
/// on disk between those two versions.
pub fn diff(store: &Store, name: &str, v1: u32, v2: u32) -> Result<DiffSummary, Error> {
    let before = chain::reconstruct(store, name, v1)?;
    let after = chain::reconstruct(store, name, v2)?;
    let (delta, _strategy) = strategy::build_delta(&before, &after);
    let bytes_copied = delta.new_size - delta.delta_size;
    Ok(DiffSummary {
        operation_count: delta.operation_count(),
        bytes_added: delta.delta_size,
        bytes_copied,
        bytes_removed: delta.original_size.saturating_sub(bytes_copied),
    })
}

/// Every recorded version's metadata for `name`, oldest first.
pub fn history(store: &Store, name: &str) -> Result<Vec<Metadata>, Error> {
    store.history(name)
}

/// A tracked name with its latest version number and reconstructed size.
pub struct ListEntry {
    pub name: String,
    pub version: u32,
    pub size: u32,
}

/// Every tracked name in the store, with its latest version number and
/// size (requires the directory-wide scan that `Store::list_names`
/// supplies, a capability beyond the engine's minimal `VersionSource`).
///
/// Size is the reconstructed byte length of the head revision, not the
/// metadata record's `original_size` (which names the *previous*
/// version's size, the reference the head was built against).
pub fn list(store: &Store) -> Result<Vec<ListEntry>, Error> {
    let mut entries = Vec::new();
    for name in store.list_names()? {
        let (head_bytes, head_version) = chain::reconstruct_head(store, &name)?;
        if head_version > 0 {
            entries.push(ListEntry {
                name,
                version: head_version,
                size: head_bytes.len() as u32,
            });
        }
    }
    Ok(entries)
}

/// Result of comparing a path's on-disk content against the store's
/// current head for it, used by the CLI's `status` subcommand.
pub struct StatusEntry {
    pub name: String,
    pub head_version: u32,
    pub last_message: String,
    pub modified: bool,
}

/// Compares `working_copy` against the store's head revision for `name`,
/// reporting the head version, last commit message, and whether the
/// working copy has diverged. The additive checksum is consulted first as
/// a cheap short-circuit; since it is advisory-only and collisions are
/// tolerated elsewhere, divergence is only confirmed by a full byte
/// comparison. A name with no tracked versions reports `head_version: 0`
/// and `modified: true` (nothing to compare against).
pub fn status(store: &Store, name: &str, working_copy: &[u8]) -> Result<StatusEntry, Error> {
    let (head_bytes, head_version) = chain::reconstruct_head(store, name)?;
    let last_message = if head_version > 0 {
        store.read_metadata(name, head_version)?.message
    } else {
        String::new()
    };
    let checksums_differ = head_version > 0
        && crate::format::checksum(working_copy) != crate::format::checksum(&head_bytes);
    let modified = checksums_differ || working_copy != head_bytes.as_slice();
    Ok(StatusEntry {
        name: name.to_string(),
        head_version,
        last_message,
        modified,
    })
}

/// Reconstructs `name` at `version` and returns its bytes. The command
/// layer never touches a destination path; writing the result wherever
/// the caller wants it is the CLI's job.
pub fn restore(store: &Store, name: &str, version: u32) -> Result<Vec<u8>, Error> {
    chain::reconstruct(store, name, version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Store) {
        let dir = TempDir::new().expect("tempdir");
        let store = Store::open(dir.path()).expect("open");
        (dir, store)
    }

    #[test]
    fn test_track_then_restore_head_and_version() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"hello", "init").unwrap();
        track(&store, "a.txt", b"hello world", "extended").unwrap();
        assert_eq!(chain::reconstruct_head(&store, "a.txt").unwrap().0, b"hello world");
        assert_eq!(restore(&store, "a.txt", 1).unwrap(), b"hello");
    }

    #[test]
    fn test_diff_between_two_versions() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"Hello World", "init").unwrap();
        track(&store, "a.txt", b"Hello World Updated", "extended").unwrap();
        let summary = diff(&store, "a.txt", 1, 2).unwrap();
        assert_eq!(summary.bytes_added, 8);
        assert_eq!(summary.bytes_copied, 11);
        assert_eq!(summary.bytes_removed, 0);
        assert_eq!(summary.operation_count, 2);
    }

    #[test]
    fn test_history_lists_messages_in_order() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"one", "first").unwrap();
        track(&store, "a.txt", b"onetwo", "second").unwrap();
        let records = history(&store, "a.txt").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].message, "second");
    }

    #[test]
    fn test_list_returns_latest_version_and_size_per_name() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"1", "").unwrap();
        track(&store, "b.txt", b"123", "").unwrap();
        track(&store, "b.txt", b"12345", "").unwrap();
        let entries = list(&store).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].version, 1);
        assert_eq!(entries[0].size, 1);
        assert_eq!(entries[1].name, "b.txt");
        assert_eq!(entries[1].version, 2);
        assert_eq!(entries[1].size, 5);
    }

    #[test]
    fn test_status_reports_head_version_and_message() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"1", "first").unwrap();
        track(&store, "a.txt", b"12", "second").unwrap();
        let entry = status(&store, "a.txt", b"12").unwrap();
        assert_eq!(entry.head_version, 2);
        assert_eq!(entry.last_message, "second");
        assert!(!entry.modified);
    }

    #[test]
    fn test_status_detects_modified_working_copy() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"1", "first").unwrap();
        let entry = status(&store, "a.txt", b"1-changed").unwrap();
        assert!(entry.modified);
    }

    #[test]
    fn test_status_on_untracked_name() {
        let (_dir, store) = open_store();
        let entry = status(&store, "never-tracked.txt", b"anything").unwrap();
        assert_eq!(entry.head_version, 0);
        assert!(entry.modified);
    }

    #[test]
    fn test_restore_returns_bytes_without_writing_anything() {
        let (_dir, store) = open_store();
        track(&store, "a.txt", b"hello", "init").unwrap();
        assert_eq!(restore(&store, "a.txt", 1).unwrap(), b"hello");
    }
}
