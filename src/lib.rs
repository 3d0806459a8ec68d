//! File versioning library.
//!
//! Filevault is a local, append-only store for file revisions. Rather than
//! keeping a full copy of every version, it keeps version 1 verbatim and
//! every later version as a delta against its predecessor, computed by a
//! three-tier compression engine: a quick structural check for append-only
//! and small-localized-edit cases, falling back to a rolling-hash matcher
//! for everything else (see `strategy`). Versions are reconstructed by
//! replaying the delta chain from version 1 forward (see `chain`).

extern crate chrono;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate tempfile;

mod applier;
mod chain;
mod chunk_index;
mod commands;
mod delta;
mod error;
mod format;
mod matcher;
mod planner;
mod rolling_hash;
mod scanner;
mod store;
mod strategy;

pub use chain::{reconstruct, reconstruct_head, VersionSource};
pub use commands::{diff, history, list, restore, status, track, DiffSummary, ListEntry, StatusEntry};
pub use delta::{Delta, Operation};
pub use error::Error;
pub use format::Metadata;
pub use store::Store;
pub use strategy::{build_delta, Strategy};
