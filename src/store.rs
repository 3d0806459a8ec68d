//! Flat-directory persistence layer implementing `VersionSource` plus the
//! write path, per spec §4.11: `<sanitised-name>_v<N>.delta` and `.meta`
//! files living side by side in a single directory.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::chain::{self, VersionSource};
use crate::error::Error;
use crate::format::{self, Metadata};
use crate::strategy;

/// A directory holding delta/metadata pairs for any number of tracked
/// names. Performs no caching: every call re-reads whatever it needs from
/// disk, matching the single-threaded, no-internal-concurrency model of
/// spec §5.
pub struct Store {
    directory: PathBuf,
}

impl Store {
    /// Opens a store rooted at `directory`, creating it if it doesn't
    /// exist yet.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Store, Error> {
        let directory = directory.into();
        let existed = directory.is_dir();
        fs::create_dir_all(&directory)?;
        if !existed {
            warn!("Store directory {:?} doesn't exist, creating it", directory);
        }
        Ok(Store { directory })
    }

    fn delta_path(&self, name: &str, version: u32) -> PathBuf {
        self.directory
            .join(format!("{}_v{}.delta", format::sanitise_name(name), version))
    }

    fn meta_path(&self, name: &str, version: u32) -> PathBuf {
        self.directory
            .join(format!("{}_v{}.meta", format::sanitise_name(name), version))
    }

    /// Reads just the metadata record for one version, without touching
    /// the (possibly much larger) delta file.
    pub fn read_metadata(&self, name: &str, version: u32) -> Result<Metadata, Error> {
        let path = self.meta_path(name, version);
        let bytes = fs::read(&path).map_err(|e| io_not_found(e, name, version))?;
        Metadata::from_bytes(&bytes)
    }

    /// Every metadata record for `name`, in version order.
    pub fn history(&self, name: &str) -> Result<Vec<Metadata>, Error> {
        debug!("Reading history for {:?}", name);
        let mut records = Vec::new();
        for version in self.list_versions(name)? {
            records.push(self.read_metadata(name, version)?);
        }
        Ok(records)
    }

    /// Every distinct tracked name currently in the store, derived from a
    /// directory-wide scan. This is a store-only capability: the engine's
    /// minimal `VersionSource` never needs to enumerate names (spec §9's
    /// open question on this is resolved in DESIGN.md).
    pub fn list_names(&self) -> Result<Vec<String>, Error> {
        debug!("Scanning {:?} for tracked names", self.directory);
        let mut names = std::collections::BTreeSet::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(stripped) = file_name.strip_suffix(".meta") {
                if let Some(idx) = stripped.rfind("_v") {
                    if stripped[idx + 2..].parse::<u32>().is_ok() {
                        names.insert(stripped[..idx].to_string());
                    }
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Builds a delta for `bytes` against the current head of `name`,
    /// writes the `.delta`/`.meta` pair for the new version, and returns
    /// its metadata.
    pub fn track(&self, name: &str, bytes: &[u8], message: &str) -> Result<Metadata, Error> {
        if message.len() > 255 {
            return Err(Error::InvalidArgument(format!(
                "message is {} bytes, limit is 255",
                message.len()
            )));
        }

        let (reference, head_version) = chain::reconstruct_head(self, name)?;
        if head_version == 0 {
            info!("Tracking new name {:?}", name);
        } else {
            debug!("Tracking {:?} against head version {}", name, head_version);
        }
        let (delta, strategy) = strategy::build_delta(&reference, bytes);
        let version = head_version + 1;
        debug!(
            "{:?} version {} built via {:?}: {} ops, {} delta bytes",
            name,
            version,
            strategy,
            delta.operation_count(),
            delta.delta_size,
        );

        let mut delta_bytes = Vec::new();
        format::write_delta(&delta, &mut delta_bytes);
        fs::write(self.delta_path(name, version), &delta_bytes)?;

        let metadata = Metadata {
            filename: name.to_string(),
            version,
            original_size: delta.original_size as u32,
            delta_size: delta.delta_size as u32,
            operation_count: delta.operation_count() as u32,
            timestamp: Utc::now().timestamp(),
            checksum: format::checksum(&reference),
            message: message.to_string(),
        };
        fs::write(self.meta_path(name, version), &metadata.to_bytes()?)?;

        info!("Wrote {:?} version {}", name, version);
        Ok(metadata)
    }
}

impl VersionSource for Store {
    fn load(&self, name: &str, version: u32) -> Result<crate::delta::Delta, Error> {
        debug!("Loading {:?} version {}", name, version);
        let metadata = self.read_metadata(name, version)?;
        let path = self.delta_path(name, version);
        let bytes = fs::read(&path).map_err(|e| io_not_found(e, name, version))?;
        format::read_delta(&bytes, metadata.original_size as u64)
    }

    fn list_versions(&self, name: &str) -> Result<Vec<u32>, Error> {
        debug!("Listing versions for {:?}", name);
        let sanitised = format::sanitise_name(name);
        let prefix = format!("{}_v", sanitised);
        let mut versions = Vec::new();
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(stripped) = file_name.strip_prefix(&prefix) {
                if let Some(number) = stripped.strip_suffix(".meta") {
                    if let Ok(v) = number.parse::<u32>() {
                        versions.push(v);
                    }
                }
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }
}

fn io_not_found(e: std::io::Error, name: &str, version: u32) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound { name: name.to_string(), version }
    } else {
        Error::Io(e)
    }
}
