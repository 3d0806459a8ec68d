//! Chain reconstructor: rebuilds revision `V` of a tracked name by applying
//! deltas 1..V in order (spec §4.8).

use crate::applier;
use crate::delta::Delta;
use crate::error::Error;

/// Minimal capability the chain reconstructor needs from a persistence
/// layer: load one delta, and enumerate which versions exist.
///
/// Kept deliberately narrow (no directory scanning, no name listing) so
/// that tests can supply a cheap in-memory fake instead of a real store;
/// see `store::Store` for the on-disk implementation and `store::Store`'s
/// richer, store-only capabilities like `list_names`.
pub trait VersionSource {
    fn load(&self, name: &str, version: u32) -> Result<Delta, Error>;
    fn list_versions(&self, name: &str) -> Result<Vec<u32>, Error>;
}

/// Reconstructs the bytes of revision `target_version` for `name` by
/// replaying deltas 1..target_version, rotating reference buffers in a
/// two-slot (prev, next) pattern rather than keeping every intermediate
/// buffer alive.
pub fn reconstruct<S: VersionSource>(source: &S, name: &str, target_version: u32) -> Result<Vec<u8>, Error> {
    if target_version == 0 {
        return Err(Error::InvalidArgument("version numbers start at 1".into()));
    }

    let mut buffer = Vec::new();
    for version in 1..=target_version {
        let delta = source.load(name, version).map_err(|e| Error::ChainBroken {
            name: name.to_string(),
            version,
            source: Box::new(e),
        })?;
        buffer = applier::apply(&delta, &buffer).map_err(|e| Error::ChainBroken {
            name: name.to_string(),
            version,
            source: Box::new(e),
        })?;
    }
    Ok(buffer)
}

/// Reconstructs the current head (latest tracked version) of `name`, or an
/// empty buffer and version 0 if the name has never been tracked.
pub fn reconstruct_head<S: VersionSource>(source: &S, name: &str) -> Result<(Vec<u8>, u32), Error> {
    let versions = source.list_versions(name)?;
    match versions.iter().max() {
        None => Ok((Vec::new(), 0)),
        Some(&latest) => {
            let bytes = reconstruct(source, name, latest)?;
            Ok((bytes, latest))
        }
    }
}
