//! Crate-wide error type.
//!
//! Following the engine/store split, a single enum covers both the
//! in-memory delta algorithms and the on-disk store: callers never need to
//! match on two different error hierarchies to handle a failed `track` or
//! `restore`.

use std::fmt;
use std::io;

/// General error type for this crate.
#[derive(Debug)]
pub enum Error {
    /// A caller passed an argument the engine cannot act on (e.g. a zero
    /// version number).
    InvalidArgument(String),
    /// An on-disk delta record is truncated, has an unknown operation type,
    /// or its lengths are self-inconsistent.
    DeltaMalformed(String),
    /// A COPY operation would read past the end of the reference buffer.
    ReferenceOutOfRange {
        ref_offset: u32,
        length: u32,
        reference_len: usize,
    },
    /// The cumulative length of emitted operations exceeds the delta's
    /// declared `new_size`.
    OutputOverflow { cursor: usize, new_size: usize },
    /// A revision could not be reconstructed because one of its ancestors
    /// in the chain failed to load or apply.
    ChainBroken {
        name: String,
        version: u32,
        source: Box<Error>,
    },
    /// A named version does not exist in the store.
    NotFound { name: String, version: u32 },
    /// Filesystem or other I/O failure while reading/writing the store.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::DeltaMalformed(msg) => write!(f, "malformed delta: {}", msg),
            Error::ReferenceOutOfRange {
                ref_offset,
                length,
                reference_len,
            } => write!(
                f,
                "COPY({}, {}) reads past reference buffer of length {}",
                ref_offset, length, reference_len,
            ),
            Error::OutputOverflow { cursor, new_size } => write!(
                f,
                "operations write past declared new_size: cursor={} new_size={}",
                cursor, new_size,
            ),
            Error::ChainBroken {
                name,
                version,
                source,
            } => write!(
                f,
                "could not reconstruct {:?} version {}: {}",
                name, version, source,
            ),
            Error::NotFound { name, version } => {
                write!(f, "no version {} for {:?}", version, name)
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ChainBroken { source, .. } => Some(&**source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}
