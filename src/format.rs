//! On-disk wire format for delta files and metadata records (spec §6).
//!
//! All multi-byte integers are little-endian. A delta file is a bare
//! concatenation of operation records with no file-level header; the
//! record count lives in the sibling metadata file.

use std::convert::TryInto;

use crate::delta::{Delta, Operation};
use crate::error::Error;

const OP_COPY: u32 = 0;
const OP_INSERT: u32 = 1;
const OP_REPLACE: u32 = 2;

/// Serializes a `Delta`'s operations to the §6 record format. The delta's
/// size totals are not written here; they live in the metadata record.
pub fn write_delta(delta: &Delta, out: &mut Vec<u8>) {
    for op in &delta.operations {
        write_operation(op, out);
    }
}

fn write_operation(op: &Operation, out: &mut Vec<u8>) {
    match op {
        Operation::Copy { ref_offset, length } => {
            out.extend_from_slice(&OP_COPY.to_le_bytes());
            out.extend_from_slice(&ref_offset.to_le_bytes());
            out.extend_from_slice(&length.to_le_bytes());
        }
        Operation::Insert { bytes } => {
            out.extend_from_slice(&OP_INSERT.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // ref_offset unused
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Operation::Replace { ref_offset, length, bytes } => {
            out.extend_from_slice(&OP_REPLACE.to_le_bytes());
            out.extend_from_slice(&ref_offset.to_le_bytes());
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(bytes);
        }
    }
}

/// Parses a delta file's operation stream. `original_size` comes from the
/// sibling metadata record, since the delta file itself carries no header.
pub fn read_delta(bytes: &[u8], original_size: u64) -> Result<Delta, Error> {
    let mut operations = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        if pos + 12 > bytes.len() {
            return Err(Error::DeltaMalformed(format!(
                "truncated operation header at offset {}",
                pos
            )));
        }
        let op_type = read_u32(bytes, pos)?;
        let ref_offset = read_u32(bytes, pos + 4)?;
        let length = read_u32(bytes, pos + 8)?;
        pos += 12;

        let op = match op_type {
            OP_COPY => Operation::Copy { ref_offset, length },
            OP_INSERT | OP_REPLACE => {
                let len = length as usize;
                if pos + len > bytes.len() {
                    return Err(Error::DeltaMalformed(format!(
                        "operation at offset {} declares {} literal bytes but only {} remain",
                        pos - 12,
                        len,
                        bytes.len() - pos
                    )));
                }
                let data = bytes[pos..pos + len].to_vec();
                pos += len;
                if op_type == OP_INSERT {
                    Operation::Insert { bytes: data }
                } else {
                    Operation::Replace { ref_offset, length, bytes: data }
                }
            }
            other => {
                return Err(Error::DeltaMalformed(format!(
                    "unknown operation type {} at offset {}",
                    other,
                    pos - 12
                )))
            }
        };
        operations.push(op);
    }

    Ok(Delta::new(operations, original_size))
}

fn read_u32(bytes: &[u8], pos: usize) -> Result<u32, Error> {
    bytes
        .get(pos..pos + 4)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::DeltaMalformed(format!("truncated u32 at offset {}", pos)))
}

/// Per-version metadata record (spec §6's fixed 600-byte layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub filename: String,
    pub version: u32,
    pub original_size: u32,
    pub delta_size: u32,
    pub operation_count: u32,
    pub timestamp: i64,
    pub checksum: String,
    pub message: String,
}

const FILENAME_LEN: usize = 256;
const CHECKSUM_LEN: usize = 64;
const MESSAGE_LEN: usize = 256;
// The four u32 fields below (version, original_size, delta_size,
// operation_count) total 16 bytes, which leaves `filename`+those fields at
// 272 bytes — already 8-byte aligned, so the 8-byte `timestamp` that
// follows needs no compiler-inserted padding. This crate therefore commits
// to the field table's sizes exactly as specified, with no separate
// padding field; see DESIGN.md for why (the spec's own "596 before / 600
// after" framing is unreconcilable with the literal field sizes it also
// gives, which already sum to 600).
pub const METADATA_RECORD_LEN: usize = FILENAME_LEN // filename
    + 4  // version
    + 4  // original_size
    + 4  // delta_size
    + 4  // operation_count
    + 8  // timestamp
    + CHECKSUM_LEN // checksum
    + MESSAGE_LEN; // message

impl Metadata {
    /// Serializes this record to its fixed 600-byte on-disk layout.
    pub fn to_bytes(&self) -> Result<[u8; METADATA_RECORD_LEN], Error> {
        let mut buf = [0u8; METADATA_RECORD_LEN];
        let mut pos = 0;

        write_padded_str(&mut buf, pos, &self.filename, FILENAME_LEN)?;
        pos += FILENAME_LEN;

        buf[pos..pos + 4].copy_from_slice(&self.version.to_le_bytes());
        pos += 4;
        buf[pos..pos + 4].copy_from_slice(&self.original_size.to_le_bytes());
        pos += 4;
        buf[pos..pos + 4].copy_from_slice(&self.delta_size.to_le_bytes());
        pos += 4;
        buf[pos..pos + 4].copy_from_slice(&self.operation_count.to_le_bytes());
        pos += 4;

        buf[pos..pos + 8].copy_from_slice(&self.timestamp.to_le_bytes());
        pos += 8;

        write_padded_str(&mut buf, pos, &self.checksum, CHECKSUM_LEN)?;
        pos += CHECKSUM_LEN;

        write_padded_str(&mut buf, pos, &self.message, MESSAGE_LEN)?;
        pos += MESSAGE_LEN;

        debug_assert_eq!(pos, METADATA_RECORD_LEN);
        Ok(buf)
    }

    /// Parses a fixed 600-byte record. `bytes` must be exactly
    /// `METADATA_RECORD_LEN` long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Metadata, Error> {
        if bytes.len() != METADATA_RECORD_LEN {
            return Err(Error::DeltaMalformed(format!(
                "metadata record is {} bytes, expected {}",
                bytes.len(),
                METADATA_RECORD_LEN
            )));
        }
        let mut pos = 0;

        let filename = read_padded_str(bytes, pos, FILENAME_LEN)?;
        pos += FILENAME_LEN;

        let version = read_u32(bytes, pos)?;
        pos += 4;
        let original_size = read_u32(bytes, pos)?;
        pos += 4;
        let delta_size = read_u32(bytes, pos)?;
        pos += 4;
        let operation_count = read_u32(bytes, pos)?;
        pos += 4;

        let timestamp = i64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
        pos += 8;

        let checksum = read_padded_str(bytes, pos, CHECKSUM_LEN)?;
        pos += CHECKSUM_LEN;

        let message = read_padded_str(bytes, pos, MESSAGE_LEN)?;
        pos += MESSAGE_LEN;

        debug_assert_eq!(pos, METADATA_RECORD_LEN);

        Ok(Metadata {
            filename,
            version,
            original_size,
            delta_size,
            operation_count,
            timestamp,
            checksum,
            message,
        })
    }
}

fn write_padded_str(buf: &mut [u8], pos: usize, s: &str, field_len: usize) -> Result<(), Error> {
    let bytes = s.as_bytes();
    if bytes.len() >= field_len {
        return Err(Error::InvalidArgument(format!(
            "string of {} bytes does not fit in a {}-byte field",
            bytes.len(),
            field_len
        )));
    }
    buf[pos..pos + bytes.len()].copy_from_slice(bytes);
    // Remainder of the field was already zeroed by the caller's buffer init.
    Ok(())
}

fn read_padded_str(bytes: &[u8], pos: usize, field_len: usize) -> Result<String, Error> {
    let field = &bytes[pos..pos + field_len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field_len);
    String::from_utf8(field[..end].to_vec())
        .map_err(|e| Error::DeltaMalformed(format!("non-UTF-8 metadata field: {}", e)))
}

/// 32-bit additive byte-sum of `data`, formatted as 8 lowercase hex digits.
/// Advisory only, per spec §6's Checksum note.
pub fn checksum(data: &[u8]) -> String {
    let sum: u32 = data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
    format!("{:08x}", sum)
}

/// Replaces `/`, `\`, and `:` with `_`; no other characters are
/// transformed (spec §6's File naming rule).
pub fn sanitise_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_format_round_trip() {
        let delta = Delta::new(
            vec![
                Operation::Copy { ref_offset: 0, length: 6 },
                Operation::Insert { bytes: b"New ".to_vec() },
                Operation::Copy { ref_offset: 6, length: 5 },
            ],
            11,
        );
        let mut bytes = Vec::new();
        write_delta(&delta, &mut bytes);
        let parsed = read_delta(&bytes, delta.original_size).unwrap();
        assert_eq!(parsed.operations, delta.operations);
        assert_eq!(parsed.new_size, delta.new_size);
        assert_eq!(parsed.delta_size, delta.delta_size);
    }

    #[test]
    fn test_copy_record_is_12_bytes() {
        let delta = Delta::new(vec![Operation::Copy { ref_offset: 5, length: 9 }], 20);
        let mut bytes = Vec::new();
        write_delta(&delta, &mut bytes);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &0u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &9u32.to_le_bytes());
    }

    #[test]
    fn test_insert_record_is_12_plus_length() {
        let delta = Delta::new(vec![Operation::Insert { bytes: b"abc".to_vec() }], 0);
        let mut bytes = Vec::new();
        write_delta(&delta, &mut bytes);
        assert_eq!(bytes.len(), 15);
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..15], b"abc");
    }

    #[test]
    fn test_replace_accepted_on_read() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"xy");
        let delta = read_delta(&bytes, 10).unwrap();
        assert_eq!(
            delta.operations,
            vec![Operation::Replace { ref_offset: 3, length: 2, bytes: b"xy".to_vec() }]
        );
    }

    #[test]
    fn test_truncated_header_is_malformed() {
        let bytes = vec![0u8; 7];
        assert!(read_delta(&bytes, 0).is_err());
    }

    #[test]
    fn test_truncated_literal_is_malformed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&10u32.to_le_bytes()); // claims 10 bytes
        bytes.extend_from_slice(b"abc"); // only 3 present
        assert!(read_delta(&bytes, 0).is_err());
    }

    #[test]
    fn test_unknown_op_type_is_malformed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(read_delta(&bytes, 0).is_err());
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = Metadata {
            filename: "notes.txt".into(),
            version: 3,
            original_size: 128,
            delta_size: 16,
            operation_count: 2,
            timestamp: 1_700_000_000,
            checksum: checksum(b"some reference content"),
            message: "edited the intro".into(),
        };
        let bytes = metadata.to_bytes().unwrap();
        assert_eq!(bytes.len(), METADATA_RECORD_LEN);
        let parsed = Metadata::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_metadata_record_is_600_bytes() {
        assert_eq!(METADATA_RECORD_LEN, 600);
    }

    #[test]
    fn test_checksum_is_eight_hex_digits() {
        let sum = checksum(b"hello");
        assert_eq!(sum.len(), 8);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sanitise_name() {
        assert_eq!(sanitise_name("docs/notes.txt"), "docs_notes.txt");
        assert_eq!(sanitise_name("C:\\temp\\a"), "C__temp_a");
        assert_eq!(sanitise_name("plain-name.md"), "plain-name.md");
    }

    #[test]
    fn test_oversized_field_rejected() {
        let metadata = Metadata {
            filename: "x".repeat(FILENAME_LEN),
            version: 1,
            original_size: 0,
            delta_size: 0,
            operation_count: 0,
            timestamp: 0,
            checksum: String::new(),
            message: String::new(),
        };
        assert!(metadata.to_bytes().is_err());
    }
}
