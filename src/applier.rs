//! Delta applier: executes an operation stream against a reference buffer
//! to reconstruct the new buffer (spec §4.7).

use crate::delta::{Delta, Operation};
use crate::error::Error;

/// Applies `delta` to `reference`, producing the new buffer.
///
/// `reference` may be empty only if `delta` contains no `Copy`/`Replace`
/// operations (i.e. this is revision 1). Bounds violations are fatal: the
/// applier never truncates or silently extends the output.
pub fn apply(delta: &Delta, reference: &[u8]) -> Result<Vec<u8>, Error> {
    let new_size = delta.new_size as usize;
    let mut out = Vec::with_capacity(new_size);

    for op in &delta.operations {
        match op {
            Operation::Copy { ref_offset, length } => {
                copy_from_reference(&mut out, reference, *ref_offset, *length, new_size)?;
            }
            Operation::Insert { bytes } => {
                write_literal(&mut out, bytes, new_size)?;
            }
            Operation::Replace { bytes, .. } => {
                // Treated identically to Insert when writing: the reference
                // range it logically displaces is implicit in the cursor,
                // per spec §4.7 and the REPLACE open question in §9.
                write_literal(&mut out, bytes, new_size)?;
            }
        }
    }

    if out.len() != new_size {
        return Err(Error::OutputOverflow {
            cursor: out.len(),
            new_size,
        });
    }

    Ok(out)
}

fn copy_from_reference(
    out: &mut Vec<u8>,
    reference: &[u8],
    ref_offset: u32,
    length: u32,
    new_size: usize,
) -> Result<(), Error> {
    let ref_offset = ref_offset as usize;
    let length = length as usize;
    let end = ref_offset.checked_add(length).ok_or(Error::ReferenceOutOfRange {
        ref_offset: ref_offset as u32,
        length: length as u32,
        reference_len: reference.len(),
    })?;
    if end > reference.len() {
        return Err(Error::ReferenceOutOfRange {
            ref_offset: ref_offset as u32,
            length: length as u32,
            reference_len: reference.len(),
        });
    }
    if out.len() + length > new_size {
        return Err(Error::OutputOverflow {
            cursor: out.len() + length,
            new_size,
        });
    }
    out.extend_from_slice(&reference[ref_offset..end]);
    Ok(())
}

fn write_literal(out: &mut Vec<u8>, bytes: &[u8], new_size: usize) -> Result<(), Error> {
    if out.len() + bytes.len() > new_size {
        return Err(Error::OutputOverflow {
            cursor: out.len() + bytes.len(),
            new_size,
        });
    }
    out.extend_from_slice(bytes);
    Ok(())
}
