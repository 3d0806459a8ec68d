//! Delta planner: merges a non-overlapping match cover into a gap-free
//! operation stream (spec §4.5).

use crate::delta::{Delta, Operation};
use crate::matcher::Match;

/// Turns a set of non-overlapping matches (sorted or not) into a gap-free
/// `Delta` over `new`, against a reference of `original_size` bytes.
///
/// Matches are stable-sorted by `new_offset` first (the matcher already
/// produces them in that order, but this function does not assume it).
pub fn plan(mut matches: Vec<Match>, new: &[u8], original_size: u64) -> Delta {
    matches.sort_by_key(|m| m.new_offset);

    let mut operations = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0usize;

    for m in &matches {
        if m.new_offset > cursor {
            operations.push(Operation::Insert {
                bytes: new[cursor..m.new_offset].to_vec(),
            });
        }
        operations.push(Operation::Copy {
            ref_offset: m.ref_offset as u32,
            length: m.length as u32,
        });
        cursor = m.new_offset + m.length;
    }

    if cursor < new.len() {
        operations.push(Operation::Insert {
            bytes: new[cursor..].to_vec(),
        });
    }

    Delta::new(operations, original_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matches_is_single_insert() {
        let new = b"hello world";
        let delta = plan(Vec::new(), new, 0);
        assert_eq!(delta.operations.len(), 1);
        assert_eq!(
            delta.operations[0],
            Operation::Insert { bytes: new.to_vec() }
        );
        assert_eq!(delta.new_size, new.len() as u64);
        assert_eq!(delta.delta_size, new.len() as u64);
    }

    #[test]
    fn test_gap_free_three_ops() {
        let new = b"Hello New World";
        let matches = vec![
            Match { ref_offset: 0, new_offset: 0, length: 6 },
            Match { ref_offset: 6, new_offset: 10, length: 5 },
        ];
        let delta = plan(matches, new, 11);
        assert_eq!(
            delta.operations,
            vec![
                Operation::Copy { ref_offset: 0, length: 6 },
                Operation::Insert { bytes: b"New ".to_vec() },
                Operation::Copy { ref_offset: 6, length: 5 },
            ]
        );
        assert_eq!(delta.new_size, 15);
        assert_eq!(delta.delta_size, 4);

        // gap-freeness: cursor after Op_i equals cursor before Op_{i+1}
        let mut cursor = 0u64;
        for op in &delta.operations {
            cursor += op.length() as u64;
        }
        assert_eq!(cursor, delta.new_size);
    }

    #[test]
    fn test_full_cover_is_single_copy() {
        let new = b"identical";
        let matches = vec![Match { ref_offset: 0, new_offset: 0, length: new.len() }];
        let delta = plan(matches, new, new.len() as u64);
        assert_eq!(
            delta.operations,
            vec![Operation::Copy { ref_offset: 0, length: new.len() as u32 }]
        );
        assert_eq!(delta.delta_size, 0);
    }

    #[test]
    fn test_trailing_insert() {
        let new = b"Hello World Updated";
        let matches = vec![Match { ref_offset: 0, new_offset: 0, length: 11 }];
        let delta = plan(matches, new, 11);
        assert_eq!(
            delta.operations,
            vec![
                Operation::Copy { ref_offset: 0, length: 11 },
                Operation::Insert { bytes: b" Updated".to_vec() },
            ]
        );
        assert_eq!(delta.delta_size, 8);
    }
}
