//! Strategy dispatcher: picks among the three compression strategies based
//! on a quick structural analysis of the reference and new buffers (spec
//! §4.6). Expressed as a tagged match over closures rather than virtual
//! dispatch, per the teacher's guidance against trait objects for a fixed,
//! small set of call sites.

use crate::delta::{Delta, Operation};
use crate::matcher;
use crate::planner;
use crate::scanner::common_prefix_suffix;

/// Which strategy a `build_delta` call actually took; exposed mainly so
/// tests can assert on dispatch without re-deriving the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `|R| = 0`: the whole buffer is new content.
    InitialInsert,
    /// Append-only: a short suffix was added to an unchanged prefix.
    Append,
    /// Prefix/suffix sandwich: a localized change surrounded by unchanged
    /// head and tail.
    Sandwich,
    /// Full rolling-hash matcher.
    RollingMatch,
}

/// Builds a `Delta` turning `reference` into `new`, selecting a strategy
/// per spec §4.6.
pub fn build_delta(reference: &[u8], new: &[u8]) -> (Delta, Strategy) {
    if reference.is_empty() {
        return (
            Delta::new(
                if new.is_empty() {
                    Vec::new()
                } else {
                    vec![Operation::Insert { bytes: new.to_vec() }]
                },
                0,
            ),
            Strategy::InitialInsert,
        );
    }

    if new.is_empty() {
        return (Delta::new(Vec::new(), reference.len() as u64), Strategy::Sandwich);
    }

    let original_size = reference.len() as u64;

    // Strategy A: append-only.
    if new.len() > reference.len() {
        let growth = new.len() - reference.len();
        if growth < 1000 {
            let (prefix, _suffix) = common_prefix_suffix(reference, new);
            if (prefix as f64) > 0.95 * (reference.len() as f64) {
                let mut operations = Vec::with_capacity(2);
                if prefix > 0 {
                    operations.push(Operation::Copy { ref_offset: 0, length: prefix as u32 });
                }
                operations.push(Operation::Insert { bytes: new[prefix..].to_vec() });
                return (Delta::new(operations, original_size), Strategy::Append);
            }
        }
    }

    // Strategy B: prefix/suffix sandwich.
    let (prefix, suffix) = common_prefix_suffix(reference, new);
    let change_magnitude = if new.len() >= reference.len() {
        new.len() - reference.len()
    } else {
        reference.len() - new.len()
    };
    let small_change_threshold = (10_000usize).min(reference.len() / 100);
    if (prefix + suffix) as f64 > 0.8 * (reference.len() as f64)
        || change_magnitude < small_change_threshold
    {
        let mut operations = Vec::with_capacity(3);
        if prefix > 0 {
            operations.push(Operation::Copy { ref_offset: 0, length: prefix as u32 });
        }
        if new.len() - suffix > prefix {
            operations.push(Operation::Insert {
                bytes: new[prefix..new.len() - suffix].to_vec(),
            });
        }
        if suffix > 0 {
            operations.push(Operation::Copy {
                ref_offset: (reference.len() - suffix) as u32,
                length: suffix as u32,
            });
        }
        return (Delta::new(operations, original_size), Strategy::Sandwich);
    }

    // Strategy C: rolling-hash matcher.
    let matches = matcher::find_matches(reference, new);
    (planner::plan(matches, new, original_size), Strategy::RollingMatch)
}
