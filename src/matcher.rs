//! Match finder: greedy, left-to-right, non-overlapping cover of the new
//! buffer by long matches in the reference buffer (spec §4.4).

use crate::chunk_index::ChunkIndex;
use crate::rolling_hash::RollingHash;

/// Default window size (bytes) participating in the rolling hash.
pub const DEFAULT_WINDOW: usize = 32;
/// Default minimum match length to be considered at all.
pub const DEFAULT_MIN_MATCH: usize = 32;
/// Default minimum length for a match to be considered worth emitting.
pub const DEFAULT_MIN_BENEFICIAL: usize = 12;
/// Number of candidates walked per bucket before giving up on a position.
const MAX_CANDIDATES: usize = 20;
/// Hard cap on how far a single match may be extended.
const MAX_MATCH_LEN: usize = 1 << 20;

/// A maximal contiguous byte-identical region between `reference` and
/// `new`, found by the match finder. `length >= min_match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub ref_offset: usize,
    pub new_offset: usize,
    pub length: usize,
}

/// Picks `min_beneficial` by new-buffer size, per spec §4.4's size-scaled
/// beneficiality threshold.
pub fn min_beneficial_for(new_len: usize) -> usize {
    if new_len > 50 * 1024 * 1024 {
        32
    } else if new_len > 10 * 1024 * 1024 {
        16
    } else {
        DEFAULT_MIN_BENEFICIAL
    }
}

/// Builds a chained index over every `window`-byte-aligned position of
/// `reference`.
pub fn build_index(reference: &[u8], window: usize) -> ChunkIndex {
    let mut index = ChunkIndex::new();
    if reference.len() < window {
        return index;
    }
    let mut hash = RollingHash::from_buffer(window, reference);
    index.insert(hash.get(), 0);
    for offset in 1..=(reference.len() - window) {
        hash.update(reference[offset + window - 1]);
        index.insert(hash.get(), offset as u32);
    }
    index
}

/// Extends a candidate match as far as it will go, using 8/4/1-byte stride
/// comparisons, and returns its length (possibly below `min_match`, in
/// which case the caller rejects it).
fn extend_match(reference: &[u8], new: &[u8], ref_start: usize, new_start: usize, window: usize) -> usize {
    let max_len = (reference.len() - ref_start)
        .min(new.len() - new_start)
        .min(MAX_MATCH_LEN);
    if max_len < window || reference[ref_start..ref_start + window] != new[new_start..new_start + window]
    {
        return 0;
    }

    let mut len = window;
    // 8-byte stride
    while len + 8 <= max_len
        && reference[ref_start + len..ref_start + len + 8] == new[new_start + len..new_start + len + 8]
    {
        len += 8;
    }
    // 4-byte stride
    while len + 4 <= max_len
        && reference[ref_start + len..ref_start + len + 4] == new[new_start + len..new_start + len + 4]
    {
        len += 4;
    }
    // 1-byte stride
    while len < max_len && reference[ref_start + len] == new[new_start + len] {
        len += 1;
    }
    len
}

/// Runs one pass of the match finder with the given thresholds.
fn scan(
    reference: &[u8],
    new: &[u8],
    index: &ChunkIndex,
    window: usize,
    min_match: usize,
    min_beneficial: usize,
) -> Vec<Match> {
    let mut matches = Vec::new();
    if new.len() < window || reference.len() < window {
        return matches;
    }

    let mut hash = RollingHash::from_buffer(window, new);
    // Position whose window `hash` currently reflects, i.e. `hash` is the
    // hash of `new[hash_pos..hash_pos + window)`. A match can jump `i`
    // forward by more than one byte, so the hash must be fed one byte per
    // skipped position to stay in sync, not just once per loop iteration.
    let mut hash_pos = 0usize;
    let mut i = 0usize;
    let mut last_match_end = 0usize;

    loop {
        if i + window > new.len() {
            break;
        }
        while hash_pos < i {
            hash.update(new[hash_pos + window]);
            hash_pos += 1;
        }

        if i >= last_match_end {
            let mut best_len = 0usize;
            let mut best_ref_offset = 0usize;
            for ref_offset in index.find(hash.get()).take(MAX_CANDIDATES) {
                let len = extend_match(reference, new, ref_offset as usize, i, window);
                if len > best_len {
                    best_len = len;
                    best_ref_offset = ref_offset as usize;
                }
            }

            let threshold = min_match.max(min_beneficial);
            if best_len >= threshold {
                matches.push(Match {
                    ref_offset: best_ref_offset,
                    new_offset: i,
                    length: best_len,
                });
                last_match_end = i + best_len;
                i = last_match_end;
                continue;
            }
        }
        i += 1;
    }

    matches
}

/// Finds a greedy, non-overlapping cover of `new` by matches in
/// `reference`, applying the fallback rescan from spec §4.4 when the first
/// pass yields too few matches on a large buffer.
pub fn find_matches(reference: &[u8], new: &[u8]) -> Vec<Match> {
    find_matches_with_params(reference, new, DEFAULT_WINDOW, DEFAULT_MIN_MATCH)
}

/// Same as [`find_matches`] but with explicit window/min_match, mainly for
/// tests that want a small window over tiny buffers.
pub fn find_matches_with_params(
    reference: &[u8],
    new: &[u8],
    window: usize,
    min_match: usize,
) -> Vec<Match> {
    let index = build_index(reference, window);
    let min_beneficial = min_beneficial_for(new.len());
    let first_pass = scan(reference, new, &index, window, min_match, min_beneficial);

    if first_pass.len() < 10 && new.len() > 1024 * 1024 {
        let second_pass = scan(reference, new, &index, window, min_match, 32);
        if second_pass.len() > first_pass.len() {
            return second_pass;
        }
    }

    first_pass
}
