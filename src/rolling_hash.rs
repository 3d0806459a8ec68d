//! Fixed-window rolling hash with O(1) amortised slide.
//!
//! This is an Adler-style pair of 16-bit accumulators, not the classic
//! Adler-32 (no reduction modulo the prime 65521): the window is fixed size
//! and wraps in a circular buffer rather than being reduced modulo a large
//! block count, which keeps the slide update a handful of wrapping integer
//! operations.

const MASK16: u32 = 0xFFFF;

/// Rolling hash over the last `window` bytes fed to it.
#[derive(Debug, Clone)]
pub struct RollingHash {
    window: usize,
    buffer: Vec<u8>,
    write_index: usize,
    count: usize,
    a: u32,
    b: u32,
}

impl RollingHash {
    /// Creates a rolling hash with the given fixed window size.
    pub fn new(window: usize) -> RollingHash {
        assert!(window > 0, "rolling hash window must be non-zero");
        RollingHash {
            window,
            buffer: vec![0u8; window],
            write_index: 0,
            count: 0,
            a: 0,
            b: 0,
        }
    }

    /// Window size this hash was constructed with.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether the window currently holds a full `window` bytes, i.e.
    /// whether `get()` returns a meaningful value.
    pub fn is_full(&self) -> bool {
        self.count >= self.window
    }

    /// Feeds one byte into the window, evicting the oldest byte once full.
    pub fn update(&mut self, byte: u8) {
        if self.count < self.window {
            self.a = (self.a + byte as u32) & MASK16;
            self.b = (self.b + self.a) & MASK16;
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % self.window;
            self.count += 1;
        } else {
            let outgoing = self.buffer[self.write_index];
            self.a = self.a.wrapping_sub(outgoing as u32).wrapping_add(byte as u32) & MASK16;
            self.b = self
                .b
                .wrapping_sub((self.window as u32).wrapping_mul(outgoing as u32))
                .wrapping_add(self.a)
                & MASK16;
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % self.window;
        }
    }

    /// Feeds an entire slice, in order.
    pub fn update_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.update(b);
        }
    }

    /// Current hash value. Defined only once `is_full()` is true; returns 0
    /// before then.
    pub fn get(&self) -> u32 {
        if self.is_full() {
            (self.a << 16) | self.b
        } else {
            0
        }
    }

    /// Resets to the empty state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.count = 0;
        self.a = 0;
        self.b = 0;
        for b in self.buffer.iter_mut() {
            *b = 0;
        }
    }

    /// Builds a rolling hash already primed with the first `window` bytes
    /// of `data` (or fewer, if `data` is shorter than `window`).
    pub fn from_buffer(window: usize, data: &[u8]) -> RollingHash {
        let mut hash = RollingHash::new(window);
        let take = data.len().min(window);
        hash.update_all(&data[..take]);
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_before_full() {
        let mut hash = RollingHash::new(4);
        assert_eq!(hash.get(), 0);
        hash.update(b'a');
        hash.update(b'b');
        hash.update(b'c');
        assert_eq!(hash.get(), 0);
        hash.update(b'd');
        assert_ne!(hash.get(), 0);
    }

    #[test]
    fn test_matches_direct_computation() {
        // Rolling from "axyz" to "xyzw" must equal hashing "xyzw" directly.
        let mut rolled = RollingHash::from_buffer(4, b"axyz");
        rolled.update(b'w');

        let direct = RollingHash::from_buffer(4, b"xyzw");

        assert_eq!(rolled.get(), direct.get());
    }

    #[test]
    fn test_reset() {
        let mut hash = RollingHash::from_buffer(4, b"abcd");
        assert!(hash.is_full());
        hash.reset();
        assert!(!hash.is_full());
        assert_eq!(hash.get(), 0);
    }

    #[test]
    fn test_same_window_same_hash() {
        let h1 = RollingHash::from_buffer(8, b"AAAAAAAA");
        let h2 = RollingHash::from_buffer(8, b"AAAAAAAA");
        assert_eq!(h1.get(), h2.get());
    }

    #[test]
    fn test_shorter_than_window_never_full() {
        let hash = RollingHash::from_buffer(32, b"short");
        assert!(!hash.is_full());
        assert_eq!(hash.get(), 0);
    }
}
