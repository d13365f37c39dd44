//! Small deterministic PRNG for shape and choreography selection
//!
//! Xorshift with 32 bits of state. Not cryptographic; seeded once at
//! boot from a hardware entropy source.

#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator. A zero seed is remapped to a fixed nonzero value.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x6b65_7221 } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Value in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u32() % bound
    }

    /// Value in `[low, high)`. Returns `low` when the range is empty.
    pub fn next_range(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        low + self.next_below(high - low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = XorShift32::new(42);
        let mut b = XorShift32::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_zero_seed_does_not_stick() {
        let mut rng = XorShift32::new(0);
        assert_ne!(rng.next_u32(), 0);
        assert_ne!(rng.next_u32(), rng.next_u32());
    }

    #[test]
    fn test_next_range_bounds() {
        let mut rng = XorShift32::new(7);
        for _ in 0..1000 {
            let v = rng.next_range(2, 5);
            assert!((2..5).contains(&v));
        }
    }

    #[test]
    fn test_next_range_empty() {
        let mut rng = XorShift32::new(7);
        assert_eq!(rng.next_range(3, 3), 3);
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn test_covers_full_range() {
        let mut rng = XorShift32::new(1234);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.next_below(4) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
