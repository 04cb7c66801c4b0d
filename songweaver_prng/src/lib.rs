// Deterministic, portable randomness for the composition engine.
//
// Every generator in `songweaver_music` takes its randomness through the
// `RandomSource` trait defined here, never from a global. Tests inject a
// fixed-seed `SongRng` (or a scripted source) to get reproducible songs;
// the CLI seeds one from the clock when no seed is given.
//
// `SongRng` implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64
// seeding. The core generator uses integer arithmetic only, so the same seed
// yields the same song on every platform.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of uniformly distributed 64-bit values plus the derived draws
/// the composition engine needs.
///
/// Implementors only provide `next_u64`; everything else is built on it so
/// two sources that agree on `next_u64` agree on every draw.
pub trait RandomSource {
    /// Next raw value in the stream.
    fn next_u64(&mut self) -> u64;

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`. Returns `low` when the range is
    /// empty instead of panicking; generators call this with table lengths
    /// that have already been checked, but a creative tool never aborts.
    fn range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let range = (high - low) as u64;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1)) as usize;
        }
        // Rejection sampling avoids modulo bias.
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range) as usize;
            }
        }
    }

    /// Uniformly chosen index into a collection of `len` items, or `None`
    /// for an empty collection.
    fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.range_usize(0, len))
        }
    }
}

/// Xoshiro256++ generator, the engine's default `RandomSource`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Seed from a `u64`. Equal seeds produce equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }
}

impl RandomSource for SongRng {
    fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

/// A seed derived from the current time, mixed so that nearby instants
/// give unrelated seeds.
pub fn entropy_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut sm = nanos ^ u64::from(std::process::id()).rotate_left(32);
    splitmix64(&mut sm)
}

/// SplitMix64, used to expand one `u64` into xoshiro's 256-bit state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of raw values, cycling when exhausted.
    struct Scripted {
        values: Vec<u64>,
        pos: usize,
    }

    impl RandomSource for Scripted {
        fn next_u64(&mut self) -> u64 {
            let v = self.values[self.pos % self.values.len()];
            self.pos += 1;
            v
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = SongRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = SongRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(5, 15);
            assert!((5..15).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn empty_range_returns_low() {
        let mut rng = SongRng::new(1);
        assert_eq!(rng.range_usize(7, 7), 7);
        assert_eq!(rng.range_usize(9, 3), 9);
        assert_eq!(rng.choose_index(0), None);
    }

    #[test]
    fn choose_index_reaches_every_slot() {
        let mut rng = SongRng::new(2024);
        let mut seen = [false; 6];
        for _ in 0..1000 {
            seen[rng.choose_index(6).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s), "some index never drawn: {seen:?}");
    }

    #[test]
    fn scripted_source_drives_provided_methods() {
        // Top bit set -> next_f64 just under 1.0; zero -> exactly 0.0.
        let mut src = Scripted {
            values: vec![u64::MAX, 0],
            pos: 0,
        };
        assert!(src.next_f64() > 0.99);
        assert_eq!(src.next_f64(), 0.0);
        assert_eq!(src.range_usize(0, 4), 3);
    }

    #[test]
    fn serialization_roundtrip_resumes_stream() {
        let mut rng = SongRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SongRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }

    #[test]
    fn entropy_seeds_differ_between_generators() {
        let mut a = SongRng::new(entropy_seed());
        let mut b = SongRng::new(entropy_seed() ^ 1);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
