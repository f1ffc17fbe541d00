//! Pool of party-indexed pseudo-random streams.
//!
//! Mirrors `RandGenPool` in `original_source/src/graphsc/rand_gen_pool.h`:
//! five independent counter-mode streams keyed by `self`, `all`, and each of
//! the three pairwise relations, plus an auxiliary tag-indexed stream `pi(i)`
//! used to derive extra randomness without growing the struct.
//!
//! `ChaCha20Rng` stands in for the original's AES-CTR `emp::PRG`: both are
//! counter-mode stream ciphers, and `rand_chacha` is the generator
//! `Antonio95-beaver`'s dealer-based triple sampler already uses for exactly
//! this role.

use std::collections::HashMap;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Ten 64-bit words: `(hi, lo)` for each of `self, all, p01, p02, p12`.
#[derive(Debug, Clone, Copy)]
pub struct Seeds {
    pub self_seed: (u64, u64),
    pub all_seed: (u64, u64),
    pub p01_seed: (u64, u64),
    pub p02_seed: (u64, u64),
    pub p12_seed: (u64, u64),
}

fn seed_bytes(hi: u64, lo: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[0..8].copy_from_slice(&hi.to_le_bytes());
    out[8..16].copy_from_slice(&lo.to_le_bytes());
    // ChaCha20Rng wants a 32-byte seed; the remaining 16 bytes are zero,
    // matching the 128-bit effective seed the original 64+64 pair carries.
    out
}

fn reseed(hi: u64, lo: u64) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(seed_bytes(hi, lo))
}

/// The party-indexed collection of PRG streams described in spec §4.1.
pub struct RandGenPool {
    pid: u8,
    k_self: ChaCha20Rng,
    k_all: ChaCha20Rng,
    k_01: ChaCha20Rng,
    k_02: ChaCha20Rng,
    k_12: ChaCha20Rng,
    all_seed: (u64, u64),
    k_i: HashMap<u64, ChaCha20Rng>,
}

impl RandGenPool {
    /// `seeds.self_seed`'s low word defaults to the party id at the caller's
    /// discretion (spec §6: "lo defaults to `pid`"); this constructor takes
    /// whatever the caller resolved and just requires it be unique per
    /// party, which callers enforce by mixing in `pid`.
    #[must_use]
    pub fn new(pid: u8, seeds: Seeds) -> Self {
        RandGenPool {
            pid,
            k_self: reseed(seeds.self_seed.0, seeds.self_seed.1),
            k_all: reseed(seeds.all_seed.0, seeds.all_seed.1),
            k_01: reseed(seeds.p01_seed.0, seeds.p01_seed.1),
            k_02: reseed(seeds.p02_seed.0, seeds.p02_seed.1),
            k_12: reseed(seeds.p12_seed.0, seeds.p12_seed.1),
            all_seed: seeds.all_seed,
            k_i: HashMap::new(),
        }
    }

    pub fn pid(&self) -> u8 {
        self.pid
    }

    pub fn self_stream(&mut self) -> &mut ChaCha20Rng {
        &mut self.k_self
    }

    pub fn all(&mut self) -> &mut ChaCha20Rng {
        &mut self.k_all
    }

    pub fn p01(&mut self) -> &mut ChaCha20Rng {
        &mut self.k_01
    }

    pub fn p02(&mut self) -> &mut ChaCha20Rng {
        &mut self.k_02
    }

    pub fn p12(&mut self) -> &mut ChaCha20Rng {
        &mut self.k_12
    }

    /// A stream indexed by an arbitrary tag, reproducibly derived from the
    /// globally-shared `all` seed so every party materialises the same
    /// stream for the same tag without a network round.
    pub fn pi(&mut self, tag: u64) -> &mut ChaCha20Rng {
        self.k_i
            .entry(tag)
            .or_insert_with(|| reseed(self.all_seed.0 ^ tag, self.all_seed.1.rotate_left(1) ^ tag))
    }

    #[must_use]
    pub fn next_ring(rng: &mut ChaCha20Rng) -> crate::ring::Ring {
        crate::ring::Ring(rng.next_u32())
    }

    #[must_use]
    pub fn next_bool(rng: &mut ChaCha20Rng) -> crate::ring::BoolRing {
        crate::ring::BoolRing(rng.next_u32() & 1 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(lo_self: u64) -> Seeds {
        Seeds {
            self_seed: (1, lo_self),
            all_seed: (2, 2),
            p01_seed: (3, 3),
            p02_seed: (4, 4),
            p12_seed: (5, 5),
        }
    }

    #[test]
    fn pairwise_streams_match_between_parties() {
        let mut p1 = RandGenPool::new(1, seeds(1));
        let mut p2 = RandGenPool::new(2, seeds(2));

        // p12 is shared between parties 1 and 2.
        assert_eq!(p1.p12().next_u32(), p2.p12().next_u32());
        // self streams diverge because the low word differs per party.
        assert_ne!(p1.self_stream().next_u32(), p2.self_stream().next_u32());
    }

    #[test]
    fn pi_is_deterministic_for_same_tag() {
        let mut pool = RandGenPool::new(0, seeds(0));
        let a = pool.pi(7).next_u32();
        let mut pool2 = RandGenPool::new(0, seeds(0));
        let b = pool2.pi(7).next_u32();
        assert_eq!(a, b);
    }
}
