use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::perm::{compose, inverse, random_permutation};
use crate::rand_gen_pool::RandGenPool;

/// All four permutations backing a shuffle pair-id, as known to the dealer.
/// Invariant: `π′₁ ∘ π′₀ = π₀ ∘ π₁`.
#[derive(Debug, Clone)]
pub struct PermutationBundle {
    pub pi0: Vec<usize>,
    pub pi1: Vec<usize>,
    pub pi0_prime: Vec<usize>,
    pub pi1_prime: Vec<usize>,
}

/// Keyed by shuffle pair-id, holds the four permutations that back every
/// `Shuffle`/`DoubleShuffle` invocation sharing that id. First use
/// materialises them; reuse returns the cached bundle. Because the
/// underlying store is a hash map rather than an id-ordered array, a higher
/// id seen before a lower one costs nothing extra — no need to reserve
/// empty slots for intervening ids the way a vector-indexed cache would.
#[derive(Debug, Default)]
pub struct ShuffleCache {
    bundles: HashMap<u32, PermutationBundle>,
}

impl ShuffleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, pair_id: u32) -> Option<&PermutationBundle> {
        self.bundles.get(&pair_id)
    }

    /// Materialises `pair_id`'s permutations on first sight (dealer-side):
    /// `π₀`, `π₁` via `p01`/`p02`; `π′₀` via `p01`; `π′₁` computed at the
    /// dealer so that `π′₁ ∘ π′₀ = π₀ ∘ π₁`.
    pub fn get_or_create(&mut self, pair_id: u32, n: usize, rgen: &mut RandGenPool) -> &PermutationBundle {
        self.bundles.entry(pair_id).or_insert_with(|| {
            let pi0 = random_permutation(n, rgen.p01());
            let pi1 = random_permutation(n, rgen.p02());
            let pi0_prime = random_permutation(n, rgen.p01());
            let composed = compose(&pi0, &pi1);
            let pi1_prime = compose(&composed, &inverse(&pi0_prime));
            PermutationBundle { pi0, pi1, pi0_prime, pi1_prime }
        })
    }

    /// Materialises `new_id`'s permutations as the composition of `dst`'s
    /// permutation with the inverse of `src`'s (`DoubleShuffle`). Fails with
    /// [`Error::UnmaterialisedSource`] if either referenced id has not yet
    /// been materialised — callers must arrange scheduling so sources appear
    /// earlier in the layered circuit.
    ///
    /// A naive formula for `π′₀_new` would reference `π′₁_new` before it is
    /// defined; resolved here by generating the prime pair the same way
    /// ordinary `Shuffle` does — masks proceed as a forward shuffle, sampling
    /// `π′₀_new` fresh and deriving `π′₁_new` from it.
    pub fn materialise_double(
        &mut self,
        new_id: u32,
        src_id: u32,
        dst_id: u32,
        n: usize,
        rgen: &mut RandGenPool,
    ) -> Result<&PermutationBundle> {
        if self.bundles.contains_key(&new_id) {
            return Ok(self.bundles.get(&new_id).unwrap());
        }
        let src = self.bundles.get(&src_id).cloned().ok_or(Error::UnmaterialisedSource(src_id))?;
        let dst = self.bundles.get(&dst_id).cloned().ok_or(Error::UnmaterialisedSource(dst_id))?;

        let pi0_new = random_permutation(n, rgen.p01());
        let src_composed = compose(&src.pi0, &src.pi1);
        let dst_composed = compose(&dst.pi0, &dst.pi1);
        // pi1_new = pi0_new^-1 . pi0_dst . pi1_dst . (pi0_src . pi1_src)^-1
        let pi1_new = compose(&inverse(&pi0_new), &compose(&dst_composed, &inverse(&src_composed)));

        let pi0_prime_new = random_permutation(n, rgen.p01());
        let composed_new = compose(&pi0_new, &pi1_new);
        let pi1_prime_new = compose(&composed_new, &inverse(&pi0_prime_new));

        self.bundles.insert(
            new_id,
            PermutationBundle {
                pi0: pi0_new,
                pi1: pi1_new,
                pi0_prime: pi0_prime_new,
                pi1_prime: pi1_prime_new,
            },
        );
        Ok(self.bundles.get(&new_id).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand_gen_pool::Seeds;

    fn seeds() -> Seeds {
        Seeds {
            self_seed: (1, 0),
            all_seed: (2, 2),
            p01_seed: (3, 3),
            p02_seed: (4, 4),
            p12_seed: (5, 5),
        }
    }

    #[test]
    fn shuffle_bundle_satisfies_composition_invariant() {
        let mut rgen = RandGenPool::new(0, seeds());
        let mut cache = ShuffleCache::new();
        let bundle = cache.get_or_create(7, 16, &mut rgen).clone();
        let lhs = compose(&bundle.pi1_prime, &bundle.pi0_prime);
        let rhs = compose(&bundle.pi0, &bundle.pi1);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn reuse_returns_identical_bundle() {
        let mut rgen = RandGenPool::new(0, seeds());
        let mut cache = ShuffleCache::new();
        let first = cache.get_or_create(3, 8, &mut rgen).clone();
        let second = cache.get_or_create(3, 8, &mut rgen).clone();
        assert_eq!(first.pi0, second.pi0);
        assert_eq!(first.pi1, second.pi1);
    }

    #[test]
    fn double_shuffle_requires_materialised_sources() {
        let mut rgen = RandGenPool::new(0, seeds());
        let mut cache = ShuffleCache::new();
        let err = cache.materialise_double(5, 1, 2, 8, &mut rgen).unwrap_err();
        assert!(matches!(err, Error::UnmaterialisedSource(1)));
    }

    #[test]
    fn double_shuffle_composes_src_and_dst() {
        let mut rgen = RandGenPool::new(0, seeds());
        let mut cache = ShuffleCache::new();
        cache.get_or_create(1, 8, &mut rgen);
        cache.get_or_create(2, 8, &mut rgen);
        let bundle = cache.materialise_double(3, 1, 2, 8, &mut rgen).unwrap().clone();
        // the composed "new" permutation must itself satisfy the shuffle invariant
        let lhs = compose(&bundle.pi1_prime, &bundle.pi0_prime);
        let rhs = compose(&bundle.pi0, &bundle.pi1);
        assert_eq!(lhs, rhs);
    }
}
