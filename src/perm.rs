//! Permutation helpers shared by the shuffle preprocessing cache and the
//! online evaluator's shuffle/compose/reorder gates.
//!
//! A permutation of length `n` is represented as `Vec<usize>`, a bijection
//! on `{0,...,n-1}`, under the "gather" convention: `apply(p, v)[i] = v[p[i]]`.

use rand::seq::SliceRandom;
use rand_core::RngCore;

/// A uniformly random permutation of `{0,...,n-1}`, drawn from `rng` via a
/// Fisher-Yates shuffle.
#[must_use]
pub fn random_permutation(n: usize, rng: &mut impl RngCore) -> Vec<usize> {
    let mut p: Vec<usize> = (0..n).collect();
    p.shuffle(rng);
    p
}

/// `(p ∘ q)[i] = p[q[i]]`.
#[must_use]
pub fn compose(p: &[usize], q: &[usize]) -> Vec<usize> {
    assert_eq!(p.len(), q.len());
    q.iter().map(|&j| p[j]).collect()
}

/// The permutation `p'` such that `p'[p[i]] = i` for all `i`.
#[must_use]
pub fn inverse(p: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; p.len()];
    for (i, &pi) in p.iter().enumerate() {
        inv[pi] = i;
    }
    inv
}

/// `out[i] = v[p[i]]`.
#[must_use]
pub fn apply<T: Copy>(p: &[usize], v: &[T]) -> Vec<T> {
    assert_eq!(p.len(), v.len());
    p.iter().map(|&j| v[j]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn inverse_round_trips() {
        let mut rng = thread_rng();
        let p = random_permutation(20, &mut rng);
        let inv = inverse(&p);
        let v: Vec<usize> = (0..20).collect();
        let permuted = apply(&p, &v);
        let restored = apply(&inv, &permuted);
        assert_eq!(restored, v);
    }

    #[test]
    fn compose_matches_sequential_application() {
        let mut rng = thread_rng();
        let p = random_permutation(10, &mut rng);
        let q = random_permutation(10, &mut rng);
        let v: Vec<usize> = (0..10).collect();
        let composed = compose(&p, &q);
        let sequential = apply(&p, &apply(&q, &v));
        assert_eq!(apply(&composed, &v), sequential);
    }
}
