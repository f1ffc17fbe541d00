//! Three-party, honest-majority, semi-honest MPC engine over `Z/2^32`,
//! extended with vector primitives — oblivious shuffles, compactions,
//! permutation composition, and propagate/gather message passing over
//! secret-shared graphs.
//!
//! Party 0 is a non-participating preprocessing dealer; parties 1 and 2 are
//! the online evaluators. Callers build a [`circuit::Circuit`], freeze it
//! with [`circuit::order_gates_by_level`], run an
//! [`protocol::offline::OfflineEvaluator`] to produce a
//! [`preprocessing::PreprocCircuit`], then drive a
//! [`protocol::online::OnlineEvaluator`] to obtain cleartext outputs.
//!
//! See `SPEC_FULL.md` for the full component breakdown and `DESIGN.md` for
//! the grounding ledger.

pub mod circuit;
pub mod config;
pub mod error;
pub mod net;
pub mod perm;
pub mod preprocessing;
pub mod protocol;
pub mod rand_gen_pool;
pub mod ring;
pub mod workers;

#[cfg(any(test, feature = "in-memory-infra"))]
pub mod test_fixture;

pub use error::{Error, Result};
