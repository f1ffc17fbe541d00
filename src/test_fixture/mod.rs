//! In-process three-party test harness (spec §8 "Test tooling"): wires
//! in-memory channels pairwise between three parties sharing one `tokio`
//! runtime and drives the full offline-then-online protocol in one call,
//! grounded on the teacher's own `test_fixture::world` lifecycle (build
//! gateways, hand them to protocol code, collect results) generalised from
//! two-party to three-party and from a fixed step space to this crate's
//! circuit/preprocessing types.

mod world;

pub use world::{run_offline_online, TestWorld};
