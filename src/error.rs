use crate::circuit::{GateId, WireId};

/// Unified error type for every fallible entry point in the crate.
///
/// Builder-time errors (`InvalidWire`, `InvalidGateKind`, `ArityMismatch`) and
/// evaluator-time errors (`UnsupportedGate`, `UnmaterialisedSource`,
/// `Transport`) are all fatal: there is no local recovery, only propagation
/// to the driver (see `bin/helper.rs`).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("wire {0} is out of range for a circuit with {1} wires")]
    InvalidWire(WireId, usize),

    #[error("gate kind {kind} does not accept {got} input(s) (expected {expected})")]
    InvalidGateKind {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("vector gate {gate:?} received inputs of mismatched length ({lens:?})")]
    ArityMismatch { gate: GateId, lens: Vec<usize> },

    #[error("gate {0:?} has kind {1} which the online evaluator does not implement")]
    UnsupportedGate(GateId, &'static str),

    #[error("double-shuffle referencing pair id {0} requires it to be materialised first")]
    UnmaterialisedSource(u32),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "enable-serde")]
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[cfg(feature = "tls")]
    #[error(transparent)]
    Tls(#[from] rustls::Error),

    #[error("task join failure: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
