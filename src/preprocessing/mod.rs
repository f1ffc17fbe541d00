mod shuffle_cache;
mod store;

pub use shuffle_cache::{PermutationBundle, ShuffleCache};
pub use store::{ArithTriple, BoolTriple, GatePreproc, PreprocCircuit, PreprocessingStore, ShuffleRecord};
