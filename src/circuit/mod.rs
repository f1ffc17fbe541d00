mod builder;
mod gate;
mod level;

pub use builder::{Circuit, OutputMode};
pub use gate::{Gate, GateId, GateKind, GateOutput, WireId, WireKind, EQZ_LEVEL_WIDTHS};
pub use level::{order_gates_by_level, total_gates, LevelOrderedCircuit};
