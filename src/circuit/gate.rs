use crate::ring::Ring;

/// A non-negative integer assigned monotonically by the builder; valid range
/// is `[0, num_wires)`. Each wire has exactly one producing gate.
pub type WireId = usize;

/// A non-negative integer assigned monotonically on gate creation.
pub type GateId = usize;

/// Widths (in bits of a 32-bit word) of the five `EqualsZero` tree-OR
/// layers, narrowest last. Taken verbatim from `original_source`'s
/// `subcircuits.cpp`/`subcircuits.h` (see `SPEC_FULL.md` §3).
pub const EQZ_LEVEL_WIDTHS: [u32; 5] = [16, 8, 4, 2, 1];

/// Either a gate owns a single output wire, or a vector of output wires
/// sized equal to its vector input(s). A gate never owns both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutput {
    Scalar(WireId),
    Vector(Vec<WireId>),
}

impl GateOutput {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            GateOutput::Scalar(_) => 1,
            GateOutput::Vector(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn wires(&self) -> Vec<WireId> {
        match self {
            GateOutput::Scalar(w) => vec![*w],
            GateOutput::Vector(ws) => ws.clone(),
        }
    }
}

/// The complete gate-kind enumeration from spec §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateKind {
    // I/O
    ArithInput { pid: u8 },
    BoolInput { pid: u8 },

    // Arith binary
    Add,
    Sub,
    Mul,

    // Bool binary
    Xor,
    And,

    // Const binary
    ConstAdd(Ring),
    ConstMul(Ring),

    // Arith unary
    ConvertB2A,

    /// One layer of the 5-layer equals-zero OR-reduction tree (level in
    /// 0..=4). Takes the current width-many boolean shares as its vector
    /// input and produces the next, narrower layer (`EQZ_LEVEL_WIDTHS`);
    /// the final layer's single output bit is the (negated) zero flag.
    EqualsZero { level: u8 },

    /// A comparison/MSB-based unary op declared in the circuit language
    /// (`Relu`, `Msb`, `Ltz`, `Eqz` per spec §4.5 "Tie-breaks and numeric
    /// semantics") but not implemented by this engine: buildable, but fails
    /// with [`crate::error::Error::UnsupportedGate`] the first time the
    /// online evaluator reaches it.
    Unsupported { name: &'static str },

    // Vector
    /// `pid_pair` identifies which of the three pairwise shuffle relations
    /// this invocation belongs to (a sparse namespace, see spec §3/§9).
    Shuffle { pair_id: u32, reverse: bool },
    DoubleShuffle { new_id: u32, src_id: u32, dst_id: u32 },
    GenCompaction,
    Reveal,
    Flip,
    /// Packs a bit-vector's shares into one scalar wire: `out = in[0] +
    /// sum_{j=1}(in[j] << j)` (`original_source/online_evaluator_load_balanced.cpp`
    /// `kCompose`). A single vector input, a *scalar* output — unlike every
    /// other entry in this family.
    Compose,
    /// Scatters `in1` to the positions named by the (already-revealed,
    /// 1-indexed) values on `in2`: `out[in2[j] - 1] = in1[j]`. `in2` is an
    /// ordinary wire vector, not a builder-time constant — the permutation
    /// it carries is only known once the circuit runs.
    Reorder,
    /// Gathers `in1` through the positions named by `in2`, the inverse of
    /// `Reorder`: `out[j] = in1[in2[j] - 1]`.
    ReorderInverse,
    AddConstToVec { c: Ring, n: usize },
    AddVec,
    PreparePropagate { n: usize },
    Propagate,
    PrepareGather,
    Gather { n: usize },
}

impl GateKind {
    /// Human-readable kind name, used in error messages and tracing spans.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::ArithInput { .. } => "ArithInput",
            GateKind::BoolInput { .. } => "BoolInput",
            GateKind::Add => "Add",
            GateKind::Sub => "Sub",
            GateKind::Mul => "Mul",
            GateKind::Xor => "Xor",
            GateKind::And => "And",
            GateKind::ConstAdd(_) => "ConstAdd",
            GateKind::ConstMul(_) => "ConstMul",
            GateKind::ConvertB2A => "ConvertB2A",
            GateKind::EqualsZero { .. } => "EqualsZero",
            GateKind::Unsupported { name } => name,
            GateKind::Shuffle { .. } => "Shuffle",
            GateKind::DoubleShuffle { .. } => "DoubleShuffle",
            GateKind::GenCompaction => "GenCompaction",
            GateKind::Reveal => "Reveal",
            GateKind::Flip => "Flip",
            GateKind::Compose => "Compose",
            GateKind::Reorder => "Reorder",
            GateKind::ReorderInverse => "ReorderInverse",
            GateKind::AddConstToVec { .. } => "AddConstToVec",
            GateKind::AddVec => "AddVec",
            GateKind::PreparePropagate { .. } => "PreparePropagate",
            GateKind::Propagate => "Propagate",
            GateKind::PrepareGather => "PrepareGather",
            GateKind::Gather { .. } => "Gather",
        }
    }

    /// Deterministic interactive flag from spec §3: gates in this list
    /// require one network round; everything else folds into the layer of
    /// its deepest input.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            GateKind::Mul
                | GateKind::And
                | GateKind::ConvertB2A
                | GateKind::EqualsZero { .. }
                | GateKind::Shuffle { .. }
                | GateKind::DoubleShuffle { .. }
                | GateKind::GenCompaction
                | GateKind::Reveal
        )
    }

    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            GateKind::Shuffle { .. }
                | GateKind::DoubleShuffle { .. }
                | GateKind::GenCompaction
                | GateKind::Reveal
                | GateKind::Flip
                | GateKind::Reorder
                | GateKind::ReorderInverse
                | GateKind::AddConstToVec { .. }
                | GateKind::AddVec
                | GateKind::PreparePropagate { .. }
                | GateKind::Propagate
                | GateKind::PrepareGather
                | GateKind::Gather { .. }
                | GateKind::EqualsZero { .. }
        )
    }

    /// `Compose` is the one member of the "Vector" gate family (per spec §3's
    /// table) whose output is a single wire rather than a same-length
    /// vector — see [`GateKind::Compose`].
    #[must_use]
    pub fn is_scalar_vector_input(&self) -> bool {
        matches!(self, GateKind::Compose)
    }

    /// Gate kinds whose vector input comes in two equal-length halves
    /// (`inputs`/`inputs2`), rather than one primary vector.
    #[must_use]
    pub fn is_double_vector(&self) -> bool {
        matches!(self, GateKind::AddVec | GateKind::Propagate | GateKind::Reorder | GateKind::ReorderInverse)
    }
}

/// Which reveal/reconstruction path a wire's value takes: summed (arithmetic)
/// or xored (boolean). Implicit in the gate that produced the wire (spec §3:
/// "a wire's arithmetic-vs-boolean nature is implicit in the gate that
/// produced it"); vector gates pass through the kind of their primary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Arith,
    Bool,
}

impl GateKind {
    /// The [`WireKind`] this gate's output wire(s) carry, given the kind of
    /// its primary input (`None` for `ArithInput`/`BoolInput`, which have no
    /// input to inherit from).
    #[must_use]
    pub fn output_kind(&self, input_kind: Option<WireKind>) -> WireKind {
        match self {
            GateKind::ArithInput { .. } => WireKind::Arith,
            GateKind::BoolInput { .. } => WireKind::Bool,
            GateKind::Add | GateKind::Sub | GateKind::Mul | GateKind::ConstAdd(_) | GateKind::ConstMul(_) | GateKind::ConvertB2A => {
                WireKind::Arith
            }
            GateKind::Xor | GateKind::And | GateKind::EqualsZero { .. } => WireKind::Bool,
            // Compose reconstructs a ring-valued integer from bit shares,
            // the same arithmetic reinterpretation ConvertB2A performs.
            GateKind::Compose => WireKind::Arith,
            // Remaining vector gates are pass-through: they reorder/mask/
            // reveal whatever kind of share their primary input already
            // carries. `Unsupported` is a scalar unary op that is never
            // actually evaluated (it fails before producing a share), but
            // still needs a kind for the scheduler's bookkeeping, so it
            // passes its input's kind through the same way.
            _ => input_kind.expect("gate always has a primary input to inherit a wire kind from"),
        }
    }
}

/// A single gate in the circuit graph.
///
/// Invariant (spec §3): for every gate, all input wire ids are strictly less
/// than its output wire ids, so a single forward pass suffices for depth
/// assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub id: GateId,
    pub kind: GateKind,
    /// Primary operand: for scalar binary gates, both inputs; for scalar
    /// unary gates, the single input; for vector gates, the primary vector.
    pub inputs: Vec<WireId>,
    /// Secondary vector operand, used only by `AddVec` (the second addend).
    /// Empty for every other gate kind.
    pub inputs2: Vec<WireId>,
    pub output: GateOutput,
}

impl Gate {
    #[must_use]
    pub fn depth_inputs(&self) -> impl Iterator<Item = WireId> + '_ {
        self.inputs.iter().copied().chain(self.inputs2.iter().copied())
    }
}
