use crate::circuit::gate::{Gate, GateId, GateKind, GateOutput, WireId};
use crate::error::{Error, Result};
use crate::ring::Ring;

/// Whether an output wire should be reconstructed through the arithmetic or
/// the boolean reveal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Arith,
    Bool,
}

/// A typed gate graph, mutated only by builder calls, then frozen into a
/// [`crate::circuit::level::LevelOrderedCircuit`] by
/// [`crate::circuit::level::order_gates_by_level`].
///
/// Mirrors the teacher's circuit-then-freeze lifecycle, generalised to the
/// vector/permutation gate kinds spec §4.3 requires.
#[derive(Debug, Default, Clone)]
pub struct Circuit {
    gates: Vec<Gate>,
    num_wires: usize,
    outputs: Vec<(WireId, OutputMode)>,
}

impl Circuit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    #[must_use]
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    #[must_use]
    pub fn outputs(&self) -> &[(WireId, OutputMode)] {
        &self.outputs
    }

    fn alloc_wire(&mut self) -> WireId {
        let w = self.num_wires;
        self.num_wires += 1;
        w
    }

    fn check_wire(&self, w: WireId) -> Result<()> {
        if w < self.num_wires {
            Ok(())
        } else {
            Err(Error::InvalidWire(w, self.num_wires))
        }
    }

    fn push_gate(&mut self, kind: GateKind, inputs: Vec<WireId>, inputs2: Vec<WireId>, output: GateOutput) -> GateId {
        let id = self.gates.len();
        self.gates.push(Gate { id, kind, inputs, inputs2, output });
        id
    }

    /// `newInputWire()`: a fresh arithmetic input wire owned by `pid`.
    pub fn new_input_wire(&mut self, pid: u8) -> WireId {
        let w = self.alloc_wire();
        self.push_gate(GateKind::ArithInput { pid }, vec![], vec![], GateOutput::Scalar(w));
        w
    }

    /// `newBinInputWire()`: a fresh boolean input wire owned by `pid`.
    pub fn new_bin_input_wire(&mut self, pid: u8) -> WireId {
        let w = self.alloc_wire();
        self.push_gate(GateKind::BoolInput { pid }, vec![], vec![], GateOutput::Scalar(w));
        w
    }

    /// `addArith(kind, inputs...)`: type-checked scalar arithmetic gate.
    pub fn add_arith(&mut self, kind: GateKind, inputs: &[WireId]) -> Result<WireId> {
        let expected = match kind {
            GateKind::Add | GateKind::Sub | GateKind::Mul => 2,
            GateKind::ConvertB2A => 1,
            _ => {
                return Err(Error::InvalidGateKind {
                    kind: kind.name(),
                    expected: 0,
                    got: inputs.len(),
                })
            }
        };
        self.add_scalar_gate(kind, inputs, expected)
    }

    /// `addBool(kind, inputs...)`: type-checked scalar boolean gate.
    pub fn add_bool(&mut self, kind: GateKind, inputs: &[WireId]) -> Result<WireId> {
        let expected = match kind {
            GateKind::Xor | GateKind::And => 2,
            _ => {
                return Err(Error::InvalidGateKind {
                    kind: kind.name(),
                    expected: 0,
                    got: inputs.len(),
                })
            }
        };
        self.add_scalar_gate(kind, inputs, expected)
    }

    fn add_scalar_gate(&mut self, kind: GateKind, inputs: &[WireId], expected: usize) -> Result<WireId> {
        if inputs.len() != expected {
            return Err(Error::InvalidGateKind {
                kind: kind.name(),
                expected,
                got: inputs.len(),
            });
        }
        for &w in inputs {
            self.check_wire(w)?;
        }
        let out = self.alloc_wire();
        self.push_gate(kind, inputs.to_vec(), vec![], GateOutput::Scalar(out));
        Ok(out)
    }

    /// `addConstOp(kind, w, c)`: `ConstAdd`/`ConstMul` against a single wire.
    pub fn add_const_op(&mut self, kind_ctor: impl FnOnce(Ring) -> GateKind, w: WireId, c: Ring) -> Result<WireId> {
        self.check_wire(w)?;
        let kind = kind_ctor(c);
        let out = self.alloc_wire();
        self.push_gate(kind, vec![w], vec![], GateOutput::Scalar(out));
        Ok(out)
    }

    /// `addVector(kind, inputs..., params...)`: a vector gate whose output
    /// wires equal in length its primary input vector (or, for `Shuffle`
    /// etc., the single vector supplied). Double-vector kinds (`AddVec`,
    /// `Propagate`, `Reorder`, `ReorderInverse`) additionally require
    /// `inputs2` of the same length; every other kind expects it empty.
    pub fn add_vector(&mut self, kind: GateKind, inputs: &[WireId], inputs2: &[WireId]) -> Result<Vec<WireId>> {
        if !kind.is_vector() || kind.is_scalar_vector_input() {
            return Err(Error::InvalidGateKind {
                kind: kind.name(),
                expected: 0,
                got: inputs.len(),
            });
        }
        if inputs.is_empty() {
            return Err(Error::ArityMismatch {
                gate: self.gates.len(),
                lens: vec![0],
            });
        }
        if kind.is_double_vector() != (!inputs2.is_empty()) || (kind.is_double_vector() && inputs.len() != inputs2.len()) {
            return Err(Error::ArityMismatch {
                gate: self.gates.len(),
                lens: vec![inputs.len(), inputs2.len()],
            });
        }
        for &w in inputs.iter().chain(inputs2.iter()) {
            self.check_wire(w)?;
        }
        let outs: Vec<WireId> = (0..inputs.len()).map(|_| self.alloc_wire()).collect();
        self.push_gate(kind, inputs.to_vec(), inputs2.to_vec(), GateOutput::Vector(outs.clone()));
        Ok(outs)
    }

    /// `Compose`: packs a bit vector's shares into a single scalar wire
    /// (spec §3 `GLOSSARY`/SPEC_FULL.md §4.5; the one "Vector" family
    /// member with a scalar output, see [`GateKind::Compose`]).
    pub fn add_compose(&mut self, inputs: &[WireId]) -> Result<WireId> {
        if inputs.is_empty() {
            return Err(Error::ArityMismatch {
                gate: self.gates.len(),
                lens: vec![0],
            });
        }
        for &w in inputs {
            self.check_wire(w)?;
        }
        let out = self.alloc_wire();
        self.push_gate(GateKind::Compose, inputs.to_vec(), vec![], GateOutput::Scalar(out));
        Ok(out)
    }

    /// Declares a comparison/MSB-based op (`Relu`, `Msb`, `Ltz`, `Eqz`) the
    /// circuit language names but this engine does not implement (spec
    /// §4.5, §7 `UnsupportedGate`): buildable, type-checked like any other
    /// unary gate, but fails the first time the online evaluator reaches it.
    pub fn add_unsupported_op(&mut self, name: &'static str, w: WireId) -> Result<WireId> {
        self.check_wire(w)?;
        let out = self.alloc_wire();
        self.push_gate(GateKind::Unsupported { name }, vec![w], vec![], GateOutput::Scalar(out));
        Ok(out)
    }

    /// Builds the 5-layer equals-zero OR-reduction tree (spec §3/§4.3,
    /// widths from [`crate::circuit::gate::EQZ_LEVEL_WIDTHS`]): `bits` must
    /// hold exactly 32 boolean-shared wires, and the returned wire is the
    /// tree's single surviving bit (true iff at least one input bit was
    /// set — callers wanting "is zero" negate it).
    pub fn add_equals_zero_tree(&mut self, bits: &[WireId]) -> Result<WireId> {
        if bits.len() != 32 {
            return Err(Error::ArityMismatch {
                gate: self.gates.len(),
                lens: vec![bits.len()],
            });
        }
        for &w in bits {
            self.check_wire(w)?;
        }
        let mut layer = bits.to_vec();
        for (level, &width) in crate::circuit::gate::EQZ_LEVEL_WIDTHS.iter().enumerate() {
            let width = width as usize;
            let outs: Vec<WireId> = (0..width).map(|_| self.alloc_wire()).collect();
            self.push_gate(
                GateKind::EqualsZero { level: level as u8 },
                layer,
                vec![],
                GateOutput::Vector(outs.clone()),
            );
            layer = outs;
        }
        Ok(layer[0])
    }

    /// `setAsOutput(w)`: append to the output list, tagging the arithmetic
    /// reveal mode.
    pub fn set_as_output(&mut self, w: WireId) -> Result<()> {
        self.check_wire(w)?;
        self.outputs.push((w, OutputMode::Arith));
        Ok(())
    }

    /// `setAsBinOutput(w)`: append to the output list, tagging the boolean
    /// reveal mode.
    pub fn set_as_bin_output(&mut self, w: WireId) -> Result<()> {
        self.check_wire(w)?;
        self.outputs.push((w, OutputMode::Bool));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_wire() {
        let mut c = Circuit::new();
        let err = c.add_arith(GateKind::Add, &[0, 1]).unwrap_err();
        assert!(matches!(err, Error::InvalidWire(0, 0)));
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let err = c.add_arith(GateKind::Add, &[a]).unwrap_err();
        assert!(matches!(err, Error::InvalidGateKind { expected: 2, got: 1, .. }));
    }

    #[test]
    fn builds_simple_circuit() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let b = c.new_input_wire(2);
        let sum = c.add_arith(GateKind::Add, &[a, b]).unwrap();
        c.set_as_output(sum).unwrap();
        assert_eq!(c.num_wires(), 3);
        assert_eq!(c.num_gates(), 3);
        assert_eq!(c.outputs(), &[(sum, OutputMode::Arith)]);
    }

    #[test]
    fn equals_zero_tree_chains_five_narrowing_layers() {
        let mut c = Circuit::new();
        let bits: Vec<WireId> = (0..32).map(|i| c.new_bin_input_wire((i % 3) as u8)).collect();
        let flag = c.add_equals_zero_tree(&bits).unwrap();
        assert_eq!(c.num_gates(), 32 + 5);
        let eqz_gates: Vec<_> = c.gates().iter().filter(|g| matches!(g.kind, GateKind::EqualsZero { .. })).collect();
        assert_eq!(eqz_gates.len(), 5);
        assert_eq!(eqz_gates[0].inputs.len(), 32);
        assert_eq!(eqz_gates[4].output.wires(), vec![flag]);
    }

    #[test]
    fn equals_zero_tree_rejects_wrong_width() {
        let mut c = Circuit::new();
        let bits: Vec<WireId> = (0..10).map(|_| c.new_bin_input_wire(1)).collect();
        let err = c.add_equals_zero_tree(&bits).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[test]
    fn vector_gate_requires_equal_length_inputs() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let b = c.new_input_wire(2);
        let err = c.add_vector(GateKind::AddVec, &[a], &[a, b]).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }
}
