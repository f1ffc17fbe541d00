use std::collections::HashMap;

use crate::circuit::builder::{Circuit, OutputMode};
use crate::circuit::gate::{Gate, WireId, WireKind};

/// A vector of layers; each layer is a sequence of gates preserving original
/// creation order. Layers are separated by interactive gates only: the
/// depth of a gate is the maximum depth of its inputs, plus one iff
/// interactive, so non-interactive gates fold into the layer of their
/// deepest input and one network round per layer suffices.
#[derive(Debug, Clone)]
pub struct LevelOrderedCircuit {
    pub layers: Vec<Vec<Gate>>,
    pub num_wires: usize,
    pub num_gates: usize,
    pub outputs: Vec<(WireId, OutputMode)>,
    pub counts: HashMap<&'static str, usize>,
    /// Per-wire arithmetic-vs-boolean tag, derived from the producing gate
    /// (spec §3). Sized by `num_wires`, not `num_gates` — see the resolved
    /// Open Question in `SPEC_FULL.md` §4.4/§9.
    pub wire_kind: Vec<WireKind>,
}

impl LevelOrderedCircuit {
    #[must_use]
    pub fn kind_of(&self, wire: WireId) -> WireKind {
        self.wire_kind[wire]
    }
}

impl LevelOrderedCircuit {
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

/// `orderGatesByLevel`: single pass over gates in creation order assigning
/// each a depth, then grouping by depth while preserving relative creation
/// order within each layer. `O(|gates| + |wires|)`.
#[must_use]
pub fn order_gates_by_level(circuit: Circuit) -> LevelOrderedCircuit {
    let num_wires = circuit.num_wires();
    let outputs = circuit.outputs().to_vec();
    let gates = circuit.gates().to_vec();
    let num_gates = gates.len();

    let mut wire_depth = vec![0usize; num_wires];
    let mut wire_kind = vec![WireKind::Arith; num_wires];
    let mut layers: Vec<Vec<Gate>> = Vec::new();
    let mut counts: HashMap<&'static str, usize> = HashMap::new();

    for gate in gates {
        let max_input_depth = gate.depth_inputs().map(|w| wire_depth[w]).max().unwrap_or(0);
        let depth = if gate.depth_inputs().next().is_none() {
            // Input gates: depth 0 regardless of the max-of-empty default.
            0
        } else if gate.kind.is_interactive() {
            max_input_depth + 1
        } else {
            max_input_depth
        };

        let primary_input_kind = gate.inputs.first().map(|&w| wire_kind[w]);
        let kind = gate.kind.output_kind(primary_input_kind);

        for w in gate.output.wires() {
            wire_depth[w] = depth;
            wire_kind[w] = kind;
        }

        *counts.entry(gate.kind.name()).or_insert(0) += 1;

        if layers.len() <= depth {
            layers.resize_with(depth + 1, Vec::new);
        }
        layers[depth].push(gate);
    }

    LevelOrderedCircuit {
        layers,
        num_wires,
        num_gates,
        outputs,
        counts,
        wire_kind,
    }
}

/// Used only for diagnostics: total gates across all layers, for assertions
/// that layering didn't drop anything.
#[must_use]
pub fn total_gates(circ: &LevelOrderedCircuit) -> usize {
    circ.layers.iter().map(Vec::len).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::gate::GateKind;

    #[test]
    fn non_interactive_folds_into_deepest_input_layer() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let b = c.new_input_wire(2);
        let mul = c.add_arith(GateKind::Mul, &[a, b]).unwrap();
        let add = c.add_arith(GateKind::Add, &[mul, a]).unwrap();
        c.set_as_output(add).unwrap();

        let level = order_gates_by_level(c);
        assert_eq!(level.depth(), 2);
        assert_eq!(level.layers[0].len(), 2); // both inputs
        assert_eq!(level.layers[1].len(), 2); // Mul (interactive) + Add folded in
        assert_eq!(total_gates(&level), level.num_gates);
    }

    #[test]
    fn two_interactive_layers_for_chained_muls() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let b = c.new_input_wire(2);
        let m1 = c.add_arith(GateKind::Mul, &[a, b]).unwrap();
        let m2 = c.add_arith(GateKind::Mul, &[m1, a]).unwrap();
        c.set_as_output(m2).unwrap();

        let level = order_gates_by_level(c);
        assert_eq!(level.depth(), 3);
    }

    #[test]
    fn wire_kind_tracks_arith_vs_bool() {
        let mut c = Circuit::new();
        let a = c.new_input_wire(1);
        let bit = c.new_bin_input_wire(2);
        let sum = c.add_arith(GateKind::Add, &[a, a]).unwrap();
        let xored = c.add_bool(GateKind::Xor, &[bit, bit]).unwrap();
        let converted = c.add_arith(GateKind::ConvertB2A, &[bit]).unwrap();

        let level = order_gates_by_level(c);
        assert_eq!(level.kind_of(sum), crate::circuit::gate::WireKind::Arith);
        assert_eq!(level.kind_of(xored), crate::circuit::gate::WireKind::Bool);
        assert_eq!(level.kind_of(converted), crate::circuit::gate::WireKind::Arith);
    }
}
