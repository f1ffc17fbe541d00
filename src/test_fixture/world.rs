use std::collections::HashMap;

use crate::circuit::{LevelOrderedCircuit, WireId};
use crate::error::Result;
use crate::net::mem::in_memory_pair;
use crate::net::Channel;
use crate::protocol::offline::OfflineEvaluator;
use crate::protocol::online::{dealer_learn_outputs, OnlineEvaluator};
use crate::protocol::{PartyNetwork, Role};
use crate::rand_gen_pool::{RandGenPool, Seeds};
use crate::ring::Ring;

/// Deterministic seeds shared by the three in-memory parties a [`TestWorld`]
/// spins up: `all`/`p01`/`p02`/`p12` match between the parties that must
/// share them, `self` differs by `pid` (spec §4.1/§6 "lo defaults to pid").
#[must_use]
pub fn test_seeds(pid: u8) -> Seeds {
    Seeds {
        self_seed: (0xC0FFEE, u64::from(pid)),
        all_seed: (0xA11, 0xA11),
        p01_seed: (0x01, 0x01),
        p02_seed: (0x02, 0x02),
        p12_seed: (0x12, 0x12),
    }
}

/// Three in-memory parties wired pairwise, sharing one `tokio` runtime. For
/// now every exchanged byte stays inside this process's memory, so there is
/// no need to associate anything with a query id the way a networked
/// deployment would — but the shape (one [`PartyNetwork`] per party,
/// constructed from a map of peer channels) is exactly what `bin/helper.rs`
/// builds from real TCP/TLS connections.
pub struct TestWorld {
    pub networks: [PartyNetwork; 3],
}

impl TestWorld {
    /// Builds the three pairwise in-memory channel links and assembles one
    /// [`PartyNetwork`] per party.
    #[must_use]
    pub fn new() -> Self {
        let (c01_p0, c01_p1) = in_memory_pair();
        let (c02_p0, c02_p2) = in_memory_pair();
        let (c12_p1, c12_p2) = in_memory_pair();

        let net0 = PartyNetwork::new(HashMap::from([
            (1u8, Box::new(c01_p0) as Box<dyn Channel>),
            (2u8, Box::new(c02_p0) as Box<dyn Channel>),
        ]));
        let net1 = PartyNetwork::new(HashMap::from([
            (0u8, Box::new(c01_p1) as Box<dyn Channel>),
            (2u8, Box::new(c12_p1) as Box<dyn Channel>),
        ]));
        let net2 = PartyNetwork::new(HashMap::from([
            (0u8, Box::new(c02_p2) as Box<dyn Channel>),
            (1u8, Box::new(c12_p2) as Box<dyn Channel>),
        ]));

        TestWorld {
            networks: [net0, net1, net2],
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the full `offline(circuit)` then `online(preproc, inputs)` pipeline
/// across three in-memory parties and returns the reconstructed cleartext
/// output map — the single-call round-trip oracle spec §8's "round-trip law"
/// and concrete end-to-end scenarios are checked against.
///
/// `inputs[pid]` supplies the cleartext values for wires owned by party
/// `pid`; entries for wires owned by a different party are ignored.
pub async fn run_offline_online(
    circuit: LevelOrderedCircuit,
    inputs: [HashMap<WireId, Ring>; 3],
) -> Result<HashMap<WireId, Ring>> {
    let world = TestWorld::new();
    let [net0, net1, net2] = world.networks;
    let [inputs0, inputs1, inputs2] = inputs;

    let offline0 = OfflineEvaluator::new(Role::Dealer, RandGenPool::new(0, test_seeds(0)), &net0);
    let offline1 = OfflineEvaluator::new(Role::OnlineA, RandGenPool::new(1, test_seeds(1)), &net1);
    let offline2 = OfflineEvaluator::new(Role::OnlineB, RandGenPool::new(2, test_seeds(2)), &net2);

    let (preproc0, preproc1, preproc2) = tokio::try_join!(
        offline0.run(&circuit, &inputs0),
        offline1.run(&circuit, &HashMap::new()),
        offline2.run(&circuit, &HashMap::new()),
    )?;

    let output_mask = preproc0.output_mask.expect("dealer always produces an output mask");

    let mut online1 = OnlineEvaluator::new(Role::OnlineA, RandGenPool::new(1, test_seeds(1)), &net1, preproc1, circuit.num_wires, crate::config::DEFAULT_THREADS);
    let mut online2 = OnlineEvaluator::new(Role::OnlineB, RandGenPool::new(2, test_seeds(2)), &net2, preproc2, circuit.num_wires, crate::config::DEFAULT_THREADS);

    let (outputs1, outputs2, outputs0) = tokio::try_join!(
        online1.run(&circuit, &inputs1),
        online2.run(&circuit, &inputs2),
        dealer_learn_outputs(&net0, &circuit, &output_mask),
    )?;

    debug_assert_eq!(outputs1, outputs2, "both online parties must reconstruct identical outputs");
    debug_assert_eq!(outputs1, outputs0, "the dealer must unblind the same outputs the online parties reconstructed");

    Ok(outputs1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{order_gates_by_level, Circuit, GateKind};

    #[tokio::test]
    async fn primitive_gates_scenario() {
        // Inputs per spec §8 scenario 1, all provided by party 2.
        let mut c = Circuit::new();
        let a = c.new_input_wire(2);
        let b = c.new_input_wire(2);
        let cc = c.new_input_wire(2);
        let d = c.new_input_wire(2);
        let e = c.new_input_wire(2);
        let f = c.new_input_wire(2);

        let ab = c.add_arith(GateKind::Mul, &[a, b]).unwrap();
        let cd = c.add_arith(GateKind::Add, &[cc, d]).unwrap();
        let out1 = c.add_arith(GateKind::Mul, &[ab, cd]).unwrap();
        c.set_as_output(out1).unwrap();

        let ef_and = c.add_bool(GateKind::And, &[e, f]).unwrap();
        c.set_as_bin_output(ef_and).unwrap();
        let ef_xor = c.add_bool(GateKind::Xor, &[e, f]).unwrap();
        c.set_as_bin_output(ef_xor).unwrap();

        let ab_sum = c.add_arith(GateKind::Add, &[a, b]).unwrap();
        let out4 = c.add_arith(GateKind::Mul, &[cc, ab_sum]).unwrap();
        c.set_as_output(out4).unwrap();

        let circuit = order_gates_by_level(c);

        let mut inputs2 = HashMap::new();
        inputs2.insert(a, Ring(5));
        inputs2.insert(b, Ring(3));
        inputs2.insert(cc, Ring(8));
        inputs2.insert(d, Ring(11));
        inputs2.insert(e, Ring(0x00FF_00F1));
        inputs2.insert(f, Ring(0xFF1F_0010));

        let outputs = run_offline_online(circuit, [HashMap::new(), HashMap::new(), inputs2]).await.unwrap();

        assert_eq!(outputs[&out1], Ring(285));
        assert_eq!(outputs[&ef_and], Ring(0x001F_0010));
        assert_eq!(outputs[&ef_xor], Ring(0xFFE0_00E1));
        assert_eq!(outputs[&out4], Ring(64));
    }

    #[tokio::test]
    async fn equals_zero_scenario() {
        // Inputs per spec §8 scenario 4: {-1, 0, 1, 2, 811}, expected {0,1,0,0,0}.
        let mut c = Circuit::new();
        let values: Vec<i64> = vec![-1, 0, 1, 2, 811];
        let mut outputs_wires = Vec::new();
        let mut bit_wires_per_value = Vec::new();

        for _ in &values {
            let bits: Vec<WireId> = (0..32).map(|_| c.new_bin_input_wire(2)).collect();
            bit_wires_per_value.push(bits);
        }
        for bits in &bit_wires_per_value {
            let or_flag = c.add_equals_zero_tree(bits).unwrap();
            // or_flag is true iff some bit set; "is zero" is its negation,
            // produced here with an XOR against an always-one constant bit.
            let one = c.new_bin_input_wire(0);
            let is_zero = c.add_bool(GateKind::Xor, &[or_flag, one]).unwrap();
            let as_arith = c.add_arith(GateKind::ConvertB2A, &[is_zero]).unwrap();
            c.set_as_output(as_arith).unwrap();
            outputs_wires.push(as_arith);
        }

        let circuit = order_gates_by_level(c);

        let mut inputs2 = HashMap::new();
        let mut inputs0 = HashMap::new();
        for (bits, &value) in bit_wires_per_value.iter().zip(values.iter()) {
            let bits_u32 = value as i32 as u32;
            for (i, &w) in bits.iter().enumerate() {
                inputs2.insert(w, Ring((bits_u32 >> i) & 1));
            }
        }
        // The always-one constant bits are the dealer-owned wires interspersed above;
        // collect them by walking the gate list for BoolInput{pid:0}.
        for gate in circuit.layers.iter().flatten() {
            if let crate::circuit::GateKind::BoolInput { pid: 0 } = gate.kind {
                inputs0.insert(gate.output.wires()[0], Ring(1));
            }
        }

        let outputs = run_offline_online(circuit, [inputs0, HashMap::new(), inputs2]).await.unwrap();

        let expected = [0u32, 1, 0, 0, 0];
        for (&w, &exp) in outputs_wires.iter().zip(expected.iter()) {
            assert_eq!(outputs[&w], Ring(exp));
        }
    }
}
