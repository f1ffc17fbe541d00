//! The online evaluator (spec §4.5).
//!
//! Parties 1 and 2 walk the level-ordered circuit layer by layer. Each layer
//! is one network round: a local phase stages masked values for every
//! interactive gate into one of two fixed-order buffers (`mul`, folding in
//! `ConvertB2A` and `GenCompaction`; `and`, folding in `EqualsZero`) plus
//! `shuffle` (folding in `DoubleShuffle`) and `reveal`; a transport phase
//! exchanges the concatenated buffer with the peer; an integrate phase walks
//! the layer a second time, finalising every interactive gate's output share
//! from the combined buffers and evaluating every non-interactive gate
//! locally — both passes in the same gate order, so a non-interactive gate
//! that consumes another same-layer gate's output always finds it already
//! written.
//!
//! Party 0 never runs this evaluator; it only supplies `dealer_learn_outputs`
//! to unblind the output vector P1 forwards it at the end.

use std::collections::HashMap;

use crate::circuit::{Gate, GateKind, GateOutput, LevelOrderedCircuit, OutputMode, WireId, WireKind};
use crate::error::{Error, Result};
use crate::net::{recv_ring_values, send_ring_values};
use crate::preprocessing::{GatePreproc, PreprocCircuit};
use crate::rand_gen_pool::RandGenPool;
use crate::ring::{BoolRing, Ring};
use crate::workers::WorkerPool;

use super::{PartyNetwork, Role};

/// `(id-1)*xy - x*b - y*a + c`: reconstructs one party's share of an
/// arithmetic Beaver product from the fully-opened masked values `x, y` and
/// this party's own triple share.
fn combine_mul(is_b: bool, x: Ring, y: Ring, a: Ring, b: Ring, c: Ring) -> Ring {
    let xy = if is_b { x.wrapping_mul(y) } else { Ring::ZERO };
    xy - x.wrapping_mul(b) - y.wrapping_mul(a) + c
}

/// Boolean counterpart of [`combine_mul`]: `&`/`^` in place of `*`/`-`/`+`.
fn combine_and(is_b: bool, x: Ring, y: Ring, a: Ring, b: Ring, c: Ring) -> Ring {
    let xy = if is_b { x & y } else { Ring::ZERO };
    xy ^ (x & b) ^ (y & a) ^ c
}

/// `GenCompaction`'s running prefix sums (spec §4.5), a pure function of this
/// party's share vector and role — recomputed in both the local and the
/// integrate phase rather than threaded across them.
fn compaction_prefixes(is_a: bool, v: &[Ring]) -> (Vec<Ring>, Vec<Ring>) {
    let n = v.len();
    let mut acc = Ring::ZERO;
    let mut s0 = vec![Ring::ZERO; n];
    for i in 0..n {
        let f0 = if is_a { Ring::ONE - v[i] } else { Ring::ZERO - v[i] };
        acc += f0;
        s0[i] = acc;
    }
    let mut s1_minus_s0 = vec![Ring::ZERO; n];
    for i in 0..n {
        acc += v[i];
        s1_minus_s0[i] = acc - s0[i];
    }
    (s0, s1_minus_s0)
}

fn scalar_out(output: &GateOutput) -> WireId {
    match output {
        GateOutput::Scalar(w) => *w,
        GateOutput::Vector(_) => unreachable!("scalar gate with vector output"),
    }
}

fn vector_out(output: &GateOutput) -> &[WireId] {
    match output {
        GateOutput::Vector(ws) => ws,
        GateOutput::Scalar(_) => unreachable!("vector gate with scalar output"),
    }
}

/// Drives one online party (1 or 2) through input-setting, the layered
/// protocol, and output reconstruction.
pub struct OnlineEvaluator<'a> {
    role: Role,
    rgen: RandGenPool,
    network: &'a PartyNetwork,
    store: crate::preprocessing::PreprocessingStore,
    output_mask: Option<Vec<Ring>>,
    wires: Vec<Ring>,
    pool: WorkerPool,
}

impl<'a> OnlineEvaluator<'a> {
    /// `threads` sizes the local worker pool used to parallelise masking a
    /// large `Shuffle`/`DoubleShuffle` input vector before the single
    /// network round (spec §5); it never introduces a network round or
    /// reorders gates within a layer.
    #[must_use]
    pub fn new(role: Role, rgen: RandGenPool, network: &'a PartyNetwork, preproc: PreprocCircuit, num_wires: usize, threads: usize) -> Self {
        OnlineEvaluator {
            role,
            rgen,
            network,
            store: preproc.store,
            output_mask: preproc.output_mask,
            wires: vec![Ring::ZERO; num_wires],
            pool: WorkerPool::new(threads),
        }
    }

    fn is_a(&self) -> bool {
        self.role == Role::OnlineA
    }

    fn is_b(&self) -> bool {
        self.role == Role::OnlineB
    }

    fn peer_pid(&self) -> u8 {
        match self.role {
            Role::OnlineA => 2,
            Role::OnlineB => 1,
            Role::Dealer => unreachable!("the dealer never runs the online evaluator"),
        }
    }

    /// Runs input-setting, every layer, then output reconstruction, per the
    /// `Constructed -> InputsSet -> EvaluatingLayer* -> OutputsReconstructed`
    /// state machine of spec §4.5. `inputs` supplies cleartext values for
    /// wires this party owns; ignored for wires owned by the peer or by the
    /// dealer.
    pub async fn run(&mut self, circuit: &LevelOrderedCircuit, inputs: &HashMap<WireId, Ring>) -> Result<HashMap<WireId, Ring>> {
        self.set_inputs(circuit, inputs)?;
        for layer in &circuit.layers {
            self.evaluate_layer(circuit, layer).await?;
        }
        self.reconstruct_outputs(circuit).await
    }

    /// `setInputs()`: wires owned by this party are masked with a fresh
    /// `p12` value and the cleartext subtracted off; wires owned by the peer
    /// take the same `p12` value directly (both parties draw the identical
    /// stream in lockstep, so no network round is needed); wires owned by
    /// the dealer take the share it shipped through the offline stream.
    fn set_inputs(&mut self, circuit: &LevelOrderedCircuit, inputs: &HashMap<WireId, Ring>) -> Result<()> {
        for gate in circuit.layers.iter().flatten() {
            match &gate.kind {
                GateKind::ArithInput { pid } if *pid == 0 => {
                    let GatePreproc::Input(share) = self.store.get(gate.id) else {
                        unreachable!("dealer-owned input without a shipped share")
                    };
                    self.wires[scalar_out(&gate.output)] = *share;
                }
                GateKind::ArithInput { pid } if *pid == self.role.pid() => {
                    let w = scalar_out(&gate.output);
                    let cleartext = inputs.get(&w).copied().unwrap_or(Ring::ZERO);
                    let mask = RandGenPool::next_ring(self.rgen.p12());
                    self.wires[w] = cleartext - mask;
                }
                GateKind::ArithInput { .. } => {
                    let mask = RandGenPool::next_ring(self.rgen.p12());
                    self.wires[scalar_out(&gate.output)] = mask;
                }
                GateKind::BoolInput { pid } if *pid == 0 => {
                    let GatePreproc::Input(share) = self.store.get(gate.id) else {
                        unreachable!("dealer-owned input without a shipped share")
                    };
                    self.wires[scalar_out(&gate.output)] = *share;
                }
                GateKind::BoolInput { pid } if *pid == self.role.pid() => {
                    let w = scalar_out(&gate.output);
                    let cleartext = inputs.get(&w).copied().unwrap_or(Ring::ZERO);
                    let mask = RandGenPool::next_bool(self.rgen.p12());
                    self.wires[w] = (BoolRing(cleartext.0 & 1 == 1) ^ mask).as_ring();
                }
                GateKind::BoolInput { .. } => {
                    let mask = RandGenPool::next_bool(self.rgen.p12());
                    self.wires[scalar_out(&gate.output)] = mask.as_ring();
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn evaluate_layer(&mut self, circuit: &LevelOrderedCircuit, layer: &[Gate]) -> Result<()> {
        let (mul, and, shuffle, reveal) = self.stage_layer(layer);
        let total = mul.len() + and.len() + shuffle.len() + reveal.len();

        let received = if total == 0 {
            Vec::new()
        } else {
            let mut to_send = Vec::with_capacity(total);
            to_send.extend_from_slice(&mul);
            to_send.extend_from_slice(&and);
            to_send.extend_from_slice(&shuffle);
            to_send.extend_from_slice(&reveal);
            let peer = self.network.peer(self.peer_pid());
            let (_, received) = tokio::try_join!(send_ring_values(peer, &to_send), recv_ring_values(peer, total))?;
            received
        };

        let (recv_mul, rest) = received.split_at(mul.len());
        let (recv_and, rest) = rest.split_at(and.len());
        let (recv_shuffle, recv_reveal) = rest.split_at(shuffle.len());

        self.integrate_layer(circuit, layer, &mul, recv_mul, &and, recv_and, recv_shuffle, &reveal, recv_reveal)
    }

    /// Phase 1: stage every interactive gate's masked send value. Reads only
    /// wires already finalised by a strictly earlier layer — an interactive
    /// gate's depth is always strictly greater than any same-layer
    /// producer's, so this never races the integrate phase below.
    fn stage_layer(&self, layer: &[Gate]) -> (Vec<Ring>, Vec<Ring>, Vec<Ring>, Vec<Ring>) {
        let mut mul = Vec::new();
        let mut and = Vec::new();
        let mut shuffle = Vec::new();
        let mut reveal = Vec::new();

        for gate in layer {
            match &gate.kind {
                GateKind::Mul => {
                    let GatePreproc::Mul(t) = self.store.get(gate.id) else { unreachable!() };
                    let x = self.wires[gate.inputs[0]];
                    let y = self.wires[gate.inputs[1]];
                    mul.push(x + t.a);
                    mul.push(y + t.b);
                }
                GateKind::ConvertB2A => {
                    let GatePreproc::ConvertB2A(t) = self.store.get(gate.id) else { unreachable!() };
                    let bit = self.wires[gate.inputs[0]] & Ring::ONE;
                    let (xa, yb) = if self.is_a() { (t.a + bit, t.b) } else { (t.a, t.b + bit) };
                    mul.push(xa);
                    mul.push(yb);
                }
                GateKind::And => {
                    let GatePreproc::And(t) = self.store.get(gate.id) else { unreachable!() };
                    let x = self.wires[gate.inputs[0]];
                    let y = self.wires[gate.inputs[1]];
                    and.push(t.a.as_ring() ^ x);
                    and.push(t.b.as_ring() ^ y);
                }
                GateKind::EqualsZero { level } => {
                    let GatePreproc::EqualsZero(triples) = self.store.get(gate.id) else { unreachable!() };
                    let width = gate.output.len();
                    for j in 0..width {
                        let mut in1 = self.wires[gate.inputs[j]];
                        let mut in2 = self.wires[gate.inputs[j + width]];
                        if *level == 0 && self.is_b() {
                            in1 = -in1;
                            in2 = -in2;
                        }
                        if self.is_a() {
                            in1 = !in1;
                            in2 = !in2;
                        }
                        and.push(triples[j].a.as_ring() ^ in1);
                        and.push(triples[j].b.as_ring() ^ in2);
                    }
                }
                GateKind::GenCompaction => {
                    let GatePreproc::GenCompaction(triples) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let v: Vec<Ring> = gate.inputs.iter().map(|&w| self.wires[w]).collect();
                    let (_, s1_minus_s0) = compaction_prefixes(self.is_a(), &v);
                    for i in 0..n {
                        mul.push(triples[i].a + v[i]);
                        mul.push(triples[i].b + s1_minus_s0[i]);
                    }
                }
                GateKind::Shuffle { reverse, .. } => {
                    let GatePreproc::Shuffle(r) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let perm = if *reverse { &r.perm_prime } else { &r.perm };
                    let indices: Vec<usize> = (0..n).collect();
                    let masked = self.pool.map_borrowed(&indices, |&j| (perm[j], self.wires[gate.inputs[j]] + r.mask_r[j]));
                    let mut to_send = vec![Ring::ZERO; n];
                    for (slot, value) in masked {
                        to_send[slot] = value;
                    }
                    shuffle.extend(to_send);
                }
                GateKind::DoubleShuffle { .. } => {
                    let GatePreproc::DoubleShuffle(r) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let indices: Vec<usize> = (0..n).collect();
                    let masked = self.pool.map_borrowed(&indices, |&j| (r.perm[j], self.wires[gate.inputs[j]] + r.mask_r[j]));
                    let mut to_send = vec![Ring::ZERO; n];
                    for (slot, value) in masked {
                        to_send[slot] = value;
                    }
                    shuffle.extend(to_send);
                }
                GateKind::Reveal => {
                    for &w in &gate.inputs {
                        reveal.push(self.wires[w]);
                    }
                }
                _ => {}
            }
        }

        (mul, and, shuffle, reveal)
    }

    /// Phase 3: one more pass in the same gate order, now finalising every
    /// interactive gate's output share from the combined buffers and
    /// evaluating every non-interactive gate directly.
    #[allow(clippy::too_many_arguments)]
    fn integrate_layer(
        &mut self,
        circuit: &LevelOrderedCircuit,
        layer: &[Gate],
        own_mul: &[Ring],
        recv_mul: &[Ring],
        own_and: &[Ring],
        recv_and: &[Ring],
        recv_shuffle: &[Ring],
        own_reveal: &[Ring],
        recv_reveal: &[Ring],
    ) -> Result<()> {
        let is_a = self.is_a();
        let is_b = self.is_b();
        let mut mul_idx = 0usize;
        let mut and_idx = 0usize;
        let mut shuffle_idx = 0usize;
        let mut reveal_idx = 0usize;

        for gate in layer {
            match &gate.kind {
                GateKind::ArithInput { .. } | GateKind::BoolInput { .. } => {}
                GateKind::Mul => {
                    let GatePreproc::Mul(t) = self.store.get(gate.id) else { unreachable!() };
                    let x = own_mul[mul_idx] + recv_mul[mul_idx];
                    let y = own_mul[mul_idx + 1] + recv_mul[mul_idx + 1];
                    mul_idx += 2;
                    self.wires[scalar_out(&gate.output)] = combine_mul(is_b, x, y, t.a, t.b, t.c);
                }
                GateKind::ConvertB2A => {
                    let GatePreproc::ConvertB2A(t) = self.store.get(gate.id) else { unreachable!() };
                    let x = own_mul[mul_idx] + recv_mul[mul_idx];
                    let y = own_mul[mul_idx + 1] + recv_mul[mul_idx + 1];
                    mul_idx += 2;
                    let m = combine_mul(is_b, x, y, t.a, t.b, t.c);
                    let original_bit = self.wires[gate.inputs[0]] & Ring::ONE;
                    self.wires[scalar_out(&gate.output)] = original_bit - (Ring(2).wrapping_mul(m));
                }
                GateKind::And => {
                    let GatePreproc::And(t) = self.store.get(gate.id) else { unreachable!() };
                    let x = own_and[and_idx] ^ recv_and[and_idx];
                    let y = own_and[and_idx + 1] ^ recv_and[and_idx + 1];
                    and_idx += 2;
                    self.wires[scalar_out(&gate.output)] = combine_and(is_b, x, y, t.a.as_ring(), t.b.as_ring(), t.c.as_ring());
                }
                GateKind::EqualsZero { level } => {
                    let GatePreproc::EqualsZero(triples) = self.store.get(gate.id) else { unreachable!() };
                    let width = gate.output.len();
                    let outs = vector_out(&gate.output);
                    for j in 0..width {
                        let x = own_and[and_idx] ^ recv_and[and_idx];
                        let y = own_and[and_idx + 1] ^ recv_and[and_idx + 1];
                        and_idx += 2;
                        let mut result = combine_and(is_b, x, y, triples[j].a.as_ring(), triples[j].b.as_ring(), triples[j].c.as_ring());
                        if is_a {
                            result = !result;
                        }
                        if *level == 4 {
                            result = (result << 31) >> 31;
                        }
                        self.wires[outs[j]] = result;
                    }
                }
                GateKind::GenCompaction => {
                    let GatePreproc::GenCompaction(triples) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let outs = vector_out(&gate.output);
                    let v: Vec<Ring> = gate.inputs.iter().map(|&w| self.wires[w]).collect();
                    let (s0, _) = compaction_prefixes(is_a, &v);
                    for i in 0..n {
                        let x = own_mul[mul_idx] + recv_mul[mul_idx];
                        let y = own_mul[mul_idx + 1] + recv_mul[mul_idx + 1];
                        mul_idx += 2;
                        let m = combine_mul(is_b, x, y, triples[i].a, triples[i].b, triples[i].c);
                        self.wires[outs[i]] = s0[i] + m;
                    }
                }
                GateKind::Shuffle { reverse, .. } => {
                    let GatePreproc::Shuffle(r) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let outs = vector_out(&gate.output);
                    let segment = &recv_shuffle[shuffle_idx..shuffle_idx + n];
                    if *reverse {
                        for j in 0..n {
                            self.wires[outs[j]] = segment[r.perm_prime[j]] - r.mask_b[j];
                        }
                    } else {
                        for j in 0..n {
                            self.wires[outs[r.perm[j]]] = segment[j] - r.mask_b[r.perm[j]];
                        }
                    }
                    shuffle_idx += n;
                }
                GateKind::DoubleShuffle { .. } => {
                    let GatePreproc::DoubleShuffle(r) = self.store.get(gate.id) else { unreachable!() };
                    let n = gate.output.len();
                    let outs = vector_out(&gate.output);
                    let segment = &recv_shuffle[shuffle_idx..shuffle_idx + n];
                    for j in 0..n {
                        self.wires[outs[r.perm[j]]] = segment[j] - r.mask_b[r.perm[j]];
                    }
                    shuffle_idx += n;
                }
                GateKind::Reveal => {
                    let n = gate.inputs.len();
                    let outs = vector_out(&gate.output);
                    let kind = circuit.kind_of(gate.inputs[0]);
                    for j in 0..n {
                        let mine = own_reveal[reveal_idx + j];
                        let theirs = recv_reveal[reveal_idx + j];
                        self.wires[outs[j]] = match kind {
                            WireKind::Arith => mine + theirs,
                            WireKind::Bool => mine ^ theirs,
                        };
                    }
                    reveal_idx += n;
                }
                GateKind::Add => {
                    self.wires[scalar_out(&gate.output)] = self.wires[gate.inputs[0]] + self.wires[gate.inputs[1]];
                }
                GateKind::Sub => {
                    self.wires[scalar_out(&gate.output)] = self.wires[gate.inputs[0]] - self.wires[gate.inputs[1]];
                }
                GateKind::Xor => {
                    self.wires[scalar_out(&gate.output)] = self.wires[gate.inputs[0]] ^ self.wires[gate.inputs[1]];
                }
                GateKind::ConstAdd(c) => {
                    let w = self.wires[gate.inputs[0]];
                    self.wires[scalar_out(&gate.output)] = if is_a { w + *c } else { w };
                }
                GateKind::ConstMul(c) => {
                    self.wires[scalar_out(&gate.output)] = self.wires[gate.inputs[0]].wrapping_mul(*c);
                }
                GateKind::Flip => {
                    let outs = vector_out(&gate.output);
                    for (j, &w) in gate.inputs.iter().enumerate() {
                        self.wires[outs[j]] = if is_a { Ring::ONE - self.wires[w] } else { Ring::ZERO - self.wires[w] };
                    }
                }
                GateKind::Compose => {
                    let mut out = self.wires[gate.inputs[0]];
                    for (j, &w) in gate.inputs.iter().enumerate().skip(1) {
                        out += self.wires[w] << (j as u32);
                    }
                    self.wires[scalar_out(&gate.output)] = out;
                }
                GateKind::Reorder => {
                    let outs = vector_out(&gate.output);
                    let n = gate.inputs.len();
                    let mut out = vec![Ring::ZERO; n];
                    for j in 0..n {
                        let idx = self.wires[gate.inputs2[j]].0 as usize;
                        out[idx - 1] = self.wires[gate.inputs[j]];
                    }
                    for (k, &w) in outs.iter().enumerate() {
                        self.wires[w] = out[k];
                    }
                }
                GateKind::ReorderInverse => {
                    let outs = vector_out(&gate.output);
                    let n = gate.inputs.len();
                    for j in 0..n {
                        let idx = self.wires[gate.inputs2[j]].0 as usize;
                        self.wires[outs[j]] = self.wires[gate.inputs[idx - 1]];
                    }
                }
                GateKind::AddConstToVec { c, n } => {
                    let outs = vector_out(&gate.output);
                    for (j, &w) in gate.inputs.iter().enumerate() {
                        let v = self.wires[w];
                        self.wires[outs[j]] = if j < *n && is_a { v + *c } else { v };
                    }
                }
                GateKind::AddVec => {
                    let outs = vector_out(&gate.output);
                    for j in 0..gate.inputs.len() {
                        self.wires[outs[j]] = self.wires[gate.inputs[j]] + self.wires[gate.inputs2[j]];
                    }
                }
                GateKind::PreparePropagate { n } => {
                    let outs = vector_out(&gate.output);
                    let len = gate.inputs.len();
                    self.wires[outs[0]] = self.wires[gate.inputs[0]];
                    for j in 1..len {
                        self.wires[outs[j]] = if j < *n {
                            self.wires[gate.inputs[j]] - self.wires[gate.inputs[j - 1]]
                        } else {
                            self.wires[gate.inputs[j]]
                        };
                    }
                }
                GateKind::Propagate => {
                    let outs = vector_out(&gate.output);
                    let mut accu = Ring::ZERO;
                    for j in 0..gate.inputs.len() {
                        accu += self.wires[gate.inputs[j]];
                        self.wires[outs[j]] = accu - self.wires[gate.inputs2[j]];
                    }
                }
                GateKind::PrepareGather => {
                    let outs = vector_out(&gate.output);
                    let mut accu = Ring::ZERO;
                    for j in 0..gate.inputs.len() {
                        accu += self.wires[gate.inputs[j]];
                        self.wires[outs[j]] = accu;
                    }
                }
                GateKind::Gather { n } => {
                    let outs = vector_out(&gate.output);
                    let mut accu = Ring::ZERO;
                    for j in 0..gate.inputs.len() {
                        self.wires[outs[j]] = if j < *n {
                            let v = self.wires[gate.inputs[j]] - accu;
                            accu += v;
                            v
                        } else {
                            Ring::ZERO
                        };
                    }
                }
                GateKind::Unsupported { name } => return Err(Error::UnsupportedGate(gate.id, name)),
            }
        }
        Ok(())
    }

    /// Exchanges full output share vectors with the peer once, then (party 1
    /// only) forwards a masked copy to the dealer (spec §4.5 "Output
    /// reconstruction").
    async fn reconstruct_outputs(&mut self, circuit: &LevelOrderedCircuit) -> Result<HashMap<WireId, Ring>> {
        let my_shares: Vec<Ring> = circuit.outputs.iter().map(|&(w, _)| self.wires[w]).collect();
        let peer = self.network.peer(self.peer_pid());
        let (_, their_shares) = tokio::try_join!(send_ring_values(peer, &my_shares), recv_ring_values(peer, my_shares.len()))?;

        let mut combined = Vec::with_capacity(circuit.outputs.len());
        let mut out = HashMap::with_capacity(circuit.outputs.len());
        for (i, &(w, mode)) in circuit.outputs.iter().enumerate() {
            let value = match mode {
                OutputMode::Arith => my_shares[i] + their_shares[i],
                OutputMode::Bool => my_shares[i] ^ their_shares[i],
            };
            combined.push(value);
            out.insert(w, value);
        }

        if self.is_a() {
            if let Some(mask) = &self.output_mask {
                let blinded: Vec<Ring> = combined
                    .iter()
                    .zip(mask.iter())
                    .zip(circuit.outputs.iter())
                    .map(|((&v, &m), &(_, mode))| match mode {
                        OutputMode::Arith => v + m,
                        OutputMode::Bool => v ^ m,
                    })
                    .collect();
                let dealer = self.network.peer(0);
                send_ring_values(dealer, &blinded).await?;
            }
        }

        Ok(out)
    }
}

/// The dealer's side of output reconstruction: receives party 1's blinded
/// output vector and unmasks it with the copy kept from the offline phase
/// (spec §4.5).
pub async fn dealer_learn_outputs(network: &PartyNetwork, circuit: &LevelOrderedCircuit, output_mask: &[Ring]) -> Result<HashMap<WireId, Ring>> {
    let p1 = network.peer(1);
    let blinded = recv_ring_values(p1, circuit.outputs.len()).await?;
    let mut out = HashMap::with_capacity(circuit.outputs.len());
    for (i, &(w, mode)) in circuit.outputs.iter().enumerate() {
        let value = match mode {
            OutputMode::Arith => blinded[i] - output_mask[i],
            OutputMode::Bool => blinded[i] ^ output_mask[i],
        };
        out.insert(w, value);
    }
    Ok(out)
}
