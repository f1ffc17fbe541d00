//! The offline/preprocessing evaluator (spec §4.4).
//!
//! The dealer (party 0) walks the circuit once, generating every
//! correlation the online layer will need and batching the online parties'
//! halves into one length-prefixed stream per peer. Parties 1 and 2 walk the
//! same circuit, independently re-deriving whichever half of each
//! correlation their own pairwise PRG stream already determines, then
//! consume the dealer's stream — in lockstep gate order — for the half only
//! the dealer could have produced.
//!
//! Resolved ambiguity (recorded in `DESIGN.md`): rather than the distilled
//! spec's six-counter dealer header, the dealer ships one `u64`-prefixed
//! stream per peer. Both sides walk the identical layered circuit, so no
//! further per-item framing is needed to know how many ring elements each
//! gate consumes.

use std::collections::HashMap;

use crate::circuit::{GateKind, LevelOrderedCircuit, WireId};
use crate::error::{Error, Result};
use crate::net::{recv_ring_values, send_ring_values, Channel};
use crate::perm::{compose, random_permutation};
use crate::preprocessing::{ArithTriple, BoolTriple, GatePreproc, ShuffleCache, ShuffleRecord};
use crate::preprocessing::PreprocessingStore;
use crate::rand_gen_pool::RandGenPool;
use crate::ring::{BoolRing, Ring};

use super::{PartyNetwork, Role};

/// What a patched online-party record still needs after the network
/// receive, recorded in the same order the first pass produced them.
enum PatchSlot {
    Arith(usize),
    Bool(usize),
    ArithVec(usize, usize),
    BoolVec(usize, usize),
    /// A dealer-owned input's share, consumed in the same stream position
    /// the dealer produced it in (spec §4.4 `Input`).
    Input(usize),
    /// Party 1's shuffle patch: just its `mask_b` (`n` elements), every
    /// invocation.
    ShuffleMaskB { gate: usize, n: usize },
    /// Party 2's shuffle patch: `perm_prime` (`n` elements, first use only)
    /// then `mask_b` (`n` elements), every invocation.
    ShuffleP2 { gate: usize, pair_id: u32, first_use: bool, n: usize },
    DoubleShuffleMaskB { gate: usize, n: usize },
    DoubleShuffleP2 { gate: usize, new_id: u32, first_use: bool, n: usize },
}

/// Walks a [`LevelOrderedCircuit`] once, generating (dealer) or completing
/// (online parties) every interactive gate's preprocessing record.
pub struct OfflineEvaluator<'a> {
    role: Role,
    rgen: RandGenPool,
    network: &'a PartyNetwork,
    /// Dealer-only: the four permutations backing every shuffle/double-shuffle id.
    shuffle_cache: ShuffleCache,
    /// Online-party-only: this party's own half of the permutation pair for
    /// each shuffle/double-shuffle id — `(perm, perm_prime)`, the second
    /// populated lazily once the dealer's first-use shipment arrives.
    party_perm_cache: HashMap<u32, (Vec<usize>, Option<Vec<usize>>)>,
}

impl<'a> OfflineEvaluator<'a> {
    #[must_use]
    pub fn new(role: Role, rgen: RandGenPool, network: &'a PartyNetwork) -> Self {
        OfflineEvaluator {
            role,
            rgen,
            network,
            shuffle_cache: ShuffleCache::new(),
            party_perm_cache: HashMap::new(),
        }
    }

    /// Runs the full offline phase. `dealer_inputs` supplies cleartext
    /// values for wires owned by party 0 (the only case where an input's
    /// owner cannot derive its share from `p12` alone, since the dealer
    /// never runs an online round); it is ignored by online parties.
    pub async fn run(mut self, circuit: &LevelOrderedCircuit, dealer_inputs: &HashMap<WireId, Ring>) -> Result<crate::preprocessing::PreprocCircuit> {
        match self.role {
            Role::Dealer => {
                let output_mask = self.run_dealer(circuit, dealer_inputs).await?;
                Ok(crate::preprocessing::PreprocCircuit {
                    store: PreprocessingStore::with_capacity(0),
                    output_mask: Some(output_mask),
                })
            }
            Role::OnlineA | Role::OnlineB => {
                let (store, output_mask) = self.run_online(circuit).await?;
                Ok(crate::preprocessing::PreprocCircuit { store, output_mask })
            }
        }
    }

    fn dealer_arith_residual(&mut self) -> (Ring, Ring) {
        let a1 = RandGenPool::next_ring(self.rgen.p01());
        let b1 = RandGenPool::next_ring(self.rgen.p01());
        let a2 = RandGenPool::next_ring(self.rgen.p02());
        let b2 = RandGenPool::next_ring(self.rgen.p02());
        let c = (a1 + a2).wrapping_mul(b1 + b2);
        let c1 = RandGenPool::next_ring(self.rgen.self_stream());
        (c1, c - c1)
    }

    fn dealer_bool_residual(&mut self) -> (BoolRing, BoolRing) {
        let a1 = RandGenPool::next_bool(self.rgen.p01());
        let b1 = RandGenPool::next_bool(self.rgen.p01());
        let a2 = RandGenPool::next_bool(self.rgen.p02());
        let b2 = RandGenPool::next_bool(self.rgen.p02());
        let c = (a1 ^ a2) & (b1 ^ b2);
        let c1 = RandGenPool::next_bool(self.rgen.self_stream());
        (c1, c ^ c1)
    }

    fn online_arith_half(&mut self) -> (Ring, Ring) {
        match self.role {
            Role::OnlineA => (RandGenPool::next_ring(self.rgen.p01()), RandGenPool::next_ring(self.rgen.p01())),
            Role::OnlineB => (RandGenPool::next_ring(self.rgen.p02()), RandGenPool::next_ring(self.rgen.p02())),
            Role::Dealer => unreachable!("dealer never evaluates its own online half"),
        }
    }

    fn online_bool_half(&mut self) -> (BoolRing, BoolRing) {
        match self.role {
            Role::OnlineA => (RandGenPool::next_bool(self.rgen.p01()), RandGenPool::next_bool(self.rgen.p01())),
            Role::OnlineB => (RandGenPool::next_bool(self.rgen.p02()), RandGenPool::next_bool(self.rgen.p02())),
            Role::Dealer => unreachable!("dealer never evaluates its own online half"),
        }
    }

    /// `B0`/`B1` from `R0`, `R1`, a fresh randomizer and the composed
    /// permutation, forward or reverse (spec §4.4).
    fn dealer_shuffle_masks(&mut self, composed: &[usize], n: usize, reverse: bool) -> (Vec<Ring>, Vec<Ring>) {
        let r0: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p01())).collect();
        let r1: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p02())).collect();
        let r: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.self_stream())).collect();
        let mut b0 = vec![Ring::ZERO; n];
        let mut b1 = vec![Ring::ZERO; n];
        for j in 0..n {
            if reverse {
                b0[j] = r0[composed[j]] - r[j];
                b1[j] = r1[composed[j]] + r[j];
            } else {
                b0[composed[j]] = r0[j] - r[j];
                b1[composed[j]] = r1[j] + r[j];
            }
        }
        (b0, b1)
    }

    async fn run_dealer(&mut self, circuit: &LevelOrderedCircuit, dealer_inputs: &HashMap<WireId, Ring>) -> Result<Vec<Ring>> {
        let mut to_p1: Vec<Ring> = Vec::new();
        let mut to_p2: Vec<Ring> = Vec::new();

        for gate in circuit.layers.iter().flatten() {
            match &gate.kind {
                GateKind::ArithInput { pid } if *pid == 0 => {
                    let wire = gate.output.wires()[0];
                    let value = dealer_inputs.get(&wire).copied().unwrap_or(Ring::ZERO);
                    let r1 = RandGenPool::next_ring(self.rgen.self_stream());
                    to_p1.push(r1);
                    to_p2.push(value - r1);
                }
                GateKind::BoolInput { pid } if *pid == 0 => {
                    let wire = gate.output.wires()[0];
                    let value = dealer_inputs.get(&wire).copied().unwrap_or(Ring::ZERO);
                    let r1 = RandGenPool::next_bool(self.rgen.self_stream());
                    to_p1.push(r1.as_ring());
                    to_p2.push((BoolRing(value.0 & 1 == 1) ^ r1).as_ring());
                }
                GateKind::ArithInput { .. } | GateKind::BoolInput { .. } => {}
                GateKind::Mul | GateKind::ConvertB2A => {
                    let (c1, c2) = self.dealer_arith_residual();
                    to_p1.push(c1);
                    to_p2.push(c2);
                }
                GateKind::And => {
                    let (c1, c2) = self.dealer_bool_residual();
                    to_p1.push(c1.as_ring());
                    to_p2.push(c2.as_ring());
                }
                GateKind::EqualsZero { .. } => {
                    for _ in 0..gate.output.len() {
                        let (c1, c2) = self.dealer_bool_residual();
                        to_p1.push(c1.as_ring());
                        to_p2.push(c2.as_ring());
                    }
                }
                GateKind::GenCompaction => {
                    for _ in 0..gate.output.len() {
                        let (c1, c2) = self.dealer_arith_residual();
                        to_p1.push(c1);
                        to_p2.push(c2);
                    }
                }
                GateKind::Shuffle { pair_id, reverse } => {
                    let n = gate.output.len();
                    let first_use = self.shuffle_cache.get(*pair_id).is_none();
                    let bundle = self.shuffle_cache.get_or_create(*pair_id, n, &mut self.rgen).clone();
                    if first_use {
                        for &idx in &bundle.pi1_prime {
                            to_p2.push(Ring(idx as u32));
                        }
                    }
                    let composed = compose(&bundle.pi0, &bundle.pi1);
                    let (b0, b1) = self.dealer_shuffle_masks(&composed, n, *reverse);
                    to_p1.extend(b0);
                    to_p2.extend(b1);
                }
                GateKind::DoubleShuffle { new_id, src_id, dst_id } => {
                    let n = gate.output.len();
                    let first_use = self.shuffle_cache.get(*new_id).is_none();
                    let bundle = self.shuffle_cache.materialise_double(*new_id, *src_id, *dst_id, n, &mut self.rgen)?.clone();
                    if first_use {
                        for &idx in &bundle.pi1 {
                            to_p2.push(Ring(idx as u32));
                        }
                        for &idx in &bundle.pi1_prime {
                            to_p2.push(Ring(idx as u32));
                        }
                    }
                    let composed = compose(&bundle.pi0, &bundle.pi1);
                    let (b0, b1) = self.dealer_shuffle_masks(&composed, n, false);
                    to_p1.extend(b0);
                    to_p2.extend(b1);
                }
                _ => {}
            }
        }

        // A fresh mask per output wire, sampled only from the dealer's own
        // stream: shipped to P1 so it can blind the final reconstructed
        // output vector before forwarding it to the dealer, and kept here
        // so the dealer's online phase can unblind it (spec §4.5).
        let output_mask: Vec<Ring> = (0..circuit.outputs.len()).map(|_| RandGenPool::next_ring(self.rgen.self_stream())).collect();
        to_p1.extend(output_mask.iter().copied());

        let p1 = self.network.peer(1);
        p1.send(&(to_p1.len() as u64).to_le_bytes()).await?;
        send_ring_values(p1, &to_p1).await?;

        let p2 = self.network.peer(2);
        p2.send(&(to_p2.len() as u64).to_le_bytes()).await?;
        send_ring_values(p2, &to_p2).await?;
        Ok(output_mask)
    }

    async fn run_online(&mut self, circuit: &LevelOrderedCircuit) -> Result<(PreprocessingStore, Option<Vec<Ring>>)> {
        let mut store = PreprocessingStore::with_capacity(circuit.num_gates);
        let mut patches: Vec<PatchSlot> = Vec::new();

        for gate in circuit.layers.iter().flatten() {
            match &gate.kind {
                GateKind::ArithInput { pid } | GateKind::BoolInput { pid } if *pid == 0 => {
                    patches.push(PatchSlot::Input(gate.id));
                }
                GateKind::ArithInput { .. } | GateKind::BoolInput { .. } => {}
                GateKind::Mul => {
                    let (a, b) = self.online_arith_half();
                    store.set(gate.id, GatePreproc::Mul(ArithTriple { a, b, c: Ring::ZERO }));
                    patches.push(PatchSlot::Arith(gate.id));
                }
                GateKind::ConvertB2A => {
                    let (a, b) = self.online_arith_half();
                    store.set(gate.id, GatePreproc::ConvertB2A(ArithTriple { a, b, c: Ring::ZERO }));
                    patches.push(PatchSlot::Arith(gate.id));
                }
                GateKind::And => {
                    let (a, b) = self.online_bool_half();
                    store.set(gate.id, GatePreproc::And(BoolTriple { a, b, c: BoolRing::ZERO }));
                    patches.push(PatchSlot::Bool(gate.id));
                }
                GateKind::EqualsZero { .. } => {
                    let width = gate.output.len();
                    let triples = (0..width)
                        .map(|_| {
                            let (a, b) = self.online_bool_half();
                            BoolTriple { a, b, c: BoolRing::ZERO }
                        })
                        .collect();
                    store.set(gate.id, GatePreproc::EqualsZero(triples));
                    patches.push(PatchSlot::BoolVec(gate.id, width));
                }
                GateKind::GenCompaction => {
                    let n = gate.output.len();
                    let triples = (0..n)
                        .map(|_| {
                            let (a, b) = self.online_arith_half();
                            ArithTriple { a, b, c: Ring::ZERO }
                        })
                        .collect();
                    store.set(gate.id, GatePreproc::GenCompaction(triples));
                    patches.push(PatchSlot::ArithVec(gate.id, n));
                }
                GateKind::Shuffle { pair_id, .. } => {
                    let n = gate.output.len();
                    match self.role {
                        Role::OnlineA => {
                            if !self.party_perm_cache.contains_key(pair_id) {
                                let p0 = random_permutation(n, self.rgen.p01());
                                let p0_prime = random_permutation(n, self.rgen.p01());
                                self.party_perm_cache.insert(*pair_id, (p0, Some(p0_prime)));
                            }
                            let (perm, perm_prime) = self.party_perm_cache.get(pair_id).unwrap().clone();
                            let mask_r: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p01())).collect();
                            store.set(
                                gate.id,
                                GatePreproc::Shuffle(ShuffleRecord { perm, perm_prime: perm_prime.unwrap(), mask_r, mask_b: Vec::new() }),
                            );
                            patches.push(PatchSlot::ShuffleMaskB { gate: gate.id, n });
                        }
                        Role::OnlineB => {
                            let first_use = !self.party_perm_cache.contains_key(pair_id);
                            if first_use {
                                let p1 = random_permutation(n, self.rgen.p02());
                                self.party_perm_cache.insert(*pair_id, (p1, None));
                            }
                            let perm = self.party_perm_cache.get(pair_id).unwrap().0.clone();
                            let mask_r: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p02())).collect();
                            store.set(
                                gate.id,
                                GatePreproc::Shuffle(ShuffleRecord { perm, perm_prime: Vec::new(), mask_r, mask_b: Vec::new() }),
                            );
                            patches.push(PatchSlot::ShuffleP2 { gate: gate.id, pair_id: *pair_id, first_use, n });
                        }
                        Role::Dealer => unreachable!(),
                    }
                }
                GateKind::DoubleShuffle { new_id, .. } => {
                    let n = gate.output.len();
                    match self.role {
                        Role::OnlineA => {
                            if !self.party_perm_cache.contains_key(new_id) {
                                let p0 = random_permutation(n, self.rgen.p01());
                                let p0_prime = random_permutation(n, self.rgen.p01());
                                self.party_perm_cache.insert(*new_id, (p0, Some(p0_prime)));
                            }
                            let (perm, perm_prime) = self.party_perm_cache.get(new_id).unwrap().clone();
                            let mask_r: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p01())).collect();
                            store.set(
                                gate.id,
                                GatePreproc::DoubleShuffle(ShuffleRecord { perm, perm_prime: perm_prime.unwrap(), mask_r, mask_b: Vec::new() }),
                            );
                            patches.push(PatchSlot::DoubleShuffleMaskB { gate: gate.id, n });
                        }
                        Role::OnlineB => {
                            let first_use = !self.party_perm_cache.contains_key(new_id);
                            if first_use {
                                // Placeholder until the dealer's shipment arrives in pass 2.
                                self.party_perm_cache.insert(*new_id, (Vec::new(), None));
                            }
                            let mask_r: Vec<Ring> = (0..n).map(|_| RandGenPool::next_ring(self.rgen.p02())).collect();
                            store.set(
                                gate.id,
                                GatePreproc::DoubleShuffle(ShuffleRecord { perm: Vec::new(), perm_prime: Vec::new(), mask_r, mask_b: Vec::new() }),
                            );
                            patches.push(PatchSlot::DoubleShuffleP2 { gate: gate.id, new_id: *new_id, first_use, n });
                        }
                        Role::Dealer => unreachable!(),
                    }
                }
                _ => {}
            }
        }

        let dealer = self.network.peer(0);
        let len_bytes = dealer.recv(8).await?;
        let len = u64::from_le_bytes(len_bytes.try_into().map_err(|_| Error::Transport("malformed length header".into()))?) as usize;
        let received = recv_ring_values(dealer, len).await?;
        let mut cursor = received.into_iter();
        let mut next = || cursor.next().ok_or_else(|| Error::Transport("dealer stream exhausted early".into()));

        for patch in patches {
            match patch {
                PatchSlot::Arith(gate_id) => {
                    let c = next()?;
                    match store.get_mut(gate_id) {
                        GatePreproc::Mul(t) | GatePreproc::ConvertB2A(t) => t.c = c,
                        _ => unreachable!(),
                    }
                }
                PatchSlot::Input(gate_id) => {
                    let share = next()?;
                    store.set(gate_id, GatePreproc::Input(share));
                }
                PatchSlot::Bool(gate_id) => {
                    let c = next()?;
                    if let GatePreproc::And(t) = store.get_mut(gate_id) {
                        t.c = BoolRing(c.0 & 1 == 1);
                    }
                }
                PatchSlot::BoolVec(gate_id, width) => {
                    if let GatePreproc::EqualsZero(v) = store.get_mut(gate_id) {
                        for t in v.iter_mut().take(width) {
                            let c = next()?;
                            t.c = BoolRing(c.0 & 1 == 1);
                        }
                    }
                }
                PatchSlot::ArithVec(gate_id, n) => {
                    if let GatePreproc::GenCompaction(v) = store.get_mut(gate_id) {
                        for t in v.iter_mut().take(n) {
                            t.c = next()?;
                        }
                    }
                }
                PatchSlot::ShuffleMaskB { gate, n } => {
                    let mut mask_b = Vec::with_capacity(n);
                    for _ in 0..n {
                        mask_b.push(next()?);
                    }
                    if let GatePreproc::Shuffle(r) = store.get_mut(gate) {
                        r.mask_b = mask_b;
                    }
                }
                PatchSlot::ShuffleP2 { gate, pair_id, first_use, n } => {
                    if first_use {
                        let mut perm_prime = Vec::with_capacity(n);
                        for _ in 0..n {
                            perm_prime.push(next()?.0 as usize);
                        }
                        self.party_perm_cache.get_mut(&pair_id).unwrap().1 = Some(perm_prime);
                    }
                    let perm_prime = self.party_perm_cache.get(&pair_id).unwrap().1.clone().unwrap();
                    let mut mask_b = Vec::with_capacity(n);
                    for _ in 0..n {
                        mask_b.push(next()?);
                    }
                    if let GatePreproc::Shuffle(r) = store.get_mut(gate) {
                        r.perm_prime = perm_prime;
                        r.mask_b = mask_b;
                    }
                }
                PatchSlot::DoubleShuffleMaskB { gate, n } => {
                    let mut mask_b = Vec::with_capacity(n);
                    for _ in 0..n {
                        mask_b.push(next()?);
                    }
                    if let GatePreproc::DoubleShuffle(r) = store.get_mut(gate) {
                        r.mask_b = mask_b;
                    }
                }
                PatchSlot::DoubleShuffleP2 { gate, new_id, first_use, n } => {
                    if first_use {
                        let mut perm = Vec::with_capacity(n);
                        for _ in 0..n {
                            perm.push(next()?.0 as usize);
                        }
                        let mut perm_prime = Vec::with_capacity(n);
                        for _ in 0..n {
                            perm_prime.push(next()?.0 as usize);
                        }
                        self.party_perm_cache.insert(new_id, (perm, Some(perm_prime)));
                    }
                    let (perm, perm_prime) = self.party_perm_cache.get(&new_id).unwrap().clone();
                    let mut mask_b = Vec::with_capacity(n);
                    for _ in 0..n {
                        mask_b.push(next()?);
                    }
                    if let GatePreproc::DoubleShuffle(r) = store.get_mut(gate) {
                        r.perm = perm;
                        r.perm_prime = perm_prime.unwrap();
                        r.mask_b = mask_b;
                    }
                }
            }
        }

        // Only the dealer's `to_p1` stream carries a trailing output mask
        // (spec §4.5): party 1 reads it here and forwards it to the online
        // evaluator so it can blind the reconstructed output vector before
        // shipping it back to the dealer; party 2 has nothing further to read.
        let output_mask = match self.role {
            Role::OnlineA => {
                let mut mask = Vec::with_capacity(circuit.outputs.len());
                for _ in 0..circuit.outputs.len() {
                    mask.push(next()?);
                }
                Some(mask)
            }
            Role::OnlineB => None,
            Role::Dealer => unreachable!(),
        };

        Ok((store, output_mask))
    }
}
