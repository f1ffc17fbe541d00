//! The offline (preprocessing) and online evaluators, and the `Role`/
//! `PartyNetwork` glue between them and the transport layer.

pub mod offline;
pub mod online;

use std::collections::HashMap;

use crate::net::Channel;

/// The three parties' roles, per `SPEC_FULL.md` §9 design note: an explicit
/// enum instead of branching on a numeric `pid`, eliminating ambiguous third
/// cases in the dealer's logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Party 0: runs only the offline phase, never holds online shares.
    Dealer,
    /// Party 1: one of the two online evaluators.
    OnlineA,
    /// Party 2: the other online evaluator.
    OnlineB,
}

impl Role {
    #[must_use]
    pub fn from_pid(pid: u8) -> Self {
        match pid {
            0 => Role::Dealer,
            1 => Role::OnlineA,
            2 => Role::OnlineB,
            _ => panic!("party id must be 0, 1 or 2, got {pid}"),
        }
    }

    #[must_use]
    pub fn pid(self) -> u8 {
        match self {
            Role::Dealer => 0,
            Role::OnlineA => 1,
            Role::OnlineB => 2,
        }
    }
}

/// This party's pairwise channels, keyed by peer party id. Every party
/// maintains exactly two such channels (one per peer); which two peers
/// matter for a given phase depends on `Role` (the dealer only exchanges
/// with the two online parties, never directly with "itself").
pub struct PartyNetwork {
    channels: HashMap<u8, Box<dyn Channel>>,
}

impl PartyNetwork {
    #[must_use]
    pub fn new(channels: HashMap<u8, Box<dyn Channel>>) -> Self {
        PartyNetwork { channels }
    }

    #[must_use]
    pub fn peer(&self, pid: u8) -> &dyn Channel {
        self.channels
            .get(&pid)
            .unwrap_or_else(|| panic!("no channel configured to peer {pid}"))
            .as_ref()
    }
}
