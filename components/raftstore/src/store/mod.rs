// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

pub mod codec;
pub mod entry_cache;
pub mod entry_context;
pub mod invoke_context;
pub mod meta;
pub mod peer_storage;
pub mod ready_context;

pub use entry_cache::EntryCache;
pub use invoke_context::{commit_ready, InvokeContext};
pub use meta::{RaftApplyState, RaftLocalState, RaftTruncatedState};
pub use peer_storage::PeerStorage;
pub use ready_context::{ReadyContext, SimpleReadyContext};

use raft::eraftpb::ConfState;

/// A region's current peer membership, the minimal slice of region
/// metadata this crate needs (region identity plus the voters/learners a
/// `ConfState` is built from). Region bootstrap, splitting, and the full
/// region descriptor otherwise live outside this crate's scope (§1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub id: u64,
    pub peers: Vec<Peer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peer {
    pub id: u64,
    pub is_learner: bool,
}

impl Region {
    /// I5: a region is initialized iff it has at least one assigned peer.
    pub fn is_initialized(&self) -> bool {
        !self.peers.is_empty()
    }

    pub fn conf_state(&self) -> ConfState {
        let mut cs = ConfState::default();
        let mut voters = Vec::new();
        let mut learners = Vec::new();
        for p in &self.peers {
            if p.is_learner {
                learners.push(p.id);
            } else {
                voters.push(p.id);
            }
        }
        cs.set_voters(voters);
        cs.set_learners(learners);
        cs
    }
}
