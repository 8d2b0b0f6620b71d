// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! `RaftLocalState`/`RaftApplyState` record shapes (§3) plus `MetaLifecycle`
//! (§4.5): hydrating them on `PeerStorage` construction and erasing them on
//! region removal.

use engine_traits::{keys, Iterable, KvEngine, Mutable, Peekable, WriteBatch};
use raft::eraftpb::HardState;
use serde::{Deserialize, Serialize};
use tikv_util::info;

use super::codec;
use crate::errors::Result;
use crate::store::Region;

/// RAFT_INIT_LOG_INDEX/TERM: the non-zero values a freshly created,
/// initialized region starts from (§3, "Bootstrap constants"). Forces any
/// follower that joins later to synchronize via snapshot instead of
/// replaying a log that never existed.
pub const RAFT_INIT_LOG_INDEX: u64 = 5;
pub const RAFT_INIT_LOG_TERM: u64 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftLocalState {
    pub last_index: u64,
    pub term: u64,
    pub vote: u64,
    pub commit: u64,
}

impl RaftLocalState {
    pub fn hard_state(&self) -> HardState {
        let mut hs = HardState::default();
        hs.set_term(self.term);
        hs.set_vote(self.vote);
        hs.set_commit(self.commit);
        hs
    }

    pub fn set_hard_state(&mut self, hs: &HardState) {
        self.term = hs.get_term();
        self.vote = hs.get_vote();
        self.commit = hs.get_commit();
    }

    /// I5: an uninitialized region must have a zero hard state.
    pub fn is_empty_hard_state(&self) -> bool {
        self.term == 0 && self.vote == 0 && self.commit == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftTruncatedState {
    pub index: u64,
    pub term: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftApplyState {
    pub applied_index: u64,
    pub truncated_state: RaftTruncatedState,
}

/// Load or synthesize `RaftLocalState` for `region` (§4.5, step 1). If the
/// region has peers but no persisted state, bootstrap state is synthesized
/// and persisted immediately (unlike apply state, whose synthesis is
/// deferred to the first apply).
pub fn init_raft_state<E: KvEngine>(raft_engine: &E, region: &Region) -> Result<RaftLocalState> {
    let key = keys::raft_state_key(region.id);
    if let Some(bytes) = raft_engine.get_value(&key)? {
        return Ok(codec::decode(&bytes)?);
    }
    if !region.peers.is_empty() {
        let state = RaftLocalState {
            last_index: RAFT_INIT_LOG_INDEX,
            term: RAFT_INIT_LOG_TERM,
            vote: 0,
            commit: RAFT_INIT_LOG_INDEX,
        };
        let mut wb = raft_engine.write_batch();
        wb.put(&key, &codec::encode(&state)?)?;
        raft_engine.write(wb, false)?;
        info!("synthesized initial raft state"; "region_id" => region.id);
        return Ok(state);
    }
    Ok(RaftLocalState::default())
}

/// Load or synthesize `RaftApplyState` for `region` (§4.5, step 2). The
/// synthesized value for a freshly initialized region is *not* persisted
/// here; the first `apply` will.
pub fn init_apply_state<E: KvEngine>(kv_engine: &E, region: &Region) -> Result<RaftApplyState> {
    let key = keys::apply_state_key(region.id);
    if let Some(bytes) = kv_engine.get_value(&key)? {
        return Ok(codec::decode(&bytes)?);
    }
    if region.is_initialized() {
        return Ok(RaftApplyState {
            applied_index: RAFT_INIT_LOG_INDEX,
            truncated_state: RaftTruncatedState {
                index: RAFT_INIT_LOG_INDEX,
                term: RAFT_INIT_LOG_TERM,
            },
        });
    }
    Ok(RaftApplyState::default())
}

/// Compute `lastTerm` for a freshly hydrated `PeerStorage` (§4.5, step 4).
pub fn init_last_term<E: KvEngine>(
    raft_engine: &E,
    region: &Region,
    raft_state: &RaftLocalState,
    apply_state: &RaftApplyState,
) -> Result<u64> {
    let last_index = raft_state.last_index;
    if last_index == 0 {
        return Ok(0);
    }
    if last_index == RAFT_INIT_LOG_INDEX {
        return Ok(RAFT_INIT_LOG_TERM);
    }
    if last_index == apply_state.truncated_state.index {
        return Ok(apply_state.truncated_state.term);
    }
    let key = keys::raft_log_key(region.id, last_index);
    match raft_engine.get_msg::<raft::eraftpb::Entry>(&key)? {
        Some(entry) => Ok(entry.get_term()),
        None => panic!(
            "region {} at index {} doesn't exist in the raft engine, may lost data",
            region.id, last_index
        ),
    }
}

/// `(raft_state, apply_state, last_term)` for a newly constructed
/// `PeerStorage`, wired together the way §4.5 prescribes (step 3's
/// assertion included).
pub fn init<E: KvEngine>(
    raft_engine: &E,
    kv_engine: &E,
    region: &Region,
) -> Result<(RaftLocalState, RaftApplyState, u64)> {
    let raft_state = init_raft_state(raft_engine, region)?;
    let apply_state = init_apply_state(kv_engine, region)?;
    assert!(
        raft_state.last_index >= apply_state.applied_index,
        "region {} last_index {} less than applied_index {}",
        region.id,
        raft_state.last_index,
        apply_state.applied_index
    );
    let last_term = init_last_term(raft_engine, region, &raft_state, &apply_state)?;
    Ok((raft_state, apply_state, last_term))
}

/// Erase all traces of `region` from both engines into the caller-supplied
/// batches (§4.5, "Clearing"). Neither batch is committed here; composing
/// them into a larger transaction and committing is the caller's job.
pub fn clear_meta<E: KvEngine>(
    raft_engine: &E,
    region_id: u64,
    last_index: u64,
    raft_batch: &mut E::WriteBatch,
    kv_batch: &mut E::WriteBatch,
) -> Result<()> {
    kv_batch.delete(&keys::region_state_key(region_id))?;
    kv_batch.delete(&keys::apply_state_key(region_id))?;

    // Physical log compaction may already have removed a prefix; find the
    // actual first present index instead of assuming it's 1. The end bound
    // guards against a seek landing on a different region's key: only a key
    // strictly below this region's own `last_index + 1` boundary can be one
    // of our own log entries.
    let prefix = keys::raft_log_prefix(region_id);
    let end = keys::raft_log_key(region_id, last_index + 1);
    let first_present = match raft_engine.seek(&prefix)? {
        Some((key, _)) if key < end => keys::raft_log_index(&key)?,
        _ => last_index + 1,
    };
    for index in first_present..=last_index {
        raft_batch.delete(&keys::raft_log_key(region_id, index))?;
    }
    raft_batch.delete(&keys::raft_state_key(region_id))?;
    info!("cleared region meta"; "region_id" => region_id, "last_index" => last_index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_testutils::MemEngine;
    use raft::eraftpb::Entry;

    fn put_entry(engine: &MemEngine, region_id: u64, index: u64) {
        let mut wb = engine.write_batch();
        let mut entry = Entry::default();
        entry.set_index(index);
        entry.set_term(1);
        wb.put_msg(&keys::raft_log_key(region_id, index), &entry).unwrap();
        engine.write(wb, false).unwrap();
    }

    #[test]
    fn clear_meta_deletes_only_entries_present() {
        let raft_engine = MemEngine::new();
        for i in 3..=5 {
            put_entry(&raft_engine, 1, i);
        }
        let mut raft_wb = raft_engine.write_batch();
        let mut kv_wb = raft_engine.write_batch();
        clear_meta(&raft_engine, 1, 5, &mut raft_wb, &mut kv_wb).unwrap();
        raft_engine.write(raft_wb, false).unwrap();
        assert!(raft_engine.get_value(&keys::raft_log_key(1, 3)).unwrap().is_none());
        assert!(raft_engine.get_value(&keys::raft_log_key(1, 4)).unwrap().is_none());
        assert!(raft_engine.get_value(&keys::raft_log_key(1, 5)).unwrap().is_none());
    }

    /// When `region_id`'s own log is empty (e.g. never logged beyond the
    /// synthetic bootstrap state), a seek from its prefix can land on a
    /// different, higher-numbered region's first log key. That key must
    /// never be mistaken for one of this region's own entries merely
    /// because its trailing 8 bytes happen to decode to an in-range index.
    #[test]
    fn clear_meta_does_not_cross_into_a_different_region() {
        let raft_engine = MemEngine::new();
        // Region 1 has no log entries at all; region 2 does.
        put_entry(&raft_engine, 2, 1);

        let mut raft_wb = raft_engine.write_batch();
        let mut kv_wb = raft_engine.write_batch();
        clear_meta(&raft_engine, 1, 5, &mut raft_wb, &mut kv_wb).unwrap();
        raft_engine.write(raft_wb, false).unwrap();

        // Region 2's entry must survive untouched.
        assert!(raft_engine.get_value(&keys::raft_log_key(2, 1)).unwrap().is_some());
    }
}
