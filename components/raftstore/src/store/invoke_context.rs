// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The staged, per-batch mutation buffer (§4.4). A ready cycle creates one
//! from the current `PeerStorage`, mutates it freely, and on durable
//! commit of the two write batches it produces, it is installed back into
//! `PeerStorage` as a single in-memory swap.

use engine_traits::{keys, KvEngine, Mutable, WriteBatch};

use super::codec;
use crate::errors::{Error, Result};
use crate::store::meta::{RaftApplyState, RaftLocalState, RaftTruncatedState};
use crate::store::peer_storage::PeerStorage;
use crate::store::ready_context::ReadyContext;

pub struct InvokeContext {
    pub region_id: u64,
    pub raft_state: RaftLocalState,
    pub apply_state: RaftApplyState,
    pub last_term: u64,
    /// Set by [`InvokeContext::apply_snapshot`]; tells [`PeerStorage::install`]
    /// to drop the entry cache, since a snapshot install replaces the log's
    /// baseline out from under whatever suffix the cache was holding.
    pub(crate) snapshot_applied: bool,
}

impl InvokeContext {
    pub fn new<E: KvEngine>(store: &PeerStorage<E>) -> Self {
        InvokeContext {
            region_id: store.region_id(),
            raft_state: store.raft_state,
            apply_state: store.apply_state,
            last_term: store.last_term,
            snapshot_applied: false,
        }
    }

    pub fn save_raft_state_to<E: KvEngine>(&self, raft_batch: &mut E::WriteBatch) -> Result<()> {
        let key = keys::raft_state_key(self.region_id);
        raft_batch.put(&key, &codec::encode(&self.raft_state)?)?;
        Ok(())
    }

    pub fn save_apply_state_to<E: KvEngine>(&self, kv_batch: &mut E::WriteBatch) -> Result<()> {
        let key = keys::apply_state_key(self.region_id);
        kv_batch.put(&key, &codec::encode(&self.apply_state)?)?;
        Ok(())
    }

    /// §4.4: "Apply advances `apply_state.applied_index`". Called by the
    /// apply pipeline (external to this crate, §1) once an entry's effects
    /// are durably visible in the user state; validated against I1
    /// (`truncated.index <= applied_index <= last_index`).
    pub fn apply(&mut self, applied_index: u64) -> Result<()> {
        if applied_index <= self.apply_state.truncated_state.index {
            return Err(Error::TruncateCompacted(format!(
                "applied_index {applied_index} is at or before truncated index {}",
                self.apply_state.truncated_state.index
            )));
        }
        if applied_index > self.raft_state.last_index {
            return Err(Error::OutOfBound(format!(
                "applied_index {applied_index} is beyond last_index {}",
                self.raft_state.last_index
            )));
        }
        self.apply_state.applied_index = applied_index;
        Ok(())
    }

    /// §4.4: "Snapshot install assigns `SnapRegion`... and rewrites both
    /// states accordingly." Snapshot generation/streaming and the incoming
    /// region descriptor's own persistence are external collaborators'
    /// concerns (§1); this rewrites the two states this crate owns so that
    /// `last_index`/`last_term`/`applied_index`/`truncated_state` reflect
    /// the snapshot's metadata, per I4 ("lastTerm equals... truncated.term
    /// when last_index == truncated.index").
    pub fn apply_snapshot(&mut self, index: u64, term: u64) {
        self.raft_state.last_index = index;
        self.last_term = term;
        self.apply_state.applied_index = index;
        self.apply_state.truncated_state = RaftTruncatedState { index, term };
        self.snapshot_applied = true;
    }

    /// §4.3, `CompactRaftLog`: advance `truncated_state` after validating
    /// `truncated.index < compact_index <= applied_index`. Physical
    /// deletion of the discarded log range is an external collaborator's
    /// job (§1); this only moves the logical boundary.
    pub fn compact_raft_log(&mut self, compact_index: u64, compact_term: u64) -> Result<()> {
        if compact_index <= self.apply_state.truncated_state.index {
            return Err(Error::TruncateCompacted(format!(
                "compact_index {compact_index} is at or before truncated index {}",
                self.apply_state.truncated_state.index
            )));
        }
        if compact_index > self.apply_state.applied_index {
            return Err(Error::TruncateUncommitted(format!(
                "compact_index {compact_index} is beyond applied index {}",
                self.apply_state.applied_index
            )));
        }
        self.apply_state.truncated_state = RaftTruncatedState {
            index: compact_index,
            term: compact_term,
        };
        Ok(())
    }
}

/// The only sanctioned way to durably commit a ready cycle's batches and
/// install the resulting `InvokeContext` (§5, §9: "encode the
/// raft-before-kv ordering as a type-level discipline... rather than
/// leaving it to convention").
///
/// Commits the raft batch first (fsynced if `ready_ctx.sync_log()`), then
/// the kv batch, then swaps `invoke_ctx` into `store`. On crash between the
/// two commits the log has advanced ahead of apply, which is recoverable
/// by replay; the reverse order would violate I1.
pub fn commit_ready<E, R>(
    store: &mut PeerStorage<E>,
    invoke_ctx: InvokeContext,
    ready_ctx: &mut R,
) -> Result<()>
where
    E: KvEngine,
    R: ReadyContext<E>,
{
    let raft_batch = std::mem::replace(ready_ctx.raft_batch(), store.raft_engine.write_batch());
    store.raft_engine.write(raft_batch, ready_ctx.sync_log())?;

    let kv_batch = std::mem::replace(ready_ctx.kv_batch(), store.kv_engine.write_batch());
    store.kv_engine.write(kv_batch, false)?;

    store.install(invoke_ctx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(truncated_index: u64, applied_index: u64, last_index: u64) -> InvokeContext {
        InvokeContext {
            region_id: 1,
            raft_state: RaftLocalState {
                last_index,
                term: 1,
                vote: 0,
                commit: last_index,
            },
            apply_state: RaftApplyState {
                applied_index,
                truncated_state: RaftTruncatedState {
                    index: truncated_index,
                    term: 1,
                },
            },
            last_term: 1,
            snapshot_applied: false,
        }
    }

    #[test]
    fn apply_advances_applied_index_within_bounds() {
        let mut c = ctx(5, 5, 10);
        c.apply(7).unwrap();
        assert_eq!(c.apply_state.applied_index, 7);
    }

    #[test]
    fn apply_rejects_at_or_below_truncated() {
        let mut c = ctx(5, 5, 10);
        assert!(c.apply(5).is_err());
    }

    #[test]
    fn apply_rejects_past_last_index() {
        let mut c = ctx(5, 5, 10);
        assert!(c.apply(11).is_err());
    }

    #[test]
    fn compact_raft_log_rejects_uncommitted() {
        let mut c = ctx(5, 7, 10);
        assert!(c.compact_raft_log(8, 1).is_err());
    }

    #[test]
    fn compact_raft_log_rejects_already_compacted() {
        let mut c = ctx(5, 7, 10);
        assert!(c.compact_raft_log(5, 1).is_err());
    }

    #[test]
    fn apply_snapshot_rewrites_both_states_and_marks_cache_stale() {
        let mut c = ctx(5, 5, 10);
        c.apply_snapshot(20, 3);
        assert_eq!(c.raft_state.last_index, 20);
        assert_eq!(c.last_term, 3);
        assert_eq!(c.apply_state.applied_index, 20);
        assert_eq!(c.apply_state.truncated_state, RaftTruncatedState { index: 20, term: 3 });
        assert!(c.snapshot_applied);
    }
}
