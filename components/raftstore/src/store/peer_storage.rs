// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The façade the consensus engine sees (§4.3). `PeerStorage` implements
//! `raft::Storage` directly (§4.6) instead of a parallel trait, since the
//! five methods that trait requires are exactly this component's
//! consensus-facing contract.

use protobuf::Message as _;
use raft::eraftpb::{ConfState, Entry, HardState, Snapshot};
use raft::{GetEntriesContext, StorageError};
use tikv_util::time::Instant;
use tikv_util::{box_err, debug, info};

use engine_traits::{keys, Iterable, KvEngine, Mutable, Peekable, RAFT_LOG_MULTI_GET_CNT};

use super::entry_cache::EntryCache;
use super::meta::{self, RaftApplyState, RaftLocalState};
use super::Region;
use crate::errors::{Error, Result};
use crate::metrics::RAFT_ENTRY_FETCHES;

pub struct PeerStorage<E: KvEngine> {
    pub(crate) raft_engine: E,
    pub(crate) kv_engine: E,

    region: Region,

    pub(crate) raft_state: RaftLocalState,
    pub(crate) apply_state: RaftApplyState,
    pub(crate) last_term: u64,

    cache: EntryCache,
}

impl<E: KvEngine> PeerStorage<E> {
    pub fn new(raft_engine: E, kv_engine: E, region: Region) -> Result<Self> {
        let start = Instant::now();
        let (raft_state, apply_state, last_term) = meta::init(&raft_engine, &kv_engine, &region)?;
        info!(
            "peer storage initialized"; "region_id" => region.id,
            "last_index" => raft_state.last_index, "applied_index" => apply_state.applied_index,
            "takes" => ?start.saturating_elapsed(),
        );
        Ok(PeerStorage {
            raft_engine,
            kv_engine,
            region,
            raft_state,
            apply_state,
            last_term,
            cache: EntryCache::new(super::entry_cache::DEFAULT_CACHE_CAPACITY),
        })
    }

    pub fn region_id(&self) -> u64 {
        self.region.id
    }

    pub fn raft_engine(&self) -> &E {
        &self.raft_engine
    }

    pub fn kv_engine(&self) -> &E {
        &self.kv_engine
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    /// I5: a region with at least one assigned peer.
    pub fn is_initialized(&self) -> bool {
        self.region.is_initialized()
    }

    #[inline]
    pub fn first_index(&self) -> u64 {
        self.apply_state.truncated_state.index + 1
    }

    #[inline]
    pub fn last_index(&self) -> u64 {
        self.raft_state.last_index
    }

    #[inline]
    pub fn last_term(&self) -> u64 {
        self.last_term
    }

    #[inline]
    pub fn applied_index(&self) -> u64 {
        self.apply_state.applied_index
    }

    #[inline]
    pub fn truncated_index(&self) -> u64 {
        self.apply_state.truncated_state.index
    }

    #[inline]
    pub fn truncated_term(&self) -> u64 {
        self.apply_state.truncated_state.term
    }

    /// §4.3, `check_range`.
    pub fn check_range(&self, low: u64, high: u64) -> Result<()> {
        if low > high {
            return Err(Error::InvalidRange(format!(
                "low {low} is greater than high {high}"
            )));
        } else if low <= self.truncated_index() {
            return Err(Error::Compacted(format!(
                "low {low} is at or below truncated index {}",
                self.truncated_index()
            )));
        } else if high > self.last_index() + 1 {
            return Err(Error::OutOfBound(format!(
                "high {high} is out of bound, last index is {}",
                self.last_index()
            )));
        }
        Ok(())
    }

    /// Stage `entries` into `invoke_ctx` and the raft write batch, and
    /// insert them into the cache (§4.3, `Append`). The batch/invoke_ctx
    /// mutation is staged and only takes effect on `self` at install time
    /// via [`super::invoke_context::commit_ready`]; the cache write is the
    /// one part of `self`'s own state this call touches immediately (§5,
    /// §9: a commit failure leaves the cache ahead of durable state, which
    /// is peer-fatal to recover from — restart resolves it by rehydrating
    /// from durable state).
    pub fn append<R: super::ready_context::ReadyContext<E>>(
        &mut self,
        invoke_ctx: &mut super::invoke_context::InvokeContext,
        entries: &[Entry],
        ready_ctx: &mut R,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let prev_last_index = invoke_ctx.raft_state.last_index;
        let region_id = self.region_id();

        let raft_batch = ready_ctx.raft_batch();
        for entry in entries {
            let key = keys::raft_log_key(region_id, entry.get_index());
            raft_batch.put_msg(&key, entry)?;
            if super::entry_context::has_sync_log_flag(entry) {
                ready_ctx.set_sync_log(true);
            }
        }

        let last_entry = entries.last().unwrap();
        let new_last_index = last_entry.get_index();
        let new_last_term = last_entry.get_term();

        // Erase any stale tail left over from a previous term.
        let raft_batch = ready_ctx.raft_batch();
        for index in (new_last_index + 1)..=prev_last_index {
            raft_batch.delete(&keys::raft_log_key(region_id, index))?;
        }

        invoke_ctx.raft_state.last_index = new_last_index;
        invoke_ctx.last_term = new_last_term;

        let tag = region_id.to_string();
        self.cache.append(&tag, entries);
        Ok(())
    }

    /// §4.3, `CompactTo`: cache-only compaction. The logical truncation
    /// point lives in `RaftApplyState` and moves via
    /// `InvokeContext::compact_raft_log` instead.
    pub fn compact_to(&mut self, idx: u64) {
        self.cache.compact_to(idx);
    }

    pub fn entry_cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Swap `invoke_ctx`'s staged state back into `self` (§4.4,
    /// "Install"). Only [`super::invoke_context::commit_ready`] calls
    /// this, after both write batches have been durably committed.
    pub(crate) fn install(&mut self, invoke_ctx: super::invoke_context::InvokeContext) {
        assert_eq!(invoke_ctx.region_id, self.region_id());
        if invoke_ctx.snapshot_applied {
            // The snapshot rewrote the log's baseline; whatever suffix the
            // cache held is no longer a valid tail of the new log.
            self.cache = EntryCache::new(self.cache.max_capacity());
        }
        self.raft_state = invoke_ctx.raft_state;
        self.apply_state = invoke_ctx.apply_state;
        self.last_term = invoke_ctx.last_term;
    }

    /// Cold-path engine read for `[low, high)` (§4.3, "Engine Read").
    fn fetch_entries_from_engine(
        &self,
        low: u64,
        high: u64,
        max_size: u64,
        out: &mut Vec<Entry>,
    ) -> Result<u64> {
        let region_id = self.region_id();
        let mut fetched_size = 0u64;

        if high - low <= RAFT_LOG_MULTI_GET_CNT {
            for index in low..high {
                // The first entry overall is always included; afterwards,
                // stop as soon as the running total has already exceeded
                // the budget (§4.3 "Engine Read": "the first entry is
                // always included... subsequent entries are included
                // while cumulative size <= max_size, then one more is
                // attempted and the loop breaks").
                if !out.is_empty() && fetched_size > max_size {
                    break;
                }
                let key = keys::raft_log_key(region_id, index);
                let entry: Entry = self
                    .raft_engine
                    .get_msg(&key)?
                    .ok_or_else(|| Error::Unavailable(format!("entry {index} missing")))?;
                fetched_size += entry.compute_size() as u64;
                out.push(entry);
            }
            return Ok(fetched_size);
        }

        let start_key = keys::raft_log_key(region_id, low);
        let end_key = keys::raft_log_key(region_id, high);
        let mut next_index = low;
        self.raft_engine.scan(&start_key, &end_key, |key, value| {
            if !out.is_empty() && fetched_size > max_size {
                return Ok(false);
            }
            let index = keys::raft_log_index(key)?;
            if index != next_index {
                // Gap or compaction race: stop scanning here.
                return Ok(false);
            }
            let mut entry = Entry::default();
            protobuf::Message::merge_from_bytes(&mut entry, value)?;
            fetched_size += entry.compute_size() as u64;
            out.push(entry);
            next_index += 1;
            Ok(true)
        })?;

        // §4.3 "Engine Read": the caller must receive either `high - low`
        // entries or an explicitly size-bounded truncation. A scan that
        // stops short of `high - low` entries without the budget having
        // been exceeded — whether from a mid-range gap or the range simply
        // running out before `high` — is `unavailable` (§7, §9's first open
        // question: preserve the source's `unavailable` behavior rather
        // than returning a partial result).
        let size_bounded = !out.is_empty() && fetched_size > max_size;
        if !size_bounded && (out.len() as u64) != high - low {
            return Err(Error::Unavailable(format!(
                "entries [{low}, {high}) missing from raft engine at index {next_index}"
            )));
        }
        Ok(fetched_size)
    }
}

impl<E: KvEngine> raft::Storage for PeerStorage<E> {
    fn initial_state(&self) -> raft::Result<raft::RaftState> {
        let hard_state = self.raft_state.hard_state();
        if hard_state == HardState::default() {
            assert!(
                !self.is_initialized(),
                "region {} is initialized but has an empty hard state",
                self.region_id()
            );
            return Ok(raft::RaftState::new(hard_state, ConfState::default()));
        }
        assert!(
            self.is_initialized(),
            "region {} has a non-empty hard state but is not initialized",
            self.region_id()
        );
        Ok(raft::RaftState::new(hard_state, self.region.conf_state()))
    }

    fn entries(
        &self,
        low: u64,
        high: u64,
        max_size: impl Into<Option<u64>>,
        _context: GetEntriesContext,
    ) -> raft::Result<Vec<Entry>> {
        self.check_range(low, high)?;
        let max_size = max_size.into().unwrap_or(u64::MAX);
        let mut entries = Vec::with_capacity((high - low) as usize);

        let cache_front = self.cache.front_index();
        match cache_front {
            Some(front) if high <= front => {
                // Entirely cold.
                RAFT_ENTRY_FETCHES.miss.inc();
                self.fetch_entries_from_engine(low, high, max_size, &mut entries)?;
            }
            Some(front) if low < front => {
                // Split read: cold prefix, then the cache.
                RAFT_ENTRY_FETCHES.miss.inc();
                let cold_size =
                    self.fetch_entries_from_engine(low, front, max_size, &mut entries)?;
                if cold_size <= max_size {
                    let mut fetched_size = cold_size;
                    self.cache
                        .fetch_entries_to(front, high, max_size, &mut fetched_size, &mut entries);
                }
            }
            Some(_) => {
                // Entirely hot.
                RAFT_ENTRY_FETCHES.hit.inc();
                let mut fetched_size = 0u64;
                self.cache
                    .fetch_entries_to(low, high, max_size, &mut fetched_size, &mut entries);
            }
            None => {
                RAFT_ENTRY_FETCHES.miss.inc();
                self.fetch_entries_from_engine(low, high, max_size, &mut entries)?;
            }
        }
        Ok(entries)
    }

    fn term(&self, idx: u64) -> raft::Result<u64> {
        if idx == self.truncated_index() {
            return Ok(self.truncated_term());
        }
        self.check_range(idx, idx + 1)?;
        if self.truncated_term() == self.last_term || idx == self.last_index() {
            return Ok(self.last_term);
        }
        let key = keys::raft_log_key(self.region_id(), idx);
        let entry: Entry = self
            .raft_engine
            .get_msg(&key)
            .map_err(|e| raft::Error::Store(StorageError::Other(box_err!(e))))?
            .ok_or_else(|| raft::Error::Store(StorageError::Unavailable))?;
        Ok(entry.get_term())
    }

    fn first_index(&self) -> raft::Result<u64> {
        Ok(self.first_index())
    }

    fn last_index(&self) -> raft::Result<u64> {
        Ok(self.last_index())
    }

    fn snapshot(&self, _request_index: u64, _to: u64) -> raft::Result<Snapshot> {
        debug!("snapshot generation delegated to an external collaborator"; "region_id" => self.region_id());
        Err(raft::Error::Store(
            StorageError::SnapshotTemporarilyUnavailable,
        ))
    }
}
