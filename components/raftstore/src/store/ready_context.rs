// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The ready-context capability (§4.7, §6 "Ready-context contract
//! consumed"): a per-ready-cycle bundle of {kv_batch, raft_batch,
//! sync_log}. Modeled as a trait per Design Note 9 ("Polymorphism over
//! ready-context... model as a small capability interface, not as
//! inheritance") rather than requiring callers to subclass anything.

use engine_traits::KvEngine;

pub trait ReadyContext<E: KvEngine> {
    fn kv_batch(&mut self) -> &mut E::WriteBatch;
    fn raft_batch(&mut self) -> &mut E::WriteBatch;
    fn sync_log(&self) -> bool;
    fn set_sync_log(&mut self, sync: bool);
}

/// A plain struct implementation for callers that don't need to fold the
/// two batches into a larger per-store transaction, and for this crate's
/// own tests (mirrors `test_util_test.go`'s `readyContext`).
pub struct SimpleReadyContext<E: KvEngine> {
    pub kv_batch: E::WriteBatch,
    pub raft_batch: E::WriteBatch,
    pub sync_log: bool,
}

impl<E: KvEngine> SimpleReadyContext<E> {
    pub fn new(kv_engine: &E, raft_engine: &E) -> Self {
        SimpleReadyContext {
            kv_batch: kv_engine.write_batch(),
            raft_batch: raft_engine.write_batch(),
            sync_log: false,
        }
    }
}

impl<E: KvEngine> ReadyContext<E> for SimpleReadyContext<E> {
    fn kv_batch(&mut self) -> &mut E::WriteBatch {
        &mut self.kv_batch
    }

    fn raft_batch(&mut self) -> &mut E::WriteBatch {
        &mut self.raft_batch
    }

    fn sync_log(&self) -> bool {
        self.sync_log
    }

    fn set_sync_log(&mut self, sync: bool) {
        // Sticky: once an entry in the batch requests a sync, the whole
        // batch stays marked sync even if a later entry doesn't ask for it.
        self.sync_log = self.sync_log || sync;
    }
}
