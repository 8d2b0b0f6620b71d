// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The "simple hit/miss counters" `EntryCache` owns (§1: "metrics export
//! beyond the simple hit/miss counters defined here" is out of scope, but
//! these are in scope). Registered the same way `rfengine::metrics` builds
//! its labeled counter vecs.

use lazy_static::lazy_static;
use prometheus::*;
use prometheus_static_metric::*;

make_static_metric! {
    pub label_enum EntryCacheOutcome {
        hit,
        miss,
    }

    pub struct EntryCacheCounterVec: IntCounter {
        "type" => EntryCacheOutcome,
    }
}

lazy_static! {
    static ref RAFT_ENTRY_FETCHES_VEC: IntCounterVec = register_int_counter_vec!(
        "raftstore_entry_fetches",
        "Total number of Entries() calls served entirely, partially, or not at all from the cache",
        &["type"]
    )
    .unwrap();
    pub static ref RAFT_ENTRY_FETCHES: EntryCacheCounterVec =
        EntryCacheCounterVec::from(&RAFT_ENTRY_FETCHES_VEC);
}
