// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Error codes owned by the raft log storage layer (`§7` of the storage
//! spec: the closed set of kinds a storage-facing caller may see).

use crate::error_code;

error_code!(
    raftstore,
    ENTRY_STORAGE_COMPACTED,
    "entry_storage:compacted",
    "Requested log entries have already been compacted away",
    "The caller fell too far behind; it should install a snapshot instead of replaying the log"
);
error_code!(
    raftstore,
    ENTRY_STORAGE_UNAVAILABLE,
    "entry_storage:unavailable",
    "Requested log entries are within bounds but missing from the engine",
    "This indicates data corruption or a race with a physical log compactor; inspect the raft engine"
);
error_code!(
    raftstore,
    ENTRY_STORAGE_OUT_OF_BOUND,
    "entry_storage:out_of_bound",
    "Requested log range extends past the last durable index",
    "The caller's view of last_index is stale; retry after the next ready cycle"
);
error_code!(
    raftstore,
    ENTRY_STORAGE_INVALID_RANGE,
    "entry_storage:invalid_range",
    "Requested log range has low > high",
    "Fix the caller; this is a programmer error, not a runtime condition"
);
error_code!(
    raftstore,
    ENTRY_STORAGE_TRUNCATE_COMPACTED,
    "entry_storage:truncate_compacted",
    "Tried to advance the truncation point to an index at or before the current one",
    "This compaction request is stale and can be dropped"
);
error_code!(
    raftstore,
    ENTRY_STORAGE_TRUNCATE_UNCOMMITTED,
    "entry_storage:truncate_uncommitted",
    "Tried to truncate past the applied index",
    "Wait for apply to catch up before compacting this far"
);
error_code!(
    raftstore,
    ENGINE_IO,
    "raftstore:engine_io",
    "The underlying key-value engine returned an I/O error",
    "Inspect the engine's own logs; this layer only propagates the failure"
);
error_code!(
    raftstore,
    ENGINE_CODEC,
    "raftstore:engine_codec",
    "A persisted record failed to decode",
    "Indicates on-disk corruption or a wire-format version mismatch"
);
