// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The capability set this crate family asks of a durable key-value engine
//! (§6, "Engine contract consumed"). Deliberately small: a point get, a
//! prefix-respecting range scan, and a write batch with set/set_msg/delete.
//! A real engine (RocksDB, a raft log engine, ...) is out of scope (§1) and
//! plugs in by implementing these traits; `engine_testutils` is the
//! in-memory stand-in this crate's own tests run against.

use protobuf::Message as _;

use crate::errors::Result;

/// Threshold below which `fetch_entries_to` uses point gets instead of a
/// range scan (§4.3, "Engine Read"). 8, same as upstream.
pub const RAFT_LOG_MULTI_GET_CNT: u64 = 8;

/// Read-only access to a single key, plus the protobuf-message convenience
/// every caller in this codebase wants (log entries are protobuf messages).
pub trait Peekable {
    fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn get_msg<M: protobuf::Message>(&self, key: &[u8]) -> Result<Option<M>> {
        match self.get_value(key)? {
            Some(v) => {
                let mut msg = M::new();
                msg.merge_from_bytes(&v)?;
                Ok(Some(msg))
            }
            None => Ok(None),
        }
    }
}

/// A bounded forward scan over `[start, end)`. `f` returns `Ok(true)` to
/// keep scanning and `Ok(false)` to stop early; this is the Rust-idiomatic
/// flattening of the spec's `Seek`/`Valid`/`Next`/`Item` iterator protocol.
pub trait Iterable {
    fn scan<F>(&self, start: &[u8], end: &[u8], f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>;

    /// The first key at or after `start`, if any is present at all.
    fn seek(&self, start: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>>;
}

/// Write-side access: every mutation in this crate family goes through a
/// batch, never a single put (§4.2: "Writes are always done through a
/// batch; no single-put path").
pub trait Mutable {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    fn put_msg<M: protobuf::Message>(&mut self, key: &[u8], msg: &M) -> Result<()> {
        self.put(key, &msg.write_to_bytes()?)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

pub trait WriteBatch: Mutable + Default + Send {
    fn is_empty(&self) -> bool;
    fn count(&self) -> usize;
}

/// One durable key-value engine. `PeerStorage` is generic over two of
/// these: one playing the "raft engine" role, one the "kv engine" role
/// (§1, §3). Nothing in this trait distinguishes the two; the roles differ
/// only in which records the storage layer chooses to address through
/// each.
pub trait KvEngine: Peekable + Iterable + Clone + Send + Sync + 'static {
    type WriteBatch: WriteBatch;

    fn write_batch(&self) -> Self::WriteBatch;

    /// Durably commit `batch`. `sync` requests an fsync before returning
    /// (§3: the sync-log flag; §5: "if any entry in the batch had the
    /// sync-log flag, the commit must be fsynced before returning").
    fn write(&self, batch: Self::WriteBatch, sync: bool) -> Result<()>;
}
