// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Byte-exact key schema (§6). One-byte type prefixes keep the four record
//! kinds disjoint within whichever engine they live in; big-endian integers
//! keep `RaftLogKey` iteration order equal to index order, which is what
//! lets a bounded range scan stand in for "entries of region r in
//! `[low, high)`" (§6: "Must sort such that iterating
//! `[RaftLogKey(r, low), RaftLogKey(r, high))` yields exactly the entries of
//! region `r` with indices in `[low, high)` in ascending order").

use byteorder::{BigEndian, ByteOrder};

use crate::errors::{Error, Result};

const RAFT_STATE_PREFIX: u8 = 0x01;
const RAFT_LOG_PREFIX: u8 = 0x02;
const APPLY_STATE_PREFIX: u8 = 0x03;
const REGION_STATE_PREFIX: u8 = 0x04;

fn region_key(prefix: u8, region_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, region_id);
    key.extend_from_slice(&buf);
    key
}

/// Per-region raft local state, in the raft engine.
pub fn raft_state_key(region_id: u64) -> Vec<u8> {
    region_key(RAFT_STATE_PREFIX, region_id)
}

/// Per-region apply state, in the kv engine.
pub fn apply_state_key(region_id: u64) -> Vec<u8> {
    region_key(APPLY_STATE_PREFIX, region_id)
}

/// Per-region descriptor, in the kv engine.
pub fn region_state_key(region_id: u64) -> Vec<u8> {
    region_key(REGION_STATE_PREFIX, region_id)
}

/// One log entry, in the raft engine. `index == u64::MAX` is used as the
/// open end of a half-open range by callers; it is never the key of an
/// actual entry.
pub fn raft_log_key(region_id: u64, index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(RAFT_LOG_PREFIX);
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, region_id);
    key.extend_from_slice(&buf);
    BigEndian::write_u64(&mut buf, index);
    key.extend_from_slice(&buf);
    key
}

/// The first possible `raft_log_key` for a region, used as a scan lower
/// bound when the caller wants "from the start of the log".
pub fn raft_log_prefix(region_id: u64) -> Vec<u8> {
    region_key(RAFT_LOG_PREFIX, region_id)
}

/// Inverse of `raft_log_key`: recover the index encoded in a log key.
pub fn raft_log_index(key: &[u8]) -> Result<u64> {
    if key.len() != 17 || key[0] != RAFT_LOG_PREFIX {
        return Err(Error::Codec(format!("{key:?} is not a raft log key")));
    }
    Ok(BigEndian::read_u64(&key[9..17]))
}
