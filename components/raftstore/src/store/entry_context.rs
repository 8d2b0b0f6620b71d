// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The per-entry context byte (§3: "The last byte of payload carries a
//! context flag"). Only the sync-log bit is defined by the spec; the type
//! is a `bitflags` set rather than a single bool so a second flag can be
//! added later without changing the wire layout.

use bitflags::bitflags;
use raft::eraftpb::Entry;

bitflags! {
    pub struct EntryContext: u8 {
        const SYNC_LOG = 0b0000_0001;
    }
}

/// Whether `entry` requests an fsync before acknowledgement.
pub fn has_sync_log_flag(entry: &Entry) -> bool {
    match entry.get_data().last() {
        Some(&byte) => EntryContext::from_bits_truncate(byte).contains(EntryContext::SYNC_LOG),
        None => false,
    }
}
