// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The bounded in-memory tail cache (§4.1). Holds a contiguous suffix of
//! the durable log so hot reads (recent leader appends, fast followers)
//! never touch the raft engine.

use std::collections::VecDeque;

use protobuf::Message as _;
use raft::eraftpb::Entry;

/// §4.1: "Bounded by `max_capacity` (e.g., 1023 entries)".
pub const DEFAULT_CACHE_CAPACITY: usize = 1023;

#[derive(Default)]
pub struct EntryCache {
    cache: VecDeque<Entry>,
    max_capacity: usize,
}

impl EntryCache {
    pub fn new(max_capacity: usize) -> Self {
        EntryCache {
            cache: VecDeque::new(),
            max_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn front_index(&self) -> Option<u64> {
        self.cache.front().map(|e| e.get_index())
    }

    pub fn back_index(&self) -> Option<u64> {
        self.cache.back().map(|e| e.get_index())
    }

    /// Splice `new_entries` onto the cache (§4.1, "append"). `tag` is a
    /// short identifier (e.g. the region id) used only in the panic
    /// message for the gap case.
    pub fn append(&mut self, tag: &str, new_entries: &[Entry]) {
        if new_entries.is_empty() {
            return;
        }
        let front = new_entries[0].get_index();

        if self.cache.is_empty() {
            self.cache.extend(new_entries.iter().cloned());
        } else {
            let cache_front = self.cache.front().unwrap().get_index();
            let cache_back = self.cache.back().unwrap().get_index();

            if front <= cache_front {
                // The incoming batch supersedes the entire cache.
                self.cache.clear();
                self.cache.extend(new_entries.iter().cloned());
            } else if front <= cache_back {
                // Overwrite-of-conflicting-tail: drop everything at or
                // after `front`, then install the new batch.
                let keep = (front - cache_front) as usize;
                self.cache.truncate(keep);
                self.cache.extend(new_entries.iter().cloned());
            } else if front == cache_back + 1 {
                self.cache.extend(new_entries.iter().cloned());
            } else {
                panic!(
                    "{} entry cache gap: back index {} but next batch starts at {}",
                    tag, cache_back, front
                );
            }
        }

        if self.cache.len() > self.max_capacity {
            let excess = self.cache.len() - self.max_capacity;
            self.cache.drain(..excess);
        }
    }

    /// Drop all entries with `index <= idx` (§4.1, "compact_to").
    pub fn compact_to(&mut self, idx: u64) {
        if self.cache.is_empty() {
            return;
        }
        let front = self.cache.front().unwrap().get_index();
        if idx < front {
            return;
        }
        let drop_count = ((idx - front) + 1).min(self.cache.len() as u64) as usize;
        self.cache.drain(..drop_count);
    }

    /// Append entries from `[begin, end)` present in the cache to `out`,
    /// accumulating encoded sizes into `fetched_size` (§4.1,
    /// "fetch_entries_to"). The cache must already cover `begin`; callers
    /// are expected to have checked `front_index()` first.
    pub fn fetch_entries_to(
        &self,
        begin: u64,
        end: u64,
        max_size: u64,
        fetched_size: &mut u64,
        out: &mut Vec<Entry>,
    ) {
        if begin >= end {
            return;
        }
        let cache_front = match self.front_index() {
            Some(f) => f,
            None => return,
        };
        assert!(
            begin >= cache_front,
            "entry cache does not cover requested begin index {begin} (front is {cache_front})"
        );
        let start = (begin - cache_front) as usize;
        let count = (end - begin) as usize;

        for entry in self.cache.iter().skip(start).take(count) {
            // First entry overall is always included; afterwards, stop as
            // soon as the running total has exceeded the budget (the
            // entry that pushes it over is the last one included; see
            // §4.3 "Engine Read", same rule applied to the cache).
            if !out.is_empty() && *fetched_size > max_size {
                break;
            }
            let size = entry.compute_size() as u64;
            out.push(entry.clone());
            *fetched_size += size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u64, term: u64) -> Entry {
        let mut e = Entry::default();
        e.set_index(index);
        e.set_term(term);
        e
    }

    #[test]
    fn append_extends_contiguous_tail() {
        let mut cache = EntryCache::new(1023);
        cache.append("t", &[entry(1, 1), entry(2, 1)]);
        cache.append("t", &[entry(3, 1)]);
        assert_eq!(cache.front_index(), Some(1));
        assert_eq!(cache.back_index(), Some(3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn append_overwrites_conflicting_tail() {
        let mut cache = EntryCache::new(1023);
        cache.append("t", &[entry(6, 5), entry(7, 5), entry(8, 5)]);
        cache.append("t", &[entry(7, 6), entry(8, 6)]);
        let indices: Vec<_> = cache.cache.iter().map(|e| (e.get_index(), e.get_term())).collect();
        assert_eq!(indices, vec![(6, 5), (7, 6), (8, 6)]);
    }

    #[test]
    fn append_superseding_batch_discards_whole_cache() {
        let mut cache = EntryCache::new(1023);
        cache.append("t", &[entry(10, 1), entry(11, 1)]);
        cache.append("t", &[entry(5, 2), entry(6, 2)]);
        assert_eq!(cache.front_index(), Some(5));
        assert_eq!(cache.back_index(), Some(6));
    }

    #[test]
    #[should_panic(expected = "entry cache gap")]
    fn append_panics_on_gap() {
        let mut cache = EntryCache::new(1023);
        cache.append("t", &[entry(1, 1)]);
        cache.append("t", &[entry(3, 1)]);
    }

    #[test]
    fn capacity_drops_oldest_prefix() {
        let mut cache = EntryCache::new(2);
        cache.append("t", &[entry(1, 1), entry(2, 1), entry(3, 1)]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.front_index(), Some(2));
    }

    #[test]
    fn compact_to_drops_entries_at_or_below() {
        let mut cache = EntryCache::new(1023);
        cache.append("t", &[entry(1, 1), entry(2, 1), entry(3, 1)]);
        cache.compact_to(2);
        assert_eq!(cache.front_index(), Some(3));
    }

    #[test]
    fn fetch_entries_to_always_returns_at_least_one() {
        let mut cache = EntryCache::new(1023);
        let mut e = entry(1, 1);
        e.set_data(vec![0u8; 4096]);
        cache.append("t", &[e]);

        let mut out = Vec::new();
        let mut size = 0u64;
        cache.fetch_entries_to(1, 2, 1, &mut size, &mut out);
        assert_eq!(out.len(), 1);
    }
}
