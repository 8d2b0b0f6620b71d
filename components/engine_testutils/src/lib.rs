// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! An in-memory stand-in for a durable key-value engine, used only by this
//! workspace's own tests. Mirrors the role `engine_panic`/`engine_test` play
//! upstream: a cheap, dependency-free implementation of `engine_traits` that
//! lets the storage layer's test suite run without a real RocksDB or raft
//! log engine on the machine.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use engine_traits::{Iterable, KvEngine, Mutable, Peekable, Result, WriteBatch as WriteBatchTrait};
use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct MemEngine {
    map: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: number of keys currently stored, regardless of prefix.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Peekable for MemEngine {
    fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().get(key).cloned())
    }
}

impl Iterable for MemEngine {
    fn scan<F>(&self, start: &[u8], end: &[u8], mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>,
    {
        let map = self.map.lock();
        let range = map.range((Bound::Included(start.to_vec()), Bound::Excluded(end.to_vec())));
        for (k, v) in range {
            if !f(k, v)? {
                break;
            }
        }
        Ok(())
    }

    fn seek(&self, start: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let map = self.map.lock();
        Ok(map
            .range((Bound::Included(start.to_vec()), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

#[derive(Default)]
pub struct MemWriteBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    deletes: Vec<Vec<u8>>,
}

impl Mutable for MemWriteBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.puts.push((key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.deletes.push(key.to_vec());
        Ok(())
    }
}

impl WriteBatchTrait for MemWriteBatch {
    fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }

    fn count(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }
}

impl KvEngine for MemEngine {
    type WriteBatch = MemWriteBatch;

    fn write_batch(&self) -> MemWriteBatch {
        MemWriteBatch::default()
    }

    fn write(&self, batch: MemWriteBatch, _sync: bool) -> Result<()> {
        // No fsync to simulate: the whole point of this engine is that it
        // never survives process exit. `sync` is accepted only so callers
        // don't need a cfg-gated code path in tests.
        let mut map = self.map.lock();
        for (k, v) in batch.puts {
            map.insert(k, v);
        }
        for k in batch.deletes {
            map.remove(&k);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_respects_half_open_range() {
        let engine = MemEngine::new();
        let mut wb = engine.write_batch();
        for i in 0u8..5 {
            wb.put(&[i], &[i]).unwrap();
        }
        engine.write(wb, false).unwrap();

        let mut seen = Vec::new();
        engine
            .scan(&[1], &[4], |k, _| {
                seen.push(k[0]);
                Ok(true)
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn scan_can_stop_early() {
        let engine = MemEngine::new();
        let mut wb = engine.write_batch();
        for i in 0u8..5 {
            wb.put(&[i], &[i]).unwrap();
        }
        engine.write(wb, false).unwrap();

        let mut seen = Vec::new();
        engine
            .scan(&[0], &[5], |k, _| {
                seen.push(k[0]);
                Ok(k[0] < 2)
            })
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn delete_removes_key() {
        let engine = MemEngine::new();
        let mut wb = engine.write_batch();
        wb.put(b"a", b"1").unwrap();
        engine.write(wb, false).unwrap();
        assert_eq!(engine.get_value(b"a").unwrap(), Some(b"1".to_vec()));

        let mut wb = engine.write_batch();
        wb.delete(b"a").unwrap();
        engine.write(wb, false).unwrap();
        assert_eq!(engine.get_value(b"a").unwrap(), None);
    }
}
