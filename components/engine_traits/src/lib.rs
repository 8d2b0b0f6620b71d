// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Engine-facing traits and the on-disk key schema for the per-replica log
//! storage layer. Nothing in this crate touches a real engine; it exists so
//! `raftstore` can be written once against `KvEngine` and tested against
//! `engine_testutils`'s in-memory implementation instead of a physical one.

pub mod engine;
pub mod errors;
pub mod keys;

pub use engine::{Iterable, KvEngine, Mutable, Peekable, WriteBatch, RAFT_LOG_MULTI_GET_CNT};
pub use errors::{Error, Result};
