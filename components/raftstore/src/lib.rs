// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The per-replica log storage layer: [`store::EntryCache`],
//! [`store::PeerStorage`], [`store::InvokeContext`], and the
//! `MetaLifecycle` init/clear functions in [`store::meta`].

pub mod errors;
pub mod metrics;
pub mod store;

pub use errors::{Error, Result};
