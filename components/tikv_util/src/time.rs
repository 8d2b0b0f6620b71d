// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::time::{Duration, Instant as StdInstant};

/// Monotonic instant, mirroring the upstream `tikv_util::time::Instant` used
/// throughout the raftstore for duration logging. Only the `now`/`saturating_elapsed`
/// pair this crate needs is kept.
#[derive(Debug, Clone, Copy)]
pub struct Instant(StdInstant);

impl Instant {
    pub fn now() -> Instant {
        Instant(StdInstant::now())
    }

    pub fn saturating_elapsed(&self) -> Duration {
        StdInstant::now().saturating_duration_since(self.0)
    }
}
