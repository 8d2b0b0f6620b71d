// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Small, dependency-light slice of `tikv_util`: just the logging macros and
//! the `box_err!`/`box_try!` helpers the storage layer needs. Everything
//! else upstream `tikv_util` carries (metrics collectors, config plumbing,
//! thread management, ...) belongs to components this crate family doesn't
//! implement.

pub mod time;

/// Wrap a displayable value into a boxed, thread-safe `std::error::Error`,
/// tagging it with the call site the way the upstream macro does.
#[macro_export]
macro_rules! box_err {
    ($e:expr) => ({
        let e: Box<dyn std::error::Error + Sync + Send> = format!("[{}:{}]: {}", file!(), line!(), $e).into();
        e
    });
    ($f:tt, $($arg:expr),+) => (
        box_err!(format!($f, $($arg),+))
    );
}

/// Like `?` but boxes the error through [`box_err!`] first.
#[macro_export]
macro_rules! box_try {
    ($expr:expr) => {{
        match $expr {
            Ok(r) => r,
            Err(e) => return Err($crate::box_err!(e)),
        }
    }};
}

pub use slog_global::{crit, debug, error, info, warn};
