// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! A trimmed-down `error_code`: just the `ErrorCode` value type, the
//! `ErrorCodeExt` trait every fallible type in this crate family
//! implements, and the `error_code!` declarative macro used to register
//! one. Upstream `error_code` additionally drives a whole-workspace
//! `error_code_gen` binary that walks every component and emits a coverage
//! report; that tool has nothing to enumerate once reduced to a single
//! storage-layer component, so it is not carried here.

pub mod raftstore;

/// A stable, human-documented identifier for one error condition.
///
/// `code` is what gets logged and returned to clients; it must never change
/// once shipped. `description`/`workaround` are for operators reading logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    pub description: &'static str,
    pub workaround: &'static str,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Implemented by every error enum that crosses a component boundary, so
/// callers can match on a stable string instead of the enum's variants.
pub trait ErrorCodeExt {
    fn error_code(&self) -> ErrorCode;
}

#[macro_export]
macro_rules! error_code {
    ($group:ident, $name:ident, $code:expr, $description:expr, $workaround:expr) => {
        pub const $name: $crate::ErrorCode = $crate::ErrorCode {
            code: concat!(stringify!($group), "-", $code),
            description: $description,
            workaround: $workaround,
        };
    };
}
