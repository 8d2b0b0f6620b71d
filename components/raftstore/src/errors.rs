// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use error_code::{self, ErrorCode, ErrorCodeExt};

/// Errors surfaced by the non-consensus-facing surface of this crate:
/// `CompactRaftLog`, `MetaLifecycle` init/clear, and the engine I/O they
/// depend on. The consensus-facing operations (`InitialState`, `Entries`,
/// `Term`, `FirstIndex`, `LastIndex`, `Snapshot`) return `raft::Result`
/// instead, per §4.6/§7 of the storage spec; `From<Error> for raft::Error`
/// below is what lets `?` cross that boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("log is compacted: {0}")]
    Compacted(String),
    #[error("log entries unavailable: {0}")]
    Unavailable(String),
    #[error("log range out of bound: {0}")]
    OutOfBound(String),
    #[error("invalid log range: {0}")]
    InvalidRange(String),
    #[error("tried to truncate at an index already compacted: {0}")]
    TruncateCompacted(String),
    #[error("tried to truncate past the applied index: {0}")]
    TruncateUncommitted(String),
    #[error("engine error: {0}")]
    Engine(#[from] engine_traits::Error),
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Sync + Send>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorCodeExt for Error {
    fn error_code(&self) -> ErrorCode {
        match self {
            Error::Compacted(_) => error_code::raftstore::ENTRY_STORAGE_COMPACTED,
            Error::Unavailable(_) => error_code::raftstore::ENTRY_STORAGE_UNAVAILABLE,
            Error::OutOfBound(_) => error_code::raftstore::ENTRY_STORAGE_OUT_OF_BOUND,
            Error::InvalidRange(_) => error_code::raftstore::ENTRY_STORAGE_INVALID_RANGE,
            Error::TruncateCompacted(_) => error_code::raftstore::ENTRY_STORAGE_TRUNCATE_COMPACTED,
            Error::TruncateUncommitted(_) => {
                error_code::raftstore::ENTRY_STORAGE_TRUNCATE_UNCOMMITTED
            }
            Error::Engine(e) => e.error_code(),
            Error::Other(_) => error_code::raftstore::ENGINE_IO,
        }
    }
}

/// Maps this crate's error kinds onto the `raft::StorageError` variants the
/// consensus engine's `raft::Storage` trait expects (§4.6). `compacted`,
/// `unavailable`, and `snapshot-temporarily-unavailable` are enumerated
/// variants upstream; everything else (`invalid-range`, `out-of-bound`,
/// engine/codec failures) becomes `StorageError::Other`, same as
/// `check_range`'s own mapping for its two non-enumerated kinds.
impl From<Error> for raft::Error {
    fn from(e: Error) -> raft::Error {
        match e {
            Error::Compacted(_) => raft::Error::Store(raft::StorageError::Compacted),
            Error::Unavailable(_) => raft::Error::Store(raft::StorageError::Unavailable),
            other => raft::Error::Store(raft::StorageError::Other(Box::new(other))),
        }
    }
}
