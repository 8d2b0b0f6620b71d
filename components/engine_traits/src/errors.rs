// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use error_code::{self, ErrorCode, ErrorCodeExt};

/// §4.2's "dedicated not-found signal" is carried at the type level by
/// [`crate::Peekable::get_value`] returning `Ok(None)`, not by a variant
/// here; this enum covers the I/O/decode failures that signal is meant to
/// be distinguished from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protobuf decode error: {0}")]
    Protobuf(#[from] protobuf::ProtobufError),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorCodeExt for Error {
    fn error_code(&self) -> ErrorCode {
        match self {
            Error::Protobuf(_) | Error::Codec(_) => error_code::raftstore::ENGINE_CODEC,
            Error::Engine(_) => error_code::raftstore::ENGINE_IO,
        }
    }
}
