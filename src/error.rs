// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Core error taxonomy. A duplicate request is deliberately *not* here:
/// replaying an already-applied request id is a successful no-op and is
/// reported through [`crate::engine::Outcome::Duplicate`].
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced id is absent. Surfaced to the caller, never retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient backend failure. Safe to retry with the *same* request id;
    /// the caller owns the retry policy.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}
