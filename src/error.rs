//! The error taxonomy from spec §7: configuration, I/O, invariant violation, transport.
//! Library code returns `Result<T, TeraSortError>`; the binary wraps that in
//! `anyhow::Result` to attach call-site context before printing a cause chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeraSortError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, TeraSortError>;
