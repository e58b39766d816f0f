//! Crate-level error type
//!
//! Provisioning errors live next to the code that raises them
//! (`provisioning::error`); this type covers the process boundary:
//! socket I/O and HTTP client construction.

use thiserror::Error;

/// Process-level errors for momo-keygen
#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, KeygenError>;
