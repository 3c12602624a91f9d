//! Errors surfaced by the catalog client

use thiserror::Error;

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Why a catalog call did not produce the expected value.
///
/// The client never recovers from any of these; callers decide.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No response was obtained (connect, timeout, body read)
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived with a status other than the expected one
    #[error("catalog responded with unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The body did not match the expected shape
    #[error("catalog response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::UnexpectedStatus(code) => Some(*code),
            _ => None,
        }
    }
}
