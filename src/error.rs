//! Error types for the Floodgate library.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for Floodgate operations.
///
/// A rejected request is not an error: `process_request` reports it as
/// `Ok(false)`. These variants cover genuine failures only.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// Invalid rule or policy, raised at construction time
    #[error("configuration error: {0}")]
    Config(String),

    /// A required identity parameter could not be resolved from the request
    #[error("identity resolution error: {0}")]
    IdentityResolution(String),

    /// Counter store failures, propagated verbatim to the caller
    #[error("counter store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
