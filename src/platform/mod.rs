/// User profile lookups.
pub mod directory;
/// Outbound messaging operations.
pub mod messenger;
#[cfg(test)]
pub(crate) mod testing;

use std::error::Error;
use thiserror::Error;

/// Result alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Error raised by messaging platform adapters.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Transport-level failure while talking to the platform.
    #[error("platform request failed: {message}")]
    Request {
        /// What the adapter was doing when the transport failed.
        message: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The platform understood the call and refused it.
    #[error("platform rejected the call: {0}")]
    Rejected(String),
}

impl PlatformError {
    /// Construct a request error from any transport failure.
    pub fn request(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        PlatformError::Request {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an error for a call the platform refused to perform.
    pub fn rejected(message: impl Into<String>) -> Self {
        PlatformError::Rejected(message.into())
    }
}
