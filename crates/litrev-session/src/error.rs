//! Error types for litrev-session

use thiserror::Error;

/// Result type alias using litrev-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing a review session
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the review service client
    #[error(transparent)]
    Api(#[from] litrev_api::Error),

    /// `start` was called without a review id
    #[error("Review id must not be empty")]
    InvalidReviewId,

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
