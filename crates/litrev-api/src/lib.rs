//! litrev-api: client for the literature-review service
//!
//! Wire types, the REST client, and the server-sent-event subscription that
//! turns a review's update stream into [`StreamEvent`]s.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, ReviewClient, ReviewsApi};
pub use error::{Error, Result};
pub use stream::{StreamEvent, StreamEventStream};
pub use types::*;
