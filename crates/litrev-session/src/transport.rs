//! Transport abstraction for review subscriptions

use crate::error::Result;
use litrev_api::{ReviewClient, StreamEventStream};

/// Opens update streams for reviews.
///
/// A returned stream owns its connection: dropping it closes the
/// connection. Streams must not reconnect on their own.
pub trait Transport: Send + Sync {
    /// Open a subscription to the update stream of `review_id`
    fn subscribe(&self, review_id: &str) -> Result<StreamEventStream>;
}

/// Server-sent events straight from the review service
impl Transport for ReviewClient {
    fn subscribe(&self, review_id: &str) -> Result<StreamEventStream> {
        Ok(self.stream_review(review_id))
    }
}
