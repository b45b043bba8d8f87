//! HTTP client for the review service

use crate::{
    error::{Error, Result},
    stream::{self, StreamEventStream},
    types::{CreateReviewRequest, HealthResponse, ReviewResponse},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default service location
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default timeout for the JSON endpoints
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations offered by the review service (everything except streaming)
#[async_trait]
pub trait ReviewsApi: Send + Sync {
    /// Create a review; the service starts working on it immediately
    async fn create_review(&self, request: &CreateReviewRequest) -> Result<ReviewResponse>;

    /// Fetch one review, including its papers once completed
    async fn get_review(&self, review_id: &str) -> Result<ReviewResponse>;

    /// List recent reviews
    async fn list_reviews(&self, limit: u32, offset: u32) -> Result<Vec<ReviewResponse>>;

    /// Delete a review
    async fn delete_review(&self, review_id: &str) -> Result<()>;

    /// Service health probe
    async fn health(&self) -> Result<HealthResponse>;
}

/// Review service client
#[derive(Debug, Clone)]
pub struct ReviewClient {
    client: reqwest::Client,
    /// Streams are long-lived, so they get a client without a request timeout
    stream_client: reqwest::Client,
    base_url: String,
    subscribe_delay: Duration,
}

impl ReviewClient {
    /// Create a client for the given base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "API URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let stream_client = reqwest::Client::new();

        Ok(Self {
            client,
            stream_client,
            base_url,
            subscribe_delay: Duration::ZERO,
        })
    }

    /// Wait this long before opening each review stream
    pub fn with_subscribe_delay(mut self, delay: Duration) -> Self {
        self.subscribe_delay = delay;
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL under `/api/v1/reviews/{id}`; the id is an opaque path segment
    fn review_url(&self, review_id: &str, rest: &str) -> String {
        self.url(&format!(
            "/api/v1/reviews/{}{}",
            urlencoding::encode(review_id),
            rest
        ))
    }

    /// Subscribe to the update stream of a review.
    ///
    /// The connection is opened when the stream is first polled and closed
    /// when it is dropped.
    pub fn stream_review(&self, review_id: &str) -> StreamEventStream {
        let url = self.review_url(review_id, "/stream");
        tracing::debug!("Subscribing to {}", url);
        let request = self.stream_client.get(url);
        stream::subscribe(request, self.subscribe_delay)
    }
}

/// Decode a JSON response, mapping failure statuses to typed errors
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    review_id: Option<&str>,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = review_id {
            return Err(Error::NotFound(id.to_string()));
        }
    }
    if !status.is_success() {
        tracing::debug!("Review service returned {}: {}", status, body);
        return Err(Error::from_response(status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ReviewsApi for ReviewClient {
    async fn create_review(&self, request: &CreateReviewRequest) -> Result<ReviewResponse> {
        let url = self.url("/api/v1/reviews");
        tracing::info!("Creating review for topic '{}'", request.topic);
        let response = self.client.post(url).json(request).send().await?;
        let review: ReviewResponse = decode(response, None).await?;
        tracing::info!("Created review {}", review.id);
        Ok(review)
    }

    async fn get_review(&self, review_id: &str) -> Result<ReviewResponse> {
        let url = self.review_url(review_id, "");
        let response = self.client.get(url).send().await?;
        decode(response, Some(review_id)).await
    }

    async fn list_reviews(&self, limit: u32, offset: u32) -> Result<Vec<ReviewResponse>> {
        let url = self.url("/api/v1/reviews");
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        decode(response, None).await
    }

    async fn delete_review(&self, review_id: &str) -> Result<()> {
        let url = self.review_url(review_id, "");
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(review_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.url("/health")).send().await?;
        decode(response, None).await
    }
}
