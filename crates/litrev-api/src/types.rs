//! Wire types shared with the review service

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Processing status of a review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ReviewStatus {
    /// `completed` and `failed` are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Completed | ReviewStatus::Failed)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::InProgress => "in_progress",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification tag attached to agent messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Search,
    Summary,
    Critique,
    Planning,
    System,
    Error,
}

impl FromStr for MessageType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "search" => Ok(MessageType::Search),
            "summary" => Ok(MessageType::Summary),
            "critique" => Ok(MessageType::Critique),
            "planning" => Ok(MessageType::Planning),
            "system" => Ok(MessageType::System),
            "error" => Ok(MessageType::Error),
            _ => Err(()),
        }
    }
}

/// Unknown or missing tags become `None` instead of failing the whole message.
fn lenient_message_type<'de, D>(deserializer: D) -> std::result::Result<Option<MessageType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// A message emitted by one of the review agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Producer label, usually an agent name such as `search_agent`
    pub source: String,
    /// Text payload, may contain fenced blocks and markdown links
    pub content: String,
    /// Production time as reported by the producer
    #[serde(default)]
    pub timestamp: String,
    #[serde(
        default,
        deserialize_with = "lenient_message_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_type: Option<MessageType>,
}

impl Message {
    /// Create a message without a type tag
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            timestamp: String::new(),
            message_type: None,
        }
    }

    /// Set the type tag
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Set the producer timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

/// Paper metadata returned with a completed review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication date, usually `YYYY-MM-DD`
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub pdf_url: String,
}

/// Body of `POST /api/v1/reviews`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub topic: String,
    pub num_papers: u32,
    pub model: String,
}

/// Request parameters echoed back by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewRequestInfo {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub papers_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_papers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A review as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: String,
    pub status: ReviewStatus,
    #[serde(default)]
    pub request: ReviewRequestInfo,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// `GET /health` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}
