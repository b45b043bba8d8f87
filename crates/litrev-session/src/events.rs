//! Session event types

use litrev_api::{Message, ReviewStatus};

/// Changes to the observable state of a [`StreamSession`](crate::StreamSession)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A subscription was opened for a review
    Started { review_id: String },

    /// State was seeded from a persisted completed session
    Restored {
        review_id: String,
        message_count: usize,
    },

    /// A message was appended to the transcript
    MessageAppended { message: Message },

    /// Review status changed
    StatusChanged { status: ReviewStatus },

    /// Error text was set or cleared
    ErrorChanged { error: Option<String> },

    /// The subscription was opened or closed
    StreamingChanged { is_streaming: bool },
}

impl SessionEvent {
    /// Check if this event moves the session into a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::StatusChanged { status } if status.is_terminal())
    }
}
