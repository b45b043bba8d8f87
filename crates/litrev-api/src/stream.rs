//! Review update stream: server-sent events turned into typed stream events

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;

/// Events delivered by a review subscription.
///
/// Payloads are kept raw; interpreting them (and tolerating malformed ones)
/// is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Unnamed or `message` event carrying an agent message as JSON
    Message { data: String },
    /// `complete` event: the review finished successfully
    Complete { data: String },
    /// `error` event: the review failed; payload is `{"error": ...}` or absent
    Error { data: Option<String> },
    /// Transport closed without a terminal event
    Closed,
}

impl StreamEvent {
    /// Map a named SSE event to a stream event. Unknown names yield `None`.
    pub fn from_sse(event: &str, data: String) -> Option<Self> {
        match event {
            "" | "message" => Some(StreamEvent::Message { data }),
            "complete" => Some(StreamEvent::Complete { data }),
            "error" => {
                let data = if data.trim().is_empty() { None } else { Some(data) };
                Some(StreamEvent::Error { data })
            }
            _ => None,
        }
    }

    /// Check if this event ends the stream
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Message { .. })
    }
}

/// A stream of review events
pub type StreamEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Open an SSE subscription lazily.
///
/// Nothing is sent until the returned stream is first polled; `delay` is
/// awaited before connecting. The stream never reconnects: after a terminal
/// event or a transport failure it ends, the latter reported as `Closed`.
pub fn subscribe(request: reqwest::RequestBuilder, delay: Duration) -> StreamEventStream {
    Box::pin(async_stream::stream! {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut event_source = match EventSource::new(request) {
            Ok(es) => es,
            Err(e) => {
                tracing::warn!("Failed to create event source: {}", e);
                yield StreamEvent::Closed;
                return;
            }
        };

        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {
                    tracing::debug!("Review stream opened");
                }
                Ok(Event::Message(message)) => {
                    let Some(stream_event) = StreamEvent::from_sse(&message.event, message.data)
                    else {
                        tracing::debug!("Ignoring SSE event '{}'", message.event);
                        continue;
                    };
                    let terminal = stream_event.is_terminal();
                    yield stream_event;
                    if terminal {
                        event_source.close();
                        return;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    tracing::debug!("Review stream ended by server");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Review stream transport error: {}", e);
                    break;
                }
            }
        }

        event_source.close();
        yield StreamEvent::Closed;
    })
}
