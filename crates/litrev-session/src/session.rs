//! Review stream session: subscription lifecycle, transcript, persistence

use futures::StreamExt;
use litrev_api::{Message, ReviewStatus, StreamEvent, StreamEventStream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    error::{Error, Result},
    events::SessionEvent,
    store::SessionStore,
    transport::Transport,
};

/// Store key of the persisted session record
pub const SESSION_KEY: &str = "litrev.review-session";

/// Error text for an `error` event whose payload is missing or not JSON
pub const CONNECTION_ERROR: &str = "Connection error occurred";

/// Error text for an `error` event whose JSON payload has no message
pub const GENERIC_ERROR: &str = "An error occurred";

/// Error text for a transport that closed without a terminal event
pub const CONNECTION_CLOSED: &str = "Connection closed";

/// Record written to the session store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub review_id: String,
    pub messages: Vec<Message>,
    pub status: ReviewStatus,
}

/// The one live subscription; dropping it closes the connection
struct Subscription {
    review_id: String,
    events: StreamEventStream,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("Closing subscription for review {}", self.review_id);
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

/// Owns the live update stream of one review.
///
/// All mutation happens through `&mut self`, so at most one subscription can
/// exist: `start` drops the previous one before the transport is asked for a
/// new one.
pub struct StreamSession {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    review_id: Option<String>,
    messages: Vec<Message>,
    status: ReviewStatus,
    is_streaming: bool,
    error: Option<String>,
    subscription: Option<Subscription>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl StreamSession {
    /// Create an idle session
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            transport,
            store,
            review_id: None,
            messages: Vec::new(),
            status: ReviewStatus::Pending,
            is_streaming: false,
            error: None,
            subscription: None,
            event_tx,
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Review currently tracked, if any
    pub fn review_id(&self) -> Option<&str> {
        self.review_id.as_deref()
    }

    /// Transcript in arrival order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    /// True while a subscription is open and no terminal event arrived
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Last error text
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start following `review_id`.
    ///
    /// Any open subscription is closed first. A persisted completed session
    /// for the same review is restored instead of opening a new stream.
    pub fn start(&mut self, review_id: &str) -> Result<()> {
        if review_id.trim().is_empty() {
            return Err(Error::InvalidReviewId);
        }

        self.close_subscription();

        if let Some(stored) = self.load_persisted() {
            if stored.review_id == review_id && stored.status == ReviewStatus::Completed {
                self.restore(stored);
                return Ok(());
            }
        }

        self.review_id = Some(review_id.to_string());
        self.messages.clear();
        self.set_status(ReviewStatus::InProgress);
        self.set_error(None);

        match self.transport.subscribe(review_id) {
            Ok(events) => {
                tracing::info!("Streaming review {}", review_id);
                self.subscription = Some(Subscription {
                    review_id: review_id.to_string(),
                    events,
                });
                self.set_streaming(true);
                self.emit(SessionEvent::Started {
                    review_id: review_id.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("Failed to subscribe to review {}: {}", review_id, e);
                self.set_error(Some(e.to_string()));
                self.set_status(ReviewStatus::Failed);
                self.persist();
            }
        }

        Ok(())
    }

    /// Close the active subscription, if any. State is left as is.
    pub fn stop(&mut self) {
        self.close_subscription();
    }

    /// Erase the persisted record. In-memory state is not affected.
    pub fn clear_session(&self) -> Result<()> {
        self.store.delete(SESSION_KEY)
    }

    /// Review id of the persisted record, if one exists
    pub fn stored_review_id(&self) -> Option<String> {
        self.load_persisted().map(|s| s.review_id)
    }

    /// Read the persisted record; unreadable records count as absent
    pub fn load_persisted(&self) -> Option<PersistedSession> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!("Ignoring malformed persisted session: {}", e);
                None
            }
        }
    }

    /// Await the next event of the active subscription.
    ///
    /// Returns `None` when no subscription is open. A stream that ends
    /// without a terminal event is reported as [`StreamEvent::Closed`].
    /// Cancel-safe.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let subscription = self.subscription.as_mut()?;
        match subscription.events.next().await {
            Some(event) => Some(event),
            None => {
                self.subscription = None;
                Some(StreamEvent::Closed)
            }
        }
    }

    /// Receive and apply one event. Returns false when nothing is streaming.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.on_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply events until the subscription closes
    pub async fn run_to_end(&mut self) {
        while self.pump().await {}
    }

    /// Apply one transport event
    pub fn on_event(&mut self, event: StreamEvent) {
        if !self.is_streaming {
            tracing::debug!("Ignoring {:?} while not streaming", event);
            return;
        }

        match event {
            StreamEvent::Message { data } => match serde_json::from_str::<Message>(&data) {
                Ok(message) => {
                    self.messages.push(message.clone());
                    self.emit(SessionEvent::MessageAppended { message });
                    self.persist();
                }
                Err(e) => {
                    tracing::debug!("Dropping malformed message event: {}", e);
                }
            },
            StreamEvent::Complete { .. } => {
                tracing::info!(
                    "Review {} completed with {} messages",
                    self.review_id.as_deref().unwrap_or_default(),
                    self.messages.len()
                );
                self.finish(ReviewStatus::Completed, None);
            }
            StreamEvent::Error { data } => {
                let text = error_text(data.as_deref());
                tracing::warn!("Review stream reported an error: {}", text);
                self.finish(ReviewStatus::Failed, Some(text));
            }
            StreamEvent::Closed => {
                tracing::warn!("Review stream closed unexpectedly");
                self.finish(ReviewStatus::Failed, Some(CONNECTION_CLOSED.to_string()));
            }
        }
    }

    fn finish(&mut self, status: ReviewStatus, error: Option<String>) {
        if error.is_some() {
            self.set_error(error);
        }
        self.set_status(status);
        self.close_subscription();
        self.persist();
    }

    fn restore(&mut self, stored: PersistedSession) {
        tracing::info!(
            "Restored completed review {} ({} messages)",
            stored.review_id,
            stored.messages.len()
        );
        let message_count = stored.messages.len();
        self.review_id = Some(stored.review_id.clone());
        self.messages = stored.messages;
        self.set_status(stored.status);
        self.set_error(None);
        self.emit(SessionEvent::Restored {
            review_id: stored.review_id,
            message_count,
        });
    }

    fn close_subscription(&mut self) {
        self.subscription = None;
        self.set_streaming(false);
    }

    fn persist(&self) {
        let Some(review_id) = self.review_id.clone() else {
            return;
        };
        if self.messages.is_empty() {
            return;
        }

        let record = PersistedSession {
            review_id,
            messages: self.messages.clone(),
            status: self.status,
        };
        let result = serde_json::to_string(&record)
            .map_err(Error::from)
            .and_then(|json| self.store.set(SESSION_KEY, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist session: {}", e);
        }
    }

    fn set_status(&mut self, status: ReviewStatus) {
        if self.status != status {
            self.status = status;
            self.emit(SessionEvent::StatusChanged { status });
        }
    }

    fn set_error(&mut self, error: Option<String>) {
        if self.error != error {
            self.error = error.clone();
            self.emit(SessionEvent::ErrorChanged { error });
        }
    }

    fn set_streaming(&mut self, is_streaming: bool) {
        if self.is_streaming != is_streaming {
            self.is_streaming = is_streaming;
            self.emit(SessionEvent::StreamingChanged { is_streaming });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }
}

/// Error text carried by an `error` event payload
fn error_text(data: Option<&str>) -> String {
    let Some(data) = data else {
        return CONNECTION_ERROR.to_string();
    };
    match serde_json::from_str::<ErrorPayload>(data) {
        Ok(ErrorPayload {
            error: Some(text), ..
        }) if !text.is_empty() => text,
        Ok(_) => GENERIC_ERROR.to_string(),
        Err(_) => CONNECTION_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What one subscription will deliver
    #[derive(Default)]
    struct Script {
        events: Vec<StreamEvent>,
        /// Keep the stream pending after the scripted events instead of ending it
        hold_open: bool,
    }

    /// Decrements the live-subscription counter when the stream is dropped
    struct LiveGuard(Arc<AtomicUsize>);

    impl Drop for LiveGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// A transport replaying scripted events and tracking live subscriptions
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<VecDeque<Script>>,
        opened: Mutex<Vec<String>>,
        live: Arc<AtomicUsize>,
        max_live: AtomicUsize,
        fail: bool,
    }

    impl ScriptedTransport {
        fn with_scripts(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn opened(&self) -> Vec<String> {
            self.opened.lock().clone()
        }

        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        fn subscribe(&self, review_id: &str) -> Result<StreamEventStream> {
            if self.fail {
                return Err(Error::Api(litrev_api::Error::NotFound(review_id.to_string())));
            }
            self.opened.lock().push(review_id.to_string());
            let now_live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(now_live, Ordering::SeqCst);

            let script = self.scripts.lock().pop_front().unwrap_or(Script {
                events: vec![],
                hold_open: true,
            });
            let guard = LiveGuard(Arc::clone(&self.live));

            Ok(Box::pin(async_stream::stream! {
                let _guard = guard;
                for event in script.events {
                    yield event;
                }
                if script.hold_open {
                    futures::future::pending::<()>().await;
                }
            }))
        }
    }

    fn message_event(source: &str, content: &str) -> StreamEvent {
        StreamEvent::Message {
            data: serde_json::json!({
                "source": source,
                "content": content,
                "timestamp": "2025-02-10T10:30:00Z",
                "message_type": "system"
            })
            .to_string(),
        }
    }

    fn make_session(transport: Arc<ScriptedTransport>) -> (StreamSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = StreamSession::new(transport, store.clone());
        (session, store)
    }

    fn persisted(store: &MemoryStore) -> Option<PersistedSession> {
        store
            .get(SESSION_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[test]
    fn test_start_rejects_empty_id() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport.clone());

        assert!(matches!(session.start(""), Err(Error::InvalidReviewId)));
        assert!(matches!(session.start("   "), Err(Error::InvalidReviewId)));
        assert!(transport.opened().is_empty());
        assert_eq!(session.status(), ReviewStatus::Pending);
    }

    #[test]
    fn test_start_opens_subscription() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport.clone());

        session.start("r1").unwrap();

        assert_eq!(transport.opened(), vec!["r1".to_string()]);
        assert_eq!(session.status(), ReviewStatus::InProgress);
        assert!(session.is_streaming());
        assert_eq!(session.error(), None);
        assert_eq!(session.review_id(), Some("r1"));
    }

    #[test]
    fn test_messages_accumulate_in_order() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();

        for i in 0..5 {
            session.on_event(message_event("search_agent", &format!("m{}", i)));
            assert!(session.is_streaming());
        }

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert_eq!(session.status(), ReviewStatus::InProgress);
    }

    #[test]
    fn test_complete_without_messages() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport.clone());
        session.start("r1").unwrap();

        session.on_event(StreamEvent::Complete { data: "{}".into() });

        assert_eq!(session.status(), ReviewStatus::Completed);
        assert!(!session.is_streaming());
        assert_eq!(transport.live(), 0);
        // Nothing to persist without messages
        assert!(persisted(&store).is_none());
    }

    #[test]
    fn test_complete_after_messages_persists() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("search_agent", "a"));
        session.on_event(message_event("summarizer", "b"));
        session.on_event(StreamEvent::Complete { data: "{}".into() });

        let record = persisted(&store).unwrap();
        assert_eq!(record.review_id, "r1");
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.status, ReviewStatus::Completed);
    }

    #[test]
    fn test_messages_after_complete_are_ignored() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));
        session.on_event(StreamEvent::Complete { data: String::new() });
        session.on_event(message_event("a", "2"));

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.status(), ReviewStatus::Completed);
    }

    #[test]
    fn test_error_event_with_payload() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport.clone());
        session.start("r1").unwrap();

        session.on_event(StreamEvent::Error {
            data: Some(r#"{"error":"boom"}"#.into()),
        });

        assert_eq!(session.error(), Some("boom"));
        assert_eq!(session.status(), ReviewStatus::Failed);
        assert!(!session.is_streaming());
        assert_eq!(transport.live(), 0);
    }

    #[test]
    fn test_error_event_without_usable_payload() {
        for data in [None, Some("not json".to_string())] {
            let transport = Arc::new(ScriptedTransport::default());
            let (mut session, _) = make_session(transport);
            session.start("r1").unwrap();

            session.on_event(StreamEvent::Error { data });

            assert_eq!(session.error(), Some(CONNECTION_ERROR));
            assert_eq!(session.status(), ReviewStatus::Failed);
            assert!(!session.is_streaming());
        }
    }

    #[test]
    fn test_error_event_json_without_message() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();

        session.on_event(StreamEvent::Error {
            data: Some(r#"{"type":"error"}"#.into()),
        });

        assert_eq!(session.error(), Some(GENERIC_ERROR));
        assert_eq!(session.status(), ReviewStatus::Failed);
    }

    #[test]
    fn test_unexpected_close() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));

        session.on_event(StreamEvent::Closed);

        assert_eq!(session.error(), Some(CONNECTION_CLOSED));
        assert_eq!(session.status(), ReviewStatus::Failed);
        assert!(!session.is_streaming());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_malformed_messages_are_dropped() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));

        session.on_event(StreamEvent::Message { data: "{not json".into() });
        session.on_event(StreamEvent::Message {
            data: r#"{"content":"no source"}"#.into(),
        });
        session.on_event(StreamEvent::Message {
            data: r#"{"source":"no content"}"#.into(),
        });
        session.on_event(StreamEvent::Message {
            data: r#"{"type":"complete","session_id":"r1"}"#.into(),
        });

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.error(), None);
        assert_eq!(session.status(), ReviewStatus::InProgress);
        assert!(session.is_streaming());
    }

    #[test]
    fn test_restart_closes_previous_subscription_first() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport.clone());

        session.start("r1").unwrap();
        session.start("r1").unwrap();
        session.start("r2").unwrap();

        assert_eq!(transport.opened(), vec!["r1", "r1", "r2"]);
        assert_eq!(transport.live(), 1);
        assert_eq!(transport.max_live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_resets_transcript_and_error() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));
        session.on_event(StreamEvent::Error { data: None });

        session.start("r2").unwrap();

        assert!(session.messages().is_empty());
        assert_eq!(session.error(), None);
        assert_eq!(session.status(), ReviewStatus::InProgress);
        assert!(session.is_streaming());
    }

    #[test]
    fn test_restore_completed_session_without_subscribing() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport.clone());
        let record = PersistedSession {
            review_id: "R1".into(),
            messages: vec![
                Message::new("search_agent", "one"),
                Message::new("summarizer", "two"),
                Message::new("summarizer", "three"),
            ],
            status: ReviewStatus::Completed,
        };
        store
            .set(SESSION_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();

        session.start("R1").unwrap();

        assert!(transport.opened().is_empty());
        assert_eq!(session.messages(), record.messages.as_slice());
        assert_eq!(session.status(), ReviewStatus::Completed);
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_incomplete_persisted_session_is_restreamed() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport.clone());
        let record = PersistedSession {
            review_id: "R1".into(),
            messages: vec![Message::new("search_agent", "one")],
            status: ReviewStatus::InProgress,
        };
        store
            .set(SESSION_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();

        session.start("R1").unwrap();

        assert_eq!(transport.opened(), vec!["R1".to_string()]);
        assert!(session.messages().is_empty());
        assert!(session.is_streaming());
    }

    #[test]
    fn test_persisted_session_for_other_review_is_ignored() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport.clone());
        let record = PersistedSession {
            review_id: "R1".into(),
            messages: vec![Message::new("a", "b")],
            status: ReviewStatus::Completed,
        };
        store
            .set(SESSION_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();

        session.start("R2").unwrap();

        assert_eq!(transport.opened(), vec!["R2".to_string()]);
        assert_eq!(session.status(), ReviewStatus::InProgress);
    }

    #[test]
    fn test_persisted_record_uses_camel_case() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, store) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));

        let raw = store.get(SESSION_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["reviewId"], "r1");
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["messages"][0]["content"], "1");
    }

    #[test]
    fn test_clear_session_keeps_memory_state() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));
        assert_eq!(session.stored_review_id().as_deref(), Some("r1"));

        session.clear_session().unwrap();

        assert_eq!(session.stored_review_id(), None);
        assert_eq!(session.messages().len(), 1);
        assert!(session.is_streaming());
    }

    #[test]
    fn test_malformed_persisted_record_counts_as_absent() {
        let transport = Arc::new(ScriptedTransport::default());
        let (session, store) = make_session(transport);
        store.set(SESSION_KEY, "garbage").unwrap();
        assert_eq!(session.stored_review_id(), None);
    }

    #[test]
    fn test_stop_is_idempotent_and_keeps_state() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport.clone());
        session.stop();

        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));
        session.stop();
        session.stop();

        assert_eq!(transport.live(), 0);
        assert!(!session.is_streaming());
        assert_eq!(session.status(), ReviewStatus::InProgress);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_transport_failure_marks_failed() {
        let transport = Arc::new(ScriptedTransport::failing());
        let (mut session, _) = make_session(transport);

        session.start("r1").unwrap();

        assert_eq!(session.status(), ReviewStatus::Failed);
        assert!(!session.is_streaming());
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_run_to_end_with_scripted_stream() {
        let transport = Arc::new(ScriptedTransport::with_scripts(vec![Script {
            events: vec![
                message_event("search_agent", "searching"),
                StreamEvent::Message { data: "junk".into() },
                message_event("summarizer", "summary"),
                StreamEvent::Complete { data: "{}".into() },
                message_event("late", "ignored"),
            ],
            hold_open: true,
        }]));
        let (mut session, _) = make_session(transport.clone());

        session.start("r1").unwrap();
        session.run_to_end().await;

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.status(), ReviewStatus::Completed);
        assert!(!session.is_streaming());
        assert_eq!(transport.live(), 0);
        assert!(session.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ending_without_terminal_event() {
        let transport = Arc::new(ScriptedTransport::with_scripts(vec![Script {
            events: vec![message_event("search_agent", "searching")],
            hold_open: false,
        }]));
        let (mut session, _) = make_session(transport);

        session.start("r1").unwrap();
        session.run_to_end().await;

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.status(), ReviewStatus::Failed);
        assert_eq!(session.error(), Some(CONNECTION_CLOSED));
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut session, _) = make_session(transport);
        let mut rx = session.subscribe();

        session.start("r1").unwrap();
        session.on_event(message_event("a", "1"));
        session.on_event(StreamEvent::Complete { data: String::new() });

        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }

        assert_eq!(
            received.first(),
            Some(&SessionEvent::StatusChanged {
                status: ReviewStatus::InProgress
            })
        );
        assert!(received.contains(&SessionEvent::Started {
            review_id: "r1".into()
        }));
        assert!(received
            .iter()
            .any(|e| matches!(e, SessionEvent::MessageAppended { message } if message.content == "1")));
        assert!(received.iter().any(SessionEvent::is_terminal));
        assert_eq!(
            received.last(),
            Some(&SessionEvent::StreamingChanged {
                is_streaming: false
            })
        );
    }
}
