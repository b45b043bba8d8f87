//! Line-oriented mode: follow one review on stdout

use anyhow::anyhow;
use litrev_api::{CreateReviewRequest, Paper, ReviewStatus, ReviewsApi};
use litrev_session::progress::{clean_summary, summary_messages};
use litrev_session::{SessionEvent, StreamSession};
use litrev_tui::format::{format_authors, format_date, truncate_text};
use std::io::Write;
use tokio::sync::broadcast::error::TryRecvError;

/// What the plain run should follow
pub enum Target {
    /// Create a new review first
    Create(CreateReviewRequest),
    /// Continue the review stored in the session
    Resume,
}

/// Create or resume a review, print its messages as they arrive, then the
/// outcome with summary and papers.
pub async fn run<W: Write>(
    out: &mut W,
    api: &dyn ReviewsApi,
    session: &mut StreamSession,
    target: Target,
) -> anyhow::Result<()> {
    let review_id = match target {
        Target::Create(request) => {
            writeln!(out, "Starting review: {}", request.topic)?;
            if let Err(e) = session.clear_session() {
                tracing::warn!("Failed to clear session: {}", e);
            }
            let review = api
                .create_review(&request)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            review.id
        }
        Target::Resume => session
            .stored_review_id()
            .ok_or_else(|| anyhow!("No stored review to resume"))?,
    };

    let mut events = session.subscribe();
    session.start(&review_id)?;
    writeln!(out, "Review {}", review_id)?;

    loop {
        loop {
            match events.try_recv() {
                Ok(event) => print_event(out, session, &event)?,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} session events", skipped);
                }
                Err(_) => break,
            }
        }
        if !session.pump().await {
            break;
        }
    }
    out.flush()?;

    match session.status() {
        ReviewStatus::Completed => {
            writeln!(out)?;
            writeln!(out, "Review completed.")?;
            print_summary(out, session)?;
            match api.get_review(&review_id).await {
                Ok(review) => print_papers(out, &review.papers)?,
                Err(e) => writeln!(out, "Failed to load papers: {}", e)?,
            }
            Ok(())
        }
        ReviewStatus::Failed => Err(anyhow!(
            "Review failed: {}",
            session.error().unwrap_or("unknown error")
        )),
        status => Err(anyhow!("Review stopped while {}", status)),
    }
}

fn print_event<W: Write>(
    out: &mut W,
    session: &StreamSession,
    event: &SessionEvent,
) -> std::io::Result<()> {
    match event {
        SessionEvent::MessageAppended { message } => {
            writeln!(out, "[{}] {}", message.source, message.content)
        }
        SessionEvent::Restored { message_count, .. } => {
            writeln!(out, "Restored {} messages", message_count)?;
            for message in session.messages() {
                writeln!(out, "[{}] {}", message.source, message.content)?;
            }
            Ok(())
        }
        SessionEvent::ErrorChanged { error: Some(error) } => writeln!(out, "Error: {}", error),
        _ => Ok(()),
    }
}

fn print_summary<W: Write>(out: &mut W, session: &StreamSession) -> std::io::Result<()> {
    match summary_messages(session.messages()).last() {
        Some(message) => {
            writeln!(out)?;
            writeln!(out, "Literature Review Summary")?;
            writeln!(out, "{}", clean_summary(&message.content))
        }
        None => writeln!(out, "No summaries available yet"),
    }
}

fn print_papers<W: Write>(out: &mut W, papers: &[Paper]) -> std::io::Result<()> {
    writeln!(out)?;
    if papers.is_empty() {
        return writeln!(out, "No papers found");
    }
    writeln!(out, "Papers ({})", papers.len())?;
    for (i, paper) in papers.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, paper.title.trim())?;
        let mut meta = format_authors(&paper.authors);
        if !paper.published.is_empty() {
            meta.push_str(" · ");
            meta.push_str(&format_date(&paper.published));
        }
        writeln!(out, "   {}", meta)?;
        if !paper.summary.is_empty() {
            writeln!(out, "   {}", truncate_text(&paper.summary.replace('\n', " "), 300))?;
        }
        if !paper.pdf_url.is_empty() {
            writeln!(out, "   {}", paper.pdf_url)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::{FakeApi, ScriptTransport, review};
    use litrev_api::StreamEvent;
    use litrev_session::{MemoryStore, SessionStore};
    use std::sync::Arc;

    fn message(source: &str, content: &str) -> StreamEvent {
        StreamEvent::Message {
            data: serde_json::json!({"source": source, "content": content}).to_string(),
        }
    }

    fn request() -> CreateReviewRequest {
        CreateReviewRequest {
            topic: "graph neural networks".into(),
            num_papers: 5,
            model: "gpt-4o-mini".into(),
        }
    }

    #[tokio::test]
    async fn test_completed_review() {
        let api = FakeApi::default();
        let transport = Arc::new(ScriptTransport::new(vec![
            message("search_agent", "no papers yet"),
            message("summarizer", "summarizer: ```GNNs generalize CNNs```"),
            StreamEvent::Complete { data: "{}".into() },
        ]));
        let mut session = StreamSession::new(transport, Arc::new(MemoryStore::new()));
        let mut out = Vec::new();

        run(&mut out, &api, &mut session, Target::Create(request()))
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Starting review: graph neural networks"));
        assert!(text.contains("Review r1"));
        assert!(text.contains("[search_agent] no papers yet"));
        assert!(text.contains("Review completed."));
        assert!(text.contains("GNNs generalize CNNs\n"));
        assert!(text.contains("No papers found"));
    }

    #[tokio::test]
    async fn test_failed_review_is_an_error() {
        let api = FakeApi::default();
        let transport = Arc::new(ScriptTransport::new(vec![StreamEvent::Error {
            data: Some(r#"{"error":"Model quota exceeded"}"#.into()),
        }]));
        let mut session = StreamSession::new(transport, Arc::new(MemoryStore::new()));
        let mut out = Vec::new();

        let err = run(&mut out, &api, &mut session, Target::Create(request()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Review failed: Model quota exceeded");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: Model quota exceeded"));
    }

    #[tokio::test]
    async fn test_new_review_forgets_stored_review() {
        let api = FakeApi::default();
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                litrev_session::SESSION_KEY,
                r#"{"reviewId":"old","messages":[{"source":"summarizer","content":"done"}],"status":"completed"}"#,
            )
            .unwrap();
        let transport = Arc::new(ScriptTransport::new(vec![StreamEvent::Closed]));
        let mut session = StreamSession::new(transport, store);

        let err = run(&mut Vec::new(), &api, &mut session, Target::Create(request()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Review failed: Connection closed");
        assert_eq!(session.stored_review_id(), None);
    }

    #[tokio::test]
    async fn test_resume_restores_completed_review() {
        let api = FakeApi::default();
        api.reviews
            .lock()
            .unwrap()
            .push(review("r9", "llm agents", ReviewStatus::Completed));
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                litrev_session::SESSION_KEY,
                r#"{"reviewId":"r9","messages":[{"source":"summarizer","content":"done"}],"status":"completed"}"#,
            )
            .unwrap();
        let transport = Arc::new(ScriptTransport::new(vec![]));
        let mut session = StreamSession::new(transport.clone(), store);
        let mut out = Vec::new();

        run(&mut out, &api, &mut session, Target::Resume).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Restored 1 messages"));
        assert!(text.contains("[summarizer] done"));
        assert_eq!(transport.opened(), 0);
    }

    #[tokio::test]
    async fn test_resume_without_stored_review() {
        let api = FakeApi::default();
        let transport = Arc::new(ScriptTransport::new(vec![]));
        let mut session = StreamSession::new(transport, Arc::new(MemoryStore::new()));
        let err = run(&mut Vec::new(), &api, &mut session, Target::Resume)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No stored review to resume");
    }
}
