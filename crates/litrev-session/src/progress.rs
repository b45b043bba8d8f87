//! Research progress derived from the message transcript

use litrev_api::{Message, MessageType};
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?is)```json\s*(.*?)\s*```").unwrap());

static FENCED_ANY: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)```\s*(.*?)\s*```").unwrap());

static ARRAY_SPAN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)\[.*\]").unwrap());

static MARKDOWN_LINK: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\[[^\]]+\]\([^)]+\)").unwrap());

static SUMMARIZER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?i)summarizer").unwrap());

static SPEAKER_PREFIX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)^\s*(summarizer|summarizer_agent|search_agent|system)\s*:\s*").unwrap()
});

/// Source label of the search agent
pub const SEARCH_AGENT: &str = "search_agent";

pub fn is_search_message(message: &Message) -> bool {
    message.source == SEARCH_AGENT
}

/// Summary messages are typed `summary` or come from a summarizer
pub fn is_summary_message(message: &Message) -> bool {
    message.message_type == Some(MessageType::Summary) || SUMMARIZER.is_match(&message.source)
}

/// Extract the paper list a search agent embedded in its message.
///
/// Looks inside a fenced `json` block, then any fenced block, then the whole
/// content. Accepts a bare array, an object with a `papers` array, or the
/// outermost bracketed span.
pub fn parse_search_results(content: &str) -> Option<Vec<Value>> {
    let candidate = FENCED_JSON
        .captures(content)
        .or_else(|| FENCED_ANY.captures(content))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(content);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => return Some(items),
        Ok(Value::Object(mut object)) => {
            if let Some(Value::Array(papers)) = object.remove("papers") {
                return Some(papers);
            }
        }
        _ => {}
    }

    let span = ARRAY_SPAN.find(candidate)?;
    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Phase of the review as inferred from the transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResearchStage {
    #[default]
    Reviewing,
    Selecting,
    Summarizing,
}

impl ResearchStage {
    pub fn label(&self) -> &'static str {
        match self {
            ResearchStage::Reviewing => "Literature review",
            ResearchStage::Selecting => "Selecting papers",
            ResearchStage::Summarizing => "Generating summaries",
        }
    }
}

/// Progress snapshot for an in-progress review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResearchProgress {
    pub stage: ResearchStage,
    pub processed_papers: usize,
    pub total_papers: usize,
}

impl ResearchProgress {
    pub fn from_messages(messages: &[Message]) -> Self {
        let total_papers = messages
            .iter()
            .filter(|m| is_search_message(m))
            .filter_map(|m| parse_search_results(&m.content))
            .map(|papers| papers.len())
            .max()
            .unwrap_or(0);

        let summaries: Vec<&Message> = messages.iter().filter(|m| is_summary_message(m)).collect();

        // Each summarized paper is cited as a markdown link
        let linked: usize = summaries
            .iter()
            .map(|m| MARKDOWN_LINK.find_iter(&m.content).count())
            .sum();
        let mut processed_papers = if linked == 0 { summaries.len() } else { linked };
        if total_papers > 0 {
            processed_papers = processed_papers.min(total_papers);
        }

        let stage = if !summaries.is_empty() {
            ResearchStage::Summarizing
        } else if total_papers > 0 {
            ResearchStage::Selecting
        } else {
            ResearchStage::Reviewing
        };

        Self {
            stage,
            processed_papers,
            total_papers,
        }
    }

    /// Completion percentage, 0 while the paper count is unknown
    pub fn percent(&self) -> u16 {
        if self.total_papers == 0 {
            return 0;
        }
        (self.processed_papers as f64 / self.total_papers as f64 * 100.0).round() as u16
    }
}

/// Messages that make up the review summary.
///
/// Falls back to every non-search, non-error message when no summarizer spoke.
pub fn summary_messages(messages: &[Message]) -> Vec<&Message> {
    let summaries: Vec<&Message> = messages.iter().filter(|m| is_summary_message(m)).collect();
    if !summaries.is_empty() {
        return summaries;
    }
    messages
        .iter()
        .filter(|m| !is_search_message(m) && m.message_type != Some(MessageType::Error))
        .collect()
}

/// Strip a leading speaker label and code fences from summary text
pub fn clean_summary(content: &str) -> String {
    SPEAKER_PREFIX
        .replace(content, "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(content: &str) -> Message {
        Message::new(SEARCH_AGENT, content).with_type(MessageType::Search)
    }

    fn summary(content: &str) -> Message {
        Message::new("summarizer", content)
    }

    #[test]
    fn test_classification() {
        assert!(is_search_message(&search("x")));
        assert!(!is_search_message(&Message::new("Search_Agent", "x")));
        assert!(is_summary_message(&Message::new("Summarizer_Agent", "x")));
        assert!(is_summary_message(
            &Message::new("writer", "x").with_type(MessageType::Summary)
        ));
        assert!(!is_summary_message(&Message::new("critic", "x")));
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "Found papers:\n```json\n[{\"title\":\"A\"},{\"title\":\"B\"}]\n```";
        assert_eq!(parse_search_results(content).map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_parse_unlabelled_fence_with_papers_object() {
        let content = "```\n{\"papers\":[{\"title\":\"A\"}]}\n```";
        assert_eq!(parse_search_results(content).map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_parse_embedded_array() {
        let content = "Results: [{\"title\":\"A\"},{\"title\":\"B\"},{\"title\":\"C\"}] end";
        assert_eq!(parse_search_results(content).map(|p| p.len()), Some(3));
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert_eq!(parse_search_results("searching arxiv"), None);
        assert_eq!(parse_search_results("{\"count\": 3}"), None);
        assert_eq!(parse_search_results("see [a] here"), None);
    }

    #[test]
    fn test_progress_reviewing() {
        let progress = ResearchProgress::from_messages(&[search("searching arxiv")]);
        assert_eq!(progress.stage, ResearchStage::Reviewing);
        assert_eq!(progress.total_papers, 0);
        assert_eq!(progress.percent(), 0);
        assert_eq!(ResearchProgress::from_messages(&[]), ResearchProgress::default());
    }

    #[test]
    fn test_progress_selecting_uses_largest_result() {
        let messages = vec![
            search("[1, 2]"),
            search("```json\n[1, 2, 3, 4]\n```"),
            search("[1]"),
        ];
        let progress = ResearchProgress::from_messages(&messages);
        assert_eq!(progress.stage, ResearchStage::Selecting);
        assert_eq!(progress.total_papers, 4);
        assert_eq!(progress.processed_papers, 0);
    }

    #[test]
    fn test_progress_summarizing_counts_links() {
        let messages = vec![
            search("[1, 2, 3, 4]"),
            summary("**[Paper A](http://a)** is good. [Paper B](http://b) too."),
            summary("[Paper C](http://c)"),
        ];
        let progress = ResearchProgress::from_messages(&messages);
        assert_eq!(progress.stage, ResearchStage::Summarizing);
        assert_eq!(progress.processed_papers, 3);
        assert_eq!(progress.percent(), 75);
    }

    #[test]
    fn test_progress_falls_back_to_message_count_and_caps() {
        let messages = vec![search("[1]"), summary("no links"), summary("none here either")];
        let progress = ResearchProgress::from_messages(&messages);
        assert_eq!(progress.processed_papers, 1);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_summary_messages_fallback() {
        let messages = vec![
            search("[1]"),
            Message::new("critic", "looks fine"),
            Message::new("system", "boom").with_type(MessageType::Error),
        ];
        let picked = summary_messages(&messages);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].source, "critic");

        let messages = vec![Message::new("critic", "c"), summary("s")];
        let picked = summary_messages(&messages);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].content, "s");
    }

    #[test]
    fn test_clean_summary() {
        assert_eq!(clean_summary("  Summarizer: ```text```  "), "text");
        assert_eq!(clean_summary("system:hello"), "hello");
        assert_eq!(clean_summary("critic: keep"), "critic: keep");
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(ResearchStage::Reviewing.label(), "Literature review");
        assert_eq!(ResearchStage::Selecting.label(), "Selecting papers");
        assert_eq!(ResearchStage::Summarizing.label(), "Generating summaries");
    }
}
