//! Search form: topic validation and request defaults

use litrev_api::CreateReviewRequest;

/// Shortest accepted topic, in characters
pub const MIN_TOPIC_CHARS: usize = 3;

/// Longest accepted topic, in characters
pub const MAX_TOPIC_CHARS: usize = 500;

pub const DEFAULT_NUM_PAPERS: u32 = 5;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Models offered by the service: (id, label)
pub const MODEL_OPTIONS: &[(&str, &str)] = &[
    ("gpt-4o-mini", "GPT-4o Mini"),
    ("gpt-4o", "GPT-4o"),
    ("gpt-4-turbo", "GPT-4 Turbo"),
];

/// Trim and check a research topic
pub fn validate_topic(input: &str) -> Result<String, String> {
    let topic = input.trim();
    let chars = topic.chars().count();
    if chars < MIN_TOPIC_CHARS {
        return Err(format!(
            "Topic must be at least {} characters long",
            MIN_TOPIC_CHARS
        ));
    }
    if chars > MAX_TOPIC_CHARS {
        return Err(format!(
            "Topic must be at most {} characters long",
            MAX_TOPIC_CHARS
        ));
    }
    Ok(topic.to_string())
}

/// Index of `model` in [`MODEL_OPTIONS`], if offered
pub fn model_index(model: &str) -> Option<usize> {
    MODEL_OPTIONS.iter().position(|(id, _)| *id == model)
}

/// Validate the topic and assemble a create-review request
pub fn build_request(
    topic: &str,
    model: &str,
    num_papers: u32,
) -> Result<CreateReviewRequest, String> {
    let topic = validate_topic(topic)?;
    if num_papers == 0 {
        return Err("Number of papers must be at least 1".to_string());
    }
    Ok(CreateReviewRequest {
        topic,
        num_papers,
        model: model.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_topic() {
        assert_eq!(validate_topic("  llm agents \n"), Ok("llm agents".to_string()));
        assert_eq!(
            validate_topic(" ab "),
            Err("Topic must be at least 3 characters long".to_string())
        );
        assert!(validate_topic(&"x".repeat(500)).is_ok());
        assert_eq!(
            validate_topic(&"x".repeat(501)),
            Err("Topic must be at most 500 characters long".to_string())
        );
        // Counted in characters, not bytes
        assert!(validate_topic("äöü").is_ok());
    }

    #[test]
    fn test_build_request() {
        let request = build_request(" graph neural networks ", "gpt-4o", 5).unwrap();
        assert_eq!(request.topic, "graph neural networks");
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.num_papers, 5);
        assert!(build_request("gnn", "gpt-4o", 0).is_err());
    }

    #[test]
    fn test_model_index() {
        assert_eq!(model_index(DEFAULT_MODEL), Some(0));
        assert_eq!(model_index("gpt-4-turbo"), Some(2));
        assert_eq!(model_index("claude"), None);
    }
}
