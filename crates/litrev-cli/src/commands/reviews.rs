use litrev_api::{Error, ReviewsApi};
use litrev_tui::format::{format_date, truncate_text};

/// Table of stored reviews, newest as returned by the service
pub async fn list_reviews(api: &dyn ReviewsApi, limit: u32, offset: u32) -> anyhow::Result<String> {
    let reviews = api.list_reviews(limit, offset).await?;
    if reviews.is_empty() {
        return Ok("No reviews found.".to_string());
    }

    let mut lines = vec![format!("{:<38} {:<12} {:<20} TOPIC", "ID", "STATUS", "CREATED")];
    for review in &reviews {
        let created = review
            .created_at
            .as_deref()
            .map(format_date)
            .unwrap_or_default();
        lines.push(format!(
            "{:<38} {:<12} {:<20} {}",
            review.id,
            review.status.as_str(),
            created,
            truncate_text(&review.request.topic, 60)
        ));
    }
    Ok(lines.join("\n"))
}

/// Delete a review by id
pub async fn delete_review(api: &dyn ReviewsApi, review_id: &str) -> anyhow::Result<String> {
    match api.delete_review(review_id).await {
        Ok(()) => Ok(format!("Deleted review {}", review_id)),
        Err(Error::NotFound(id)) => Err(anyhow::anyhow!("Review {} not found", id)),
        Err(e) => Err(e.into()),
    }
}
