use litrev_api::ReviewsApi;

/// Probe the service and describe its state
pub async fn health(api: &dyn ReviewsApi, base_url: &str) -> anyhow::Result<String> {
    let response = api.health().await?;
    let mut text = format!("{} is {}", base_url, response.status);
    if !response.version.is_empty() {
        text.push_str(&format!(" (version {})", response.version));
    }
    Ok(text)
}
