//! Tool: scrapeEventPage. Scrape event details from an event page URL.

use std::sync::Arc;

use event_scraper::EventScraper;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "scrapeEventPage";

#[derive(Debug, Deserialize)]
struct ScrapeParams {
    url: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Scrape event details from an event webpage URL. Tries a static fetch first \
             and falls back to headless-browser rendering when the page is too thin."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL of the event page"
                }
            },
            "required": ["url"]
        }),
    }
}

/// Runs the full pipeline. Fetch failures are part of the result
/// (`scrape_method: "failed"`), not tool errors.
pub async fn execute(args: Value, scraper: &Arc<EventScraper>) -> McpResult<ToolCallResult> {
    let params: ScrapeParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    let url = super::require_http_url(&params.url)?;

    let result = scraper.extract(&url).await;
    tracing::info!(url = %url, method = %result.method, "scrapeEventPage");

    Ok(ToolCallResult::json(&result))
}
