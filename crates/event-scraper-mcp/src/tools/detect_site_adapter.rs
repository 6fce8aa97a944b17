//! Tool: detectSiteAdapter. Which platform adapter would handle a URL.

use std::sync::Arc;

use event_scraper::EventScraper;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "detectSiteAdapter";

#[derive(Debug, Deserialize)]
struct DetectParams {
    url: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Report which site adapter (ticketmaster, eventbrite, facebook, meetup, eventful) \
             matches a URL, without fetching it"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "URL to classify" }
            },
            "required": ["url"]
        }),
    }
}

pub fn execute(args: Value, scraper: &Arc<EventScraper>) -> McpResult<ToolCallResult> {
    let params: DetectParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    let url = super::require_http_url(&params.url)?;

    let adapter = scraper.detect(&url);

    Ok(ToolCallResult::json(&json!({
        "url": url,
        "adapter": adapter.map(|a| a.id()),
    })))
}
