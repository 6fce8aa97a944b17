//! Tool registration and dispatch.

use std::sync::Arc;

use event_scraper::EventScraper;
use serde_json::Value;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{detect_site_adapter, scrape_event_page};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            scrape_event_page::definition(),
            detect_site_adapter::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        scraper: &Arc<EventScraper>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            scrape_event_page::NAME => scrape_event_page::execute(args, scraper).await,
            detect_site_adapter::NAME => detect_site_adapter::execute(args, scraper),
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
