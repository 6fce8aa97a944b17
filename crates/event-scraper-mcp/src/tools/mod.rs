//! MCP tool implementations.

pub mod detect_site_adapter;
pub mod registry;
pub mod scrape_event_page;

pub use registry::ToolRegistry;

use crate::types::{McpError, McpResult};

/// Trimmed `url` argument; must be an absolute http(s) URL.
pub(crate) fn require_http_url(raw: &str) -> McpResult<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(McpError::InvalidParams("'url' must not be empty".to_string()));
    }
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(McpError::InvalidParams(format!(
            "'url' must be an http or https URL, got {url:?}"
        )));
    }
    Ok(url.to_string())
}
