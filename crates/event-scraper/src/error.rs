//! Error types for the fetch stages of the pipeline.
//!
//! Only transport and rendering failures are errors. Malformed structured
//! data and pages with nothing extractable are ordinary outcomes and never
//! surface here.

use std::fmt;

/// Which fetch stage produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStage {
    /// Plain HTTP GET without script execution.
    Static,
    /// Headless-browser render with script execution.
    Rendered,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Static => write!(f, "static"),
            FetchStage::Rendered => write!(f, "rendered"),
        }
    }
}

/// Errors that can occur while fetching or rendering a page.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("{stage} fetch timed out after {timeout_ms}ms")]
    Timeout { stage: FetchStage, timeout_ms: u64 },

    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl ScrapeError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> FetchStage {
        match self {
            ScrapeError::Http(_) | ScrapeError::Status { .. } => FetchStage::Static,
            ScrapeError::Timeout { stage, .. } => *stage,
            ScrapeError::BrowserUnavailable(_)
            | ScrapeError::BrowserLaunch(_)
            | ScrapeError::Navigation(_)
            | ScrapeError::Render(_) => FetchStage::Rendered,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ScrapeError::Timeout { .. } => true,
            ScrapeError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_of_errors() {
        let status = ScrapeError::Status {
            url: "https://example.com".to_string(),
            status: 404,
        };
        assert_eq!(status.stage(), FetchStage::Static);
        assert_eq!(
            ScrapeError::Render("boom".to_string()).stage(),
            FetchStage::Rendered
        );
        let timeout = ScrapeError::Timeout {
            stage: FetchStage::Rendered,
            timeout_ms: 30_000,
        };
        assert_eq!(timeout.stage(), FetchStage::Rendered);
        assert!(timeout.is_timeout());
    }

    #[test]
    fn test_error_messages() {
        let timeout = ScrapeError::Timeout {
            stage: FetchStage::Static,
            timeout_ms: 250,
        };
        assert_eq!(timeout.to_string(), "static fetch timed out after 250ms");

        let status = ScrapeError::Status {
            url: "https://example.com/e/1".to_string(),
            status: 503,
        };
        assert_eq!(status.to_string(), "HTTP status 503 for https://example.com/e/1");
    }
}
