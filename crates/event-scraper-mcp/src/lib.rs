//! Event Scraper MCP Server: structured event data for LLM agents.

pub mod config;
pub mod protocol;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_listen_addr, resolve_token};
pub use protocol::ProtocolHandler;
pub use transport::StdioTransport;
