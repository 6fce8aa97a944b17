//! MCP protocol handling: JSON-RPC dispatch, handshake, validation.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
