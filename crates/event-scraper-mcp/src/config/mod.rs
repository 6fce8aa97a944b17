//! Configuration loading and resolution for the server surfaces.

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

pub const ENV_HOST: &str = "MCP_HOST";
pub const ENV_PORT: &str = "MCP_PORT";
pub const ENV_TOKEN: &str = "EVENT_SCRAPER_TOKEN";

/// Resolve the HTTP listen address: explicit flag, then `MCP_HOST`/`MCP_PORT`,
/// then `0.0.0.0:8765`.
pub fn resolve_listen_addr(explicit: Option<&str>) -> String {
    resolve_listen_addr_with(explicit, |key| std::env::var(key).ok())
}

pub fn resolve_listen_addr_with<F>(explicit: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = explicit {
        return addr.to_string();
    }

    let host = lookup(ENV_HOST)
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match lookup(ENV_PORT) {
        Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
            tracing::warn!("invalid {ENV_PORT} value {raw:?}, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    };

    format!("{host}:{port}")
}

/// Resolve the bearer token: CLI flag > env var. Empty values disable auth.
pub fn resolve_token(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var(ENV_TOKEN).ok())
        .filter(|t| !t.is_empty())
}
