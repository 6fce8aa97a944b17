//! HTTP transport: `POST /mcp` with optional bearer auth, and `GET /health`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::protocol::ProtocolHandler;
use crate::types::{error_codes, JsonRpcMessage, McpError, McpResult};

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub token: Option<String>,
    pub handler: Arc<ProtocolHandler>,
}

/// HTTP transport for web-based MCP clients.
pub struct HttpTransport {
    state: Arc<ServerState>,
}

impl HttpTransport {
    pub fn new(handler: ProtocolHandler, token: Option<String>) -> Self {
        Self {
            state: Arc::new(ServerState {
                token,
                handler: Arc::new(handler),
            }),
        }
    }

    /// The axum application. `/health` is routed after the auth layer so it
    /// stays open.
    pub fn router(&self) -> Router {
        let state = Arc::clone(&self.state);

        Router::new()
            .route("/mcp", post(handle_request))
            .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
            .route("/health", get(handle_health))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Run the HTTP server on the given address.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

fn rpc_error(status: StatusCode, code: i32, message: &str) -> Response {
    (
        status,
        AxumJson(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": code, "message": message }
        })),
    )
        .into_response()
}

/// Checks the Bearer token when one is configured.
async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);

        if !authorized {
            let err = McpError::Unauthorized;
            return rpc_error(StatusCode::UNAUTHORIZED, err.code(), &err.to_string());
        }
    }

    next.run(request).await
}

/// One JSON-RPC message per POST. Notifications get `202 Accepted` with no body.
/// If the client disconnects mid-request, the in-flight tool call is aborted.
async fn handle_request(
    State(state): State<Arc<ServerState>>,
    AxumJson(body): AxumJson<Value>,
) -> Response {
    let msg: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(msg) => msg,
        Err(_) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                error_codes::PARSE_ERROR,
                "Parse error",
            )
        }
    };

    match state.handler.handle_message(msg).await {
        Some(response) => AxumJson(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Health check. No auth required.
async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<Value> {
    let renderer = state.handler.scraper().renderer();
    AxumJson(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "in_flight": state.handler.in_flight(),
        "render_contexts": renderer.active_contexts(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use event_scraper::renderer::NoopRenderer;
    use event_scraper::{AdapterRegistry, EventScraper, ScraperConfig};
    use tower::ServiceExt;

    fn transport(token: Option<&str>) -> HttpTransport {
        let scraper = EventScraper::with_parts(
            ScraperConfig::default(),
            AdapterRegistry::default(),
            Arc::new(NoopRenderer),
        );
        HttpTransport::new(
            ProtocolHandler::new(Arc::new(scraper)),
            token.map(str::to_string),
        )
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_mcp(body: Value, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(token) = auth {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = transport(Some("s3cret")).router();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["in_flight"], 0);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = transport(Some("s3cret")).router();
        let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});

        let response = app.clone().oneshot(post_mcp(ping.clone(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], -32900);

        let response = app.oneshot(post_mcp(ping, Some("s3cret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], 1);
    }

    #[tokio::test]
    async fn test_detect_over_http() {
        let app = transport(None).router();
        let call = json!({
            "jsonrpc": "2.0",
            "id": "d1",
            "method": "tools/call",
            "params": {
                "name": "detectSiteAdapter",
                "arguments": {"url": "https://www.meetup.com/rustaceans/events/123/"}
            }
        });
        let response = app.oneshot(post_mcp(call, None)).await.unwrap();
        let body = body_json(response).await;
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["adapter"], "meetup_adapter");
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let app = transport(None).router();
        let notif = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let response = app.oneshot(post_mcp(notif, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
