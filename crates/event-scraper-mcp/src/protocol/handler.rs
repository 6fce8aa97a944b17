//! Request dispatcher. Receives JSON-RPC messages and routes them to handlers.
//!
//! `tools/call` runs on its own task and is registered under its request id
//! until it finishes, so a `notifications/cancelled` for that id can abort
//! it. Aborting drops the pipeline future, which releases any open render
//! context.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use event_scraper::EventScraper;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

type InFlightMap = HashMap<RequestId, (u64, AbortHandle)>;

/// The main protocol handler that dispatches incoming JSON-RPC messages.
/// Share it behind an `Arc` to serve requests concurrently.
pub struct ProtocolHandler {
    scraper: Arc<EventScraper>,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
    in_flight: Arc<std::sync::Mutex<InFlightMap>>,
    next_call: AtomicU64,
}

impl ProtocolHandler {
    pub fn new(scraper: Arc<EventScraper>) -> Self {
        Self {
            scraper,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
            in_flight: Arc::new(std::sync::Mutex::new(HashMap::new())),
            next_call: AtomicU64::new(0),
        }
    }

    pub fn scraper(&self) -> &Arc<EventScraper> {
        &self.scraper
    }

    /// Number of `tools/call` requests currently running.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        let id = request.id.clone();
        let result = self.dispatch_request(request).await;

        match result {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default(),
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "shutdown" => self.handle_shutdown().await,

            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,

            "ping" => Ok(Value::Object(serde_json::Map::new())),

            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                self.handle_cancel(notification.params);
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_cancel(&self, params: Option<Value>) {
        let params: CancelRequestParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                tracing::warn!("Malformed cancellation params: {e}");
                return;
            }
            None => {
                tracing::warn!("Cancellation notification without params");
                return;
            }
        };

        match lock(&self.in_flight).get(&params.request_id) {
            Some((_, handle)) => {
                tracing::info!(
                    "Cancelling request {} ({})",
                    params.request_id,
                    params.reason.as_deref().unwrap_or("no reason given")
                );
                handle.abort();
            }
            None => tracing::debug!(
                "Cancellation for unknown or finished request {}",
                params.request_id
            ),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        let result = self.capabilities.lock().await.negotiate(init_params);

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        if let Err(e) = self.scraper.renderer().shutdown().await {
            tracing::warn!("Renderer shutdown failed: {e}");
        }
        Ok(Value::Object(serde_json::Map::new()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: ToolRegistry::list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let scraper = Arc::clone(&self.scraper);
        let task = tokio::spawn(async move {
            ToolRegistry::call(&call_params.name, call_params.arguments, &scraper).await
        });

        let _guard = InFlightGuard::register(
            Arc::clone(&self.in_flight),
            id,
            self.next_call.fetch_add(1, Ordering::Relaxed),
            task.abort_handle(),
        );

        match task.await {
            Ok(result) => serde_json::to_value(result?)
                .map_err(|e| McpError::InternalError(e.to_string())),
            Err(e) if e.is_cancelled() => Err(McpError::RequestCancelled),
            Err(e) => Err(McpError::InternalError(format!("tool task failed: {e}"))),
        }
    }
}

fn lock(map: &std::sync::Mutex<InFlightMap>) -> std::sync::MutexGuard<'_, InFlightMap> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps a running tool call registered for cancellation. Dropping the guard
/// (call finished, or the caller stopped waiting) unregisters the call and
/// aborts the task if it is still running.
struct InFlightGuard {
    map: Arc<std::sync::Mutex<InFlightMap>>,
    id: RequestId,
    seq: u64,
    handle: AbortHandle,
}

impl InFlightGuard {
    fn register(
        map: Arc<std::sync::Mutex<InFlightMap>>,
        id: RequestId,
        seq: u64,
        handle: AbortHandle,
    ) -> Self {
        if lock(&map)
            .insert(id.clone(), (seq, handle.clone()))
            .is_some()
        {
            tracing::warn!("Duplicate in-flight request id {id}; cancellation targets the newest");
        }
        Self {
            map,
            id,
            seq,
            handle,
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut map = lock(&self.map);
        // A newer request may have reused the id.
        if map.get(&self.id).is_some_and(|(seq, _)| *seq == self.seq) {
            map.remove(&self.id);
        }
        drop(map);
        self.handle.abort();
    }
}
