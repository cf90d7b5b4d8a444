//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Health check
//!
//! # Tools
//! GET  /api/tools       - Tool catalog (names, descriptions, schemas)
//! POST /api/tools/call  - Execute a tool call, returns the envelope
//! ```
//!
//! Tool outcomes never surface as HTTP errors: `/api/tools/call` answers
//! `200 OK` with `{success:false, error}` for every tool-level failure.
//! Only a malformed request body earns a non-2xx status.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;
use crate::tools::{self, ToolCall};

/// Create the gateway router with all routes registered.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/call", post(call_tool))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// List the tool catalog.
async fn list_tools() -> Json<Value> {
    let catalog = tools::all_tools();
    Json(json!({ "tools": catalog, "count": catalog.len() }))
}

/// Execute a single tool call.
async fn call_tool(State(state): State<AppState>, Json(call): Json<ToolCall>) -> Json<Value> {
    Json(state.dispatcher().dispatch(&call).await)
}
