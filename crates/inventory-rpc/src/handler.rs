//! JSON-RPC request handlers.

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use inventory_core::tree::Tree;
use inventory_core::{
    BuildRequest, InventoryError, LoaderColumn, NodeId, RefreshOutcome, SubsetRow, SubsetsModel,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

/// Method-level failure: either an unknown method or a core error.
#[derive(Debug)]
enum DispatchError {
    MethodNotFound(String),
    Core(InventoryError),
}

impl From<InventoryError> for DispatchError {
    fn from(err: InventoryError) -> Self {
        DispatchError::Core(err)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Core(err.into())
    }
}

impl DispatchError {
    fn code(&self) -> i32 {
        match self {
            DispatchError::MethodNotFound(_) => -32601,
            DispatchError::Core(e) => e.to_rpc_error_code(),
        }
    }

    fn message(&self) -> String {
        match self {
            DispatchError::MethodNotFound(method) => format!("Method not found: {}", method),
            DispatchError::Core(e) => e.to_string(),
        }
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    match dispatch_method(&state, method, &params).await {
        Ok(value) => (StatusCode::OK, Json(JsonRpcResponse::success(id, value))),
        Err(e) => {
            error!("RPC error for {}: {}", method, e.message());
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, e.code(), e.message())),
            )
        }
    }
}

// ============================================================================
// Parameter helpers
// ============================================================================

/// Extract an optional string parameter, supporting both snake_case and camelCase.
fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
fn require_str_param(params: &Value, snake: &str, camel: &str) -> inventory_core::Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| InventoryError::InvalidParams {
            message: format!("Missing required parameter: {}", snake),
        })
}

/// Extract an optional bool parameter, supporting both snake_case and camelCase.
fn get_bool_param(params: &Value, snake: &str, camel: &str) -> Option<bool> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_bool())
}

/// Extract a list of strings; non-string entries are skipped.
fn get_str_list_param(params: &Value, snake: &str, camel: &str) -> Vec<String> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Method dispatcher
// ============================================================================

async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> Result<Value, DispatchError> {
    match method {
        "refresh_inventory" => {
            let request = if get_bool_param(params, "hierarchy_view", "hierarchyView")
                .unwrap_or(false)
            {
                BuildRequest::hierarchy(get_str_list_param(params, "selected", "selected"))
            } else {
                BuildRequest::flat()
            };

            let handle = state.session.lock().await.spawn_refresh(request);
            let outcome = handle
                .await
                .map_err(|e| InventoryError::Other(format!("Refresh task failed: {}", e)))??;
            let applied = state.session.lock().await.finish_refresh(outcome);
            if applied.is_stale() {
                warn!("Inventory refresh superseded before it could be applied");
            }
            Ok(json!({"stale": applied.is_stale()}))
        }

        "get_inventory" => {
            // Filters apply to this call only; absent params clear them
            let mut session = state.session.lock().await;
            let text = get_str_param(params, "filter", "filter").unwrap_or_default();
            if get_bool_param(params, "regex", "regex").unwrap_or(false) {
                session.set_pattern_filter(text)?;
            } else {
                session.set_text_filter(text)?;
            }
            session.set_outdated_only(
                get_bool_param(params, "outdated_only", "outdatedOnly").unwrap_or(false),
            );
            let rows = serde_json::to_value(session.snapshot())?;
            Ok(json!({
                "hierarchy_view": session.model().hierarchy_view(),
                "filtered": session.is_filtered(),
                "rows": rows,
            }))
        }

        "set_version" => {
            let item_id = require_str_param(params, "item_id", "itemId")?;
            let version_id = require_str_param(params, "version_id", "versionId")?;
            state
                .session
                .lock()
                .await
                .set_version(&item_id, &version_id)?;
            Ok(json!({"success": true}))
        }

        "get_outdated_containers" => {
            let containers = state.session.lock().await.outdated_containers();
            Ok(json!({"containers": serde_json::to_value(containers)?}))
        }

        "list_subsets" => {
            let asset_ids = get_str_list_param(params, "asset_ids", "assetIds");
            let grouping = get_bool_param(params, "grouping", "grouping").unwrap_or(true);
            let outcome = state.session.lock().await.subsets(&asset_ids, grouping)?;
            match outcome {
                RefreshOutcome::Fetched(model) => Ok(json!({
                    "stale": false,
                    "families": model.families(),
                    "rows": subset_rows(&model, model.root()),
                })),
                RefreshOutcome::Stale => Ok(json!({"stale": true, "rows": []})),
            }
        }

        "teardown" => {
            state.session.lock().await.teardown();
            Ok(json!({"success": true}))
        }

        _ => Err(DispatchError::MethodNotFound(method.to_string())),
    }
}

/// JSON rows of the subsets tree below `parent`.
fn subset_rows(model: &SubsetsModel, parent: NodeId) -> Vec<Value> {
    let tree: &Tree<SubsetRow> = model.tree();
    tree.children(parent)
        .iter()
        .filter_map(|node| {
            let row = tree.get(*node)?;
            let columns: Map<String, Value> = LoaderColumn::ALL
                .iter()
                .filter_map(|column| {
                    Some((column.header().to_string(), Value::String(row.display(*column)?)))
                })
                .collect();
            Some(json!({
                "item_id": tree.item_id(*node)?.to_string(),
                "kind": row.kind,
                "columns": columns,
                "color": row.color,
                "stale_hero": row.is_stale_hero(),
                "children": subset_rows(model, *node),
            }))
        })
        .collect()
}
