//! BI Query Handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::application::ForwardQuery;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// POST /bi-query - 原样转发到 BI 后端
pub async fn bi_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;

    let result = state
        .forward_query_handler
        .handle(ForwardQuery { payload })
        .await?;

    Ok(Json(result.body))
}
