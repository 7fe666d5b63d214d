//! Health Handler
//!
//! 不触达任何上游，只报告本地可判断的状态

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::HealthResponse;
use crate::infrastructure::http::state::AppState;

/// GET /api/ping
///
/// 凭证缺失时仍返回 200，由 `speech_configured` 标明语音网关不可用
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        speech_configured: state.synthesize_speech_handler.is_configured(),
        cache_entries: state.speech_cache.stats().entries,
    })
}
