//! Cache Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::CacheStatsResponse;
use crate::infrastructure::http::state::AppState;

/// 合成音频缓存统计
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(state.speech_cache.stats().into())
}
