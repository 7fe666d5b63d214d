//! HTTP Routes
//!
//! API Endpoints:
//! - /speech-synthesis   POST  文本转语音（带缓存），返回 audio/mpeg
//! - /bi-query           POST  转发 BI 查询，原样返回上游 JSON
//! - /api/ping           GET   健康检查（凭证是否配置、缓存条目数）
//! - /api/cache/stats    GET   合成音频缓存统计

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/speech-synthesis", post(handlers::synthesize_speech))
        .route("/bi-query", post(handlers::bi_query))
        .nest("/api", api_routes())
}

/// 辅助 API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/cache/stats", get(handlers::cache_stats))
}
