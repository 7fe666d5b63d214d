//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::CacheStats;

// ============================================================================
// Speech DTOs
// ============================================================================

/// POST /speech-synthesis 请求体
///
/// 两个字段都允许缺失，缺失的 text 由 handler 报 400
#[derive(Debug, Default, Deserialize)]
pub struct SynthesizeSpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

// ============================================================================
// Health DTOs
// ============================================================================

/// GET /api/ping 响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 语音服务凭证是否已配置
    pub speech_configured: bool,
    pub cache_entries: usize,
}

// ============================================================================
// Cache DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub rejected: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            max_entries: stats.max_entries,
            ttl_secs: stats.ttl_secs,
            hits: stats.hit_count,
            misses: stats.miss_count,
            rejected: stats.rejected_count,
        }
    }
}
