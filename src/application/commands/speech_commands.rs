//! Speech Commands - 语音合成命令

use bytes::Bytes;

/// 合成语音命令
///
/// 字段保持原始形态，校验在 handler 中完成
#[derive(Debug, Clone, Default)]
pub struct SynthesizeSpeech {
    pub text: Option<String>,
    pub voice_id: Option<String>,
}

/// 缓存命中状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// 合成语音响应
#[derive(Debug, Clone)]
pub struct SynthesizeSpeechResponse {
    /// audio/mpeg 字节
    pub audio: Bytes,
    pub cache_status: CacheStatus,
}
