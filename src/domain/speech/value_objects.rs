//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

use super::SpeechDomainError;

/// 音色 ID 最大长度
const MAX_VOICE_ID_LEN: usize = 64;

/// 音色标识（语音服务商的 voice id）
///
/// 会被拼接进上游 URL 路径，只允许字母、数字、`-` 和 `_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Result<Self, SpeechDomainError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_VOICE_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SpeechDomainError::InvalidVoiceId(id));
        }
        Ok(Self(id))
    }

    /// 请求未指定（或为空串）时回退到默认音色
    pub fn or_default(raw: Option<&str>, default: &VoiceId) -> Result<Self, SpeechDomainError> {
        match raw.map(str::trim) {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Ok(default.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 待合成文本，保证非空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechText(String);

impl SpeechText {
    pub fn new(text: impl Into<String>) -> Result<Self, SpeechDomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SpeechDomainError::EmptyText);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 字符数（非字节数）
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// 缓存 key 生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKeyStrategy {
    /// 音色 + 文本前 N 个字符，共享前缀的不同文本会命中同一条缓存
    Prefix { chars: usize },
    /// 音色 + 全文 md5
    Digest,
}

impl Default for CacheKeyStrategy {
    fn default() -> Self {
        Self::Prefix { chars: 100 }
    }
}

/// 音频缓存 key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeechCacheKey(String);

impl SpeechCacheKey {
    pub fn new(voice_id: &VoiceId, text: &SpeechText, strategy: CacheKeyStrategy) -> Self {
        let text_part = match strategy {
            CacheKeyStrategy::Prefix { chars } => text.as_str().chars().take(chars).collect(),
            CacheKeyStrategy::Digest => format!("{:x}", md5::compute(text.as_str().as_bytes())),
        };
        Self(format!("{}:{}", voice_id, text_part))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpeechCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
