//! Speech Context - 语音合成限界上下文
//!
//! 职责:
//! - 合成文本与音色的校验
//! - 音频缓存 key 的生成规则

mod errors;
mod value_objects;

pub use errors::SpeechDomainError;
pub use value_objects::{CacheKeyStrategy, SpeechCacheKey, SpeechText, VoiceId};
