//! Speech Synthesizer Port - 语音合成引擎抽象
//!
//! 定义文本转语音的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::speech::{SpeechText, VoiceId};

/// 语音合成错误
///
/// 需要 Clone：合并的在途请求会把同一个结果分发给多个调用方
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("Speech provider credential is not configured")]
    MissingCredential,

    #[error("Speech provider returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// 语音合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: SpeechText,
    /// 服务商音色 ID
    pub voice_id: VoiceId,
}

/// Speech Synthesizer Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 合成语音，返回 audio/mpeg 字节
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SpeechError>;

    /// 上游凭证是否已配置
    fn is_configured(&self) -> bool {
        true
    }
}
