//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechSynthesizer、BiBackend、SpeechCache、Clock）
//! - commands: 两个网关的命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    CacheStatus,
    ForwardQuery,
    ForwardQueryResponse,
    SynthesizeSpeech,
    SynthesizeSpeechResponse,
    // Handlers
    handlers::{ForwardQueryHandler, SpeechGatewaySettings, SynthesizeSpeechHandler},
};

pub use error::{ApplicationError, UpstreamService};

pub use ports::{
    // BI backend
    BiBackendError,
    BiBackendPort,
    // Clock
    Clock,
    SystemClock,
    // Speech cache
    CacheStats,
    SpeechCachePort,
    // Speech synthesizer
    SpeechError,
    SpeechSynthesizerPort,
    SynthesisRequest,
};
