//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod bi_backend;
mod clock;
mod speech_cache;
mod speech_synthesizer;

pub use bi_backend::{BiBackendError, BiBackendPort};
#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use speech_cache::{CacheStats, SpeechCachePort};
pub use speech_synthesizer::{SpeechError, SpeechSynthesizerPort, SynthesisRequest};
