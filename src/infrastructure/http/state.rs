//! Application State
//!
//! 组合根注入的端口与两个网关的 Command Handler

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ForwardQueryHandler, SpeechGatewaySettings, SynthesizeSpeechHandler,
    // Ports
    BiBackendPort, SpeechCachePort, SpeechSynthesizerPort,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub speech_cache: Arc<dyn SpeechCachePort>,

    // ========== Command Handlers ==========
    pub synthesize_speech_handler: SynthesizeSpeechHandler,
    pub forward_query_handler: ForwardQueryHandler,

    /// 缓存命中时通过 Cache-Control 告知客户端的有效期（秒）
    pub client_cache_max_age_secs: u64,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        speech_synthesizer: Arc<dyn SpeechSynthesizerPort>,
        bi_backend: Arc<dyn BiBackendPort>,
        speech_cache: Arc<dyn SpeechCachePort>,
        speech_settings: SpeechGatewaySettings,
        client_cache_max_age_secs: u64,
    ) -> Self {
        Self {
            speech_cache: speech_cache.clone(),
            synthesize_speech_handler: SynthesizeSpeechHandler::new(
                speech_synthesizer,
                speech_cache,
                speech_settings,
            ),
            forward_query_handler: ForwardQueryHandler::new(bi_backend),
            client_cache_max_age_secs,
        }
    }
}
