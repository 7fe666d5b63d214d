//! AskBI - 聊天式 BI 仪表盘网关
//!
//! 组合根：
//! - Speech Gateway: 语音合成代理 + 内存 TTL 缓存
//! - BI Gateway: 查询转发
//! - Worker: 缓存过期清扫

use std::sync::Arc;
use std::time::Duration;

use askbi::application::SpeechGatewaySettings;
use askbi::config::{load_config, print_config, AppConfig};
use askbi::domain::speech::VoiceId;
use askbi::infrastructure::adapters::{
    HttpBiClient, HttpBiClientConfig, HttpSpeechClient, HttpSpeechClientConfig, VoiceSettings,
};
use askbi::infrastructure::http::{AppState, HttpServer, ServerConfig};
use askbi::infrastructure::memory::InMemorySpeechCache;
use askbi::infrastructure::worker::{CacheSweeper, CacheSweeperConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("AskBI - 聊天式 BI 仪表盘网关");
    print_config(&config);

    // 语音合成客户端
    let speech_config = HttpSpeechClientConfig {
        base_url: config.speech.base_url.clone(),
        api_key: config.speech.api_key.clone().filter(|_| config.speech.has_api_key()),
        model_id: config.speech.model_id.clone(),
        output_format: config.speech.output_format.clone(),
        voice_settings: VoiceSettings {
            stability: config.speech.stability,
            similarity_boost: config.speech.similarity_boost,
            style: config.speech.style,
            use_speaker_boost: config.speech.use_speaker_boost,
        },
        optimize_streaming_latency: config.speech.optimize_streaming_latency,
        timeout_secs: config.speech.timeout_secs,
    };
    let synthesizer = Arc::new(
        HttpSpeechClient::new(speech_config)
            .map_err(|e| anyhow::anyhow!("Failed to create speech client: {}", e))?,
    );
    if !config.speech.has_api_key() {
        tracing::warn!("Speech credential not configured, /speech-synthesis will return 500");
    }

    // BI 后端客户端
    let mut bi_config = HttpBiClientConfig::new(&config.bi.url);
    if let Some(secs) = config.bi.timeout_secs {
        bi_config = bi_config.with_timeout(secs);
    }
    let bi_backend = Arc::new(
        HttpBiClient::new(bi_config)
            .map_err(|e| anyhow::anyhow!("Failed to create BI client: {}", e))?,
    );

    // 合成音频缓存
    let speech_cache = InMemorySpeechCache::new(config.cache.max_entries, config.cache.ttl()).arc();

    // 启动缓存清扫 Worker
    let shutdown = CancellationToken::new();
    let sweeper_handle = config.cache.sweep_interval().map(|interval| {
        let sweeper = CacheSweeper::new(
            CacheSweeperConfig { interval },
            speech_cache.clone(),
            shutdown.clone(),
        );
        tokio::spawn(sweeper.run())
    });

    let default_voice_id = VoiceId::new(config.speech.default_voice_id.clone())
        .map_err(|e| anyhow::anyhow!("Invalid default voice: {}", e))?;
    let speech_settings = SpeechGatewaySettings {
        default_voice_id,
        key_strategy: config.cache.key_strategy(),
        coalesce_in_flight: config.cache.coalesce_in_flight,
    };

    // 创建 HTTP 服务器
    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    if config.server.static_files.enabled {
        server_config = server_config.with_static_dir(&config.server.static_files.dir);
    }
    let state = AppState::new(
        synthesizer,
        bi_backend,
        speech_cache,
        speech_settings,
        config.cache.client_max_age_secs,
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    let server_shutdown = shutdown.clone();
    server
        .run_with_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
            }
            tracing::info!("Received shutdown signal");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper_handle {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            tracing::warn!("CacheSweeper did not stop in time");
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志（RUST_LOG 优先于配置）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},askbi={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
