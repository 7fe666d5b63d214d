//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheKeyMode};
use crate::domain::speech::VoiceId;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 语音服务商惯用的凭证环境变量，作为后备来源
const FALLBACK_API_KEY_VAR: &str = "ELEVENLABS_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `ASKBI_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `ASKBI_SERVER__PORT=8080`
/// - `ASKBI_BI__URL=http://10.0.0.5:8000/query`
/// - `ASKBI_SPEECH__API_KEY=...`（未设置时读取 `ELEVENLABS_API_KEY`）
/// - `ASKBI_CACHE__TTL_SECS=600`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.static_files.enabled", false)?
        .set_default("server.static_files.dir", "web/dist")?
        .set_default("speech.base_url", "https://api.elevenlabs.io")?
        .set_default("speech.default_voice_id", "21m00Tcm4TlvDq8ikWAM")?
        .set_default("speech.model_id", "eleven_flash_v2_5")?
        .set_default("speech.output_format", "mp3_22050_32")?
        .set_default("speech.stability", 0.3)?
        .set_default("speech.similarity_boost", 0.5)?
        .set_default("speech.style", 0.0)?
        .set_default("speech.use_speaker_boost", false)?
        .set_default("speech.optimize_streaming_latency", 4)?
        .set_default("bi.url", "http://127.0.0.1:8000/query")?
        .set_default("cache.max_entries", 100)?
        .set_default("cache.ttl_secs", 3600)?
        .set_default("cache.key_prefix_chars", 100)?
        .set_default("cache.key_strategy", "prefix")?
        .set_default("cache.sweep_interval_secs", 60)?
        .set_default("cache.client_max_age_secs", 300)?
        .set_default("cache.coalesce_in_flight", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: ASKBI_BI__URL=http://bi-server:8000/query
    builder = builder.add_source(
        Environment::with_prefix("ASKBI")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    let app_config =
        apply_api_key_fallback(app_config, std::env::var(FALLBACK_API_KEY_VAR).ok());

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 未显式配置凭证时使用后备环境变量的值
fn apply_api_key_fallback(mut config: AppConfig, fallback: Option<String>) -> AppConfig {
    if !config.speech.has_api_key() {
        if let Some(key) = fallback.filter(|key| !key.trim().is_empty()) {
            config.speech.api_key = Some(key);
        }
    }
    config
}

/// 验证配置有效性
///
/// 凭证缺失不在这里报错：服务照常启动，合成请求返回 500
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.bi.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "BI URL cannot be empty".to_string(),
        ));
    }

    if config.speech.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech base URL cannot be empty".to_string(),
        ));
    }

    if let Err(e) = VoiceId::new(config.speech.default_voice_id.clone()) {
        return Err(ConfigError::ValidationError(format!(
            "Default voice: {}",
            e
        )));
    }

    if config.speech.optimize_streaming_latency > 4 {
        return Err(ConfigError::ValidationError(
            "optimize_streaming_latency must be between 0 and 4".to_string(),
        ));
    }

    if config.cache.max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "Cache max_entries cannot be 0".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cache TTL cannot be 0".to_string(),
        ));
    }

    if config.cache.key_strategy == CacheKeyMode::Prefix && config.cache.key_prefix_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Cache key prefix length cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.server.static_files.enabled {
        tracing::info!("Static Files: {:?}", config.server.static_files.dir);
    }
    tracing::info!("BI URL: {}", config.bi.url);
    tracing::info!("Speech URL: {}", config.speech.base_url);
    tracing::info!(
        "Speech Credential: {}",
        if config.speech.has_api_key() { "configured" } else { "MISSING" }
    );
    tracing::info!("Speech Model: {}", config.speech.model_id);
    tracing::info!("Default Voice: {}", config.speech.default_voice_id);
    tracing::info!(
        "Cache: max {} entries, TTL {}s, key {:?}",
        config.cache.max_entries,
        config.cache.ttl_secs,
        config.cache.key_strategy()
    );
    tracing::info!("Cache Coalescing: {}", config.cache.coalesce_in_flight);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
