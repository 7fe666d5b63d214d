//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::speech::CacheKeyStrategy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成服务配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// BI 后端配置
    #[serde(default)]
    pub bi: BiConfig,

    /// 合成音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置（托管构建好的仪表盘前端）
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default)]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web/dist")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音合成服务配置
///
/// 默认参数偏向速度：快速模型、低稳定性、低码率、最大延迟优化
#[derive(Clone, Deserialize)]
pub struct SpeechConfig {
    /// API 凭证（ASKBI_SPEECH__API_KEY 或 ELEVENLABS_API_KEY）
    #[serde(default)]
    pub api_key: Option<String>,

    /// 服务基础 URL
    #[serde(default = "default_speech_url")]
    pub base_url: String,

    /// 默认音色
    #[serde(default = "default_voice_id")]
    pub default_voice_id: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default)]
    pub use_speaker_boost: bool,

    /// 0-4
    #[serde(default = "default_streaming_latency")]
    pub optimize_streaming_latency: u8,

    /// 请求超时时间（秒），不设置则使用传输层默认值
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_speech_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_flash_v2_5".to_string()
}

fn default_output_format() -> String {
    "mp3_22050_32".to_string()
}

fn default_stability() -> f32 {
    0.3
}

fn default_similarity_boost() -> f32 {
    0.5
}

fn default_streaming_latency() -> u8 {
    4
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_speech_url(),
            default_voice_id: default_voice_id(),
            model_id: default_model_id(),
            output_format: default_output_format(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: false,
            optimize_streaming_latency: default_streaming_latency(),
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_voice_id", &self.default_voice_id)
            .field("model_id", &self.model_id)
            .field("output_format", &self.output_format)
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .field("style", &self.style)
            .field("use_speaker_boost", &self.use_speaker_boost)
            .field("optimize_streaming_latency", &self.optimize_streaming_latency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SpeechConfig {
    /// 凭证是否存在（空串视为未配置）
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// BI 后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct BiConfig {
    /// 查询端点完整 URL
    #[serde(default = "default_bi_url")]
    pub url: String,

    /// 请求超时时间（秒），不设置则使用传输层默认值
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_bi_url() -> String {
    "http://127.0.0.1:8000/query".to_string()
}

impl Default for BiConfig {
    fn default() -> Self {
        Self {
            url: default_bi_url(),
            timeout_secs: None,
        }
    }
}

/// 缓存 key 模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKeyMode {
    /// 音色 + 文本前缀
    #[default]
    Prefix,
    /// 音色 + 全文 md5
    Digest,
}

/// 合成音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 最大条目数，满了以后新结果不再缓存
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// 条目存活时间（秒）
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// prefix 模式下参与 key 的文本字符数
    #[serde(default = "default_key_prefix_chars")]
    pub key_prefix_chars: usize,

    #[serde(default)]
    pub key_strategy: CacheKeyMode,

    /// 过期清扫间隔（秒），0 表示只在读取时惰性清理
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// 命中时告知客户端的 Cache-Control max-age（秒）
    #[serde(default = "default_client_max_age")]
    pub client_max_age_secs: u64,

    /// 合并相同 key 的并发未命中请求
    #[serde(default)]
    pub coalesce_in_flight: bool,
}

fn default_max_entries() -> usize {
    100
}

fn default_ttl() -> u64 {
    3600 // 1 小时
}

fn default_key_prefix_chars() -> usize {
    100
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_client_max_age() -> u64 {
    300 // 5 分钟
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl(),
            key_prefix_chars: default_key_prefix_chars(),
            key_strategy: CacheKeyMode::default(),
            sweep_interval_secs: default_sweep_interval(),
            client_max_age_secs: default_client_max_age(),
            coalesce_in_flight: false,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// 清扫间隔，None 表示不启动清扫任务
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn key_strategy(&self) -> CacheKeyStrategy {
        match self.key_strategy {
            CacheKeyMode::Prefix => CacheKeyStrategy::Prefix {
                chars: self.key_prefix_chars,
            },
            CacheKeyMode::Digest => CacheKeyStrategy::Digest,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
