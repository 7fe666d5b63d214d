//! AskBI - 聊天式 BI 仪表盘网关
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Speech Context: 合成文本、音色、缓存 key
//! - Query Context: BI 查询请求
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechSynthesizer, SpeechCache, BiBackend, Clock）
//! - Commands: 命令与处理器（语音合成、查询转发）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: /speech-synthesis, /bi-query 及辅助 API
//! - Memory: 带 TTL 与容量上限的合成音频缓存
//! - Worker: CacheSweeper 过期清扫
//! - Adapters: 语音服务客户端, BI 后端客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
