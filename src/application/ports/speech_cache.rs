//! Speech Cache Port - 合成音频缓存
//!
//! 定义音频缓存的抽象接口，具体实现为进程内 DashMap（容量上限 + TTL）

use bytes::Bytes;

use crate::domain::speech::SpeechCacheKey;

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    /// 因容量已满而未写入的次数
    pub rejected_count: u64,
}

/// Speech Cache Port
///
/// - 容量满时不淘汰旧条目，新条目直接不缓存
/// - 条目超过 TTL 后在读取时或清扫时移除
pub trait SpeechCachePort: Send + Sync {
    /// 读取未过期的音频，过期条目顺带移除
    fn get(&self, key: &SpeechCacheKey) -> Option<Bytes>;

    /// 写入音频，返回是否真正写入（容量已满时返回 false）
    fn put(&self, key: &SpeechCacheKey, audio: Bytes) -> bool;

    /// 清除所有过期条目，返回清除数量
    fn purge_expired(&self) -> usize;

    fn stats(&self) -> CacheStats;
}
