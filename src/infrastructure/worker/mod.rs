//! Worker Layer - Background Task Processing
//!
//! 实现 CacheSweeper，定期清理过期的合成音频缓存

mod cache_sweeper;

pub use cache_sweeper::{CacheSweeper, CacheSweeperConfig};
