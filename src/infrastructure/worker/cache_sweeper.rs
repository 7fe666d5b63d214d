//! Cache Sweeper - 周期性清理过期音频缓存
//!
//! 单个后台任务替代逐条目定时器

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::SpeechCachePort;

/// Sweeper 配置
#[derive(Debug, Clone)]
pub struct CacheSweeperConfig {
    /// 清扫间隔
    pub interval: Duration,
}

impl Default for CacheSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// 缓存清扫 Worker
pub struct CacheSweeper {
    config: CacheSweeperConfig,
    cache: Arc<dyn SpeechCachePort>,
    shutdown: CancellationToken,
}

impl CacheSweeper {
    pub fn new(
        config: CacheSweeperConfig,
        cache: Arc<dyn SpeechCachePort>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            cache,
            shutdown,
        }
    }

    /// 启动 Worker，直到 shutdown 被取消
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "CacheSweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一次 tick 立即完成，跳过
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = self.cache.purge_expired();
                    if removed > 0 {
                        let stats = self.cache.stats();
                        tracing::info!(
                            removed = removed,
                            remaining = stats.entries,
                            "Swept expired speech cache entries"
                        );
                    }
                }
            }
        }

        tracing::info!("CacheSweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ManualClock;
    use crate::domain::speech::{CacheKeyStrategy, SpeechCacheKey, SpeechText, VoiceId};
    use crate::infrastructure::memory::InMemorySpeechCache;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(InMemorySpeechCache::with_clock(
            10,
            Duration::from_secs(60),
            clock.clone(),
        ));
        let key = SpeechCacheKey::new(
            &VoiceId::new("voice").unwrap(),
            &SpeechText::new("hello").unwrap(),
            CacheKeyStrategy::default(),
        );
        cache.put(&key, Bytes::from_static(b"mp3"));
        clock.advance(Duration::from_secs(61));

        let shutdown = CancellationToken::new();
        let sweeper = CacheSweeper::new(
            CacheSweeperConfig {
                interval: Duration::from_millis(10),
            },
            cache.clone(),
            shutdown.clone(),
        );
        let handle = tokio::spawn(sweeper.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.stats().entries, 0);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
