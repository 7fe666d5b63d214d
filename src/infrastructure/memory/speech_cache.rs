//! In-Memory Speech Cache Implementation
//!
//! 容量上限 + TTL 的进程内音频缓存，不做 LRU 淘汰

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{CacheStats, Clock, SpeechCachePort, SystemClock};
use crate::domain::speech::SpeechCacheKey;

/// 缓存条目
#[derive(Debug, Clone)]
struct CachedAudio {
    audio: Bytes,
    inserted_at: Instant,
}

/// 内存音频缓存
///
/// 条目数通过原子计数在分片锁内预留，并发写入不会超过上限
pub struct InMemorySpeechCache {
    entries: DashMap<SpeechCacheKey, CachedAudio>,
    len: AtomicUsize,
    max_entries: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    rejected_count: AtomicU64,
}

impl InMemorySpeechCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self::with_clock(max_entries, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            max_entries = max_entries,
            ttl_secs = ttl.as_secs(),
            "InMemorySpeechCache initialized"
        );

        Self {
            entries: DashMap::new(),
            len: AtomicUsize::new(0),
            max_entries,
            ttl,
            clock,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn is_expired(&self, inserted_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted_at) >= self.ttl
    }

    /// 为新条目预留一个名额
    fn try_reserve(&self) -> bool {
        self.len
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_entries).then_some(n + 1)
            })
            .is_ok()
    }

    fn release(&self, count: usize) {
        self.len.fetch_sub(count, Ordering::SeqCst);
    }
}

impl SpeechCachePort for InMemorySpeechCache {
    fn get(&self, key: &SpeechCacheKey) -> Option<Bytes> {
        let now = self.clock.now();
        // 先复制出数据，释放读锁后才能删除
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.audio.clone(), entry.inserted_at));

        match lookup {
            Some((audio, inserted_at)) if !self.is_expired(inserted_at, now) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(audio)
            }
            Some(_) => {
                let removed = self
                    .entries
                    .remove_if(key, |_, entry| self.is_expired(entry.inserted_at, now));
                if removed.is_some() {
                    self.release(1);
                    tracing::debug!(cache_key = %key, "Expired speech cache entry evicted on read");
                }
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &SpeechCacheKey, audio: Bytes) -> bool {
        // 满了先清掉过期条目再判断，不在持有分片锁时清扫
        if self.len.load(Ordering::SeqCst) >= self.max_entries {
            self.purge_expired();
        }

        let cached = CachedAudio {
            audio,
            inserted_at: self.clock.now(),
        };

        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(cached);
                true
            }
            Entry::Vacant(entry) => {
                if !self.try_reserve() {
                    self.rejected_count.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        cache_key = %key,
                        max_entries = self.max_entries,
                        "Speech cache full, entry not stored"
                    );
                    return false;
                }
                entry.insert(cached);
                true
            }
        }
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !self.is_expired(entry.inserted_at, now);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            self.release(removed);
            tracing::debug!(removed = removed, "Purged expired speech cache entries");
        }
        removed
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len.load(Ordering::SeqCst),
            max_entries: self.max_entries,
            ttl_secs: self.ttl.as_secs(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            rejected_count: self.rejected_count.load(Ordering::Relaxed),
        }
    }
}
