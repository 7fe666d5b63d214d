//! Speech Command Handlers
//!
//! 单次请求的状态流转：
//! Received → CacheCheck → {Hit → Respond} | {Miss → UpstreamCall → {Success → StoreAndRespond | Failure → ErrorRespond}}

use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::application::commands::speech_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    SpeechCachePort, SpeechError, SpeechSynthesizerPort, SynthesisRequest,
};
use crate::domain::speech::{CacheKeyStrategy, SpeechCacheKey, SpeechText, VoiceId};

/// 语音合成网关设置
#[derive(Debug, Clone)]
pub struct SpeechGatewaySettings {
    /// 请求未指定音色时使用
    pub default_voice_id: VoiceId,
    /// 缓存 key 策略
    pub key_strategy: CacheKeyStrategy,
    /// 是否合并相同 key 的并发未命中请求
    pub coalesce_in_flight: bool,
}

type InFlightSynthesis = Shared<BoxFuture<'static, Result<Bytes, SpeechError>>>;

/// SynthesizeSpeech Handler
///
/// 上游调用与随后的缓存写入在独立任务中执行，调用方断开不会取消它们
pub struct SynthesizeSpeechHandler {
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    cache: Arc<dyn SpeechCachePort>,
    settings: SpeechGatewaySettings,
    in_flight: Arc<DashMap<SpeechCacheKey, InFlightSynthesis>>,
}

impl SynthesizeSpeechHandler {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        cache: Arc<dyn SpeechCachePort>,
        settings: SpeechGatewaySettings,
    ) -> Self {
        Self {
            synthesizer,
            cache,
            settings,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub async fn handle(
        &self,
        command: SynthesizeSpeech,
    ) -> Result<SynthesizeSpeechResponse, ApplicationError> {
        let text = SpeechText::new(command.text.unwrap_or_default())?;
        let voice_id =
            VoiceId::or_default(command.voice_id.as_deref(), &self.settings.default_voice_id)?;

        if !self.synthesizer.is_configured() {
            return Err(SpeechError::MissingCredential.into());
        }

        let cache_key = SpeechCacheKey::new(&voice_id, &text, self.settings.key_strategy);
        if let Some(audio) = self.cache.get(&cache_key) {
            tracing::debug!(
                voice_id = %voice_id,
                audio_size = audio.len(),
                "Speech cache hit"
            );
            return Ok(SynthesizeSpeechResponse {
                audio,
                cache_status: CacheStatus::Hit,
            });
        }

        tracing::debug!(
            voice_id = %voice_id,
            text_chars = text.char_count(),
            "Speech cache miss, calling provider"
        );

        let request = SynthesisRequest { text, voice_id };
        let result = if self.settings.coalesce_in_flight {
            self.join_or_start(cache_key, request).await
        } else {
            self.start_synthesis(cache_key, request)
                .await
                .map(|audio| (audio, CacheStatus::Miss))
        };

        let (audio, cache_status) = result.map_err(|e| {
            tracing::warn!(error = %e, "Speech synthesis failed");
            ApplicationError::from(e)
        })?;

        Ok(SynthesizeSpeechResponse {
            audio,
            cache_status,
        })
    }

    /// 上游凭证是否已配置
    pub fn is_configured(&self) -> bool {
        self.synthesizer.is_configured()
    }

    /// 加入同 key 的在途请求，不存在时发起新请求
    async fn join_or_start(
        &self,
        cache_key: SpeechCacheKey,
        request: SynthesisRequest,
    ) -> Result<(Bytes, CacheStatus), SpeechError> {
        let synthesis = match self.in_flight.entry(cache_key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(cache_key = %cache_key, "Joining in-flight synthesis");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // 在途请求可能刚写完缓存并移除了自己
                if let Some(audio) = self.cache.get(&cache_key) {
                    return Ok((audio, CacheStatus::Hit));
                }
                let synthesis = self.start_synthesis(cache_key, request).shared();
                entry.insert(synthesis.clone());
                synthesis
            }
        };

        synthesis.await.map(|audio| (audio, CacheStatus::Miss))
    }

    /// 在独立任务中调用上游并写入缓存
    fn start_synthesis(
        &self,
        cache_key: SpeechCacheKey,
        request: SynthesisRequest,
    ) -> BoxFuture<'static, Result<Bytes, SpeechError>> {
        let synthesizer = self.synthesizer.clone();
        let cache = self.cache.clone();
        let in_flight = self
            .settings
            .coalesce_in_flight
            .then(|| self.in_flight.clone());

        let task = tokio::spawn(async move {
            let voice_id = request.voice_id.clone();
            let result = synthesizer.synthesize(request).await;

            if let Ok(audio) = &result {
                let cached = cache.put(&cache_key, audio.clone());
                tracing::info!(
                    voice_id = %voice_id,
                    audio_size = audio.len(),
                    cached = cached,
                    "Speech synthesized"
                );
            }

            // 先写缓存再移除在途记录，后来者要么命中缓存要么加入在途请求
            if let Some(in_flight) = in_flight {
                in_flight.remove(&cache_key);
            }

            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(SpeechError::Internal(format!("Synthesis task failed: {}", e)))
            })
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ManualClock;
    use crate::infrastructure::memory::InMemorySpeechCache;
    use async_trait::async_trait;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const AUDIO: &[u8] = b"ID3-fake-mp3";

    /// 计数的假合成器
    struct CountingSynthesizer {
        calls: AtomicUsize,
        configured: bool,
        failure: Option<SpeechError>,
        delay: Option<Duration>,
    }

    impl CountingSynthesizer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                configured: true,
                failure: None,
                delay: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechSynthesizerPort for CountingSynthesizer {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            let mut audio = AUDIO.to_vec();
            audio.extend_from_slice(request.voice_id.as_str().as_bytes());
            Ok(Bytes::from(audio))
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    struct Fixture {
        synthesizer: Arc<CountingSynthesizer>,
        cache: Arc<InMemorySpeechCache>,
        clock: Arc<ManualClock>,
        handler: SynthesizeSpeechHandler,
    }

    fn fixture_with(synthesizer: CountingSynthesizer, max_entries: usize, coalesce: bool) -> Fixture {
        let synthesizer = Arc::new(synthesizer);
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(InMemorySpeechCache::with_clock(
            max_entries,
            Duration::from_secs(3600),
            clock.clone(),
        ));
        let handler = SynthesizeSpeechHandler::new(
            synthesizer.clone(),
            cache.clone(),
            SpeechGatewaySettings {
                default_voice_id: VoiceId::new("default-voice").unwrap(),
                key_strategy: CacheKeyStrategy::default(),
                coalesce_in_flight: coalesce,
            },
        );
        Fixture {
            synthesizer,
            cache,
            clock,
            handler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CountingSynthesizer::new(), 10, false)
    }

    fn command(text: &str) -> SynthesizeSpeech {
        SynthesizeSpeech {
            text: Some(text.to_string()),
            voice_id: None,
        }
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let f = fixture();

        let first = f.handler.handle(command("Revenue grew 12%")).await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);

        let second = f.handler.handle(command("Revenue grew 12%")).await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.audio, first.audio);
        assert_eq!(f.synthesizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_default_voice_used_when_absent() {
        let f = fixture();

        let response = f.handler.handle(command("hello")).await.unwrap();
        assert!(response.audio.ends_with(b"default-voice"));

        let explicit = SynthesizeSpeech {
            text: Some("hello".to_string()),
            voice_id: Some("default-voice".to_string()),
        };
        let response = f.handler.handle(explicit).await.unwrap();
        assert_eq!(response.cache_status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_empty_or_missing_text_never_reaches_upstream() {
        let f = fixture();

        for cmd in [
            SynthesizeSpeech::default(),
            command(""),
            command("   "),
        ] {
            let err = f.handler.handle(cmd).await.unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidInput(_)));
        }
        assert_eq!(f.synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_voice_id_rejected() {
        let f = fixture();
        let cmd = SynthesizeSpeech {
            text: Some("hello".to_string()),
            voice_id: Some("../../v1/user".to_string()),
        };
        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidInput(_)));
        assert_eq!(f.synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_misconfigured() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.configured = false;
        let f = fixture_with(synthesizer, 10, false);

        let err = f.handler.handle(command("hello")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Misconfigured(_)));
        assert_eq!(f.synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_not_cached() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.failure = Some(SpeechError::Upstream {
            status: 429,
            body: "quota exceeded".to_string(),
        });
        let f = fixture_with(synthesizer, 10, false);

        let err = f.handler.handle(command("hello")).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError { status: 429, .. }
        ));
        assert_eq!(f.cache.stats().entries, 0);

        f.handler.handle(command("hello")).await.unwrap_err();
        assert_eq!(f.synthesizer.calls(), 2);
    }

    #[tokio::test]
    async fn test_full_cache_still_serves_but_does_not_store() {
        let f = fixture_with(CountingSynthesizer::new(), 1, false);

        f.handler.handle(command("first")).await.unwrap();
        let overflow = f.handler.handle(command("second")).await.unwrap();
        assert!(!overflow.audio.is_empty());
        assert_eq!(f.cache.stats().entries, 1);

        let again = f.handler.handle(command("second")).await.unwrap();
        assert_eq!(again.cache_status, CacheStatus::Miss);
        assert_eq!(f.synthesizer.calls(), 3);

        let cached = f.handler.handle(command("first")).await.unwrap();
        assert_eq!(cached.cache_status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_expired_entry_calls_upstream_again() {
        let f = fixture();

        f.handler.handle(command("hello")).await.unwrap();
        f.clock.advance(Duration::from_secs(3599));
        let hit = f.handler.handle(command("hello")).await.unwrap();
        assert_eq!(hit.cache_status, CacheStatus::Hit);

        f.clock.advance(Duration::from_secs(2));
        let miss = f.handler.handle(command("hello")).await.unwrap();
        assert_eq!(miss.cache_status, CacheStatus::Miss);
        assert_eq!(f.synthesizer.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_without_coalescing_each_call_upstream() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.delay = Some(Duration::from_millis(50));
        let f = fixture_with(synthesizer, 10, false);

        let results = join_all((0..4).map(|_| f.handler.handle(command("same text")))).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(f.synthesizer.calls(), 4);
        assert_eq!(f.cache.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_with_coalescing_share_one_call() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.delay = Some(Duration::from_millis(50));
        let f = fixture_with(synthesizer, 10, true);

        let results = join_all((0..4).map(|_| f.handler.handle(command("same text")))).await;
        let audio: Vec<Bytes> = results.into_iter().map(|r| r.unwrap().audio).collect();
        assert!(audio.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(f.synthesizer.calls(), 1);
        assert!(f.handler.in_flight.is_empty());

        let hit = f.handler.handle(command("same text")).await.unwrap();
        assert_eq!(hit.cache_status, CacheStatus::Hit);
        assert_eq!(f.synthesizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_coalescing_rechecks_cache_after_in_flight_finished() {
        let f = fixture_with(CountingSynthesizer::new(), 10, true);
        let voice_id = VoiceId::new("default-voice").unwrap();
        let text = SpeechText::new("late arrival").unwrap();
        let cache_key = SpeechCacheKey::new(&voice_id, &text, CacheKeyStrategy::default());

        // 另一个请求已完成：结果已入缓存，在途记录已移除
        f.cache.put(&cache_key, Bytes::from_static(AUDIO));

        let (audio, status) = f
            .handler
            .join_or_start(cache_key, SynthesisRequest { text, voice_id })
            .await
            .unwrap();
        assert_eq!(audio, Bytes::from_static(AUDIO));
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(f.synthesizer.calls(), 0);
        assert!(f.handler.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_handler_reports_configuration() {
        assert!(fixture().handler.is_configured());

        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.configured = false;
        assert!(!fixture_with(synthesizer, 10, false).handler.is_configured());
    }

    #[tokio::test]
    async fn test_coalesced_failure_reaches_every_caller() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.delay = Some(Duration::from_millis(20));
        synthesizer.failure = Some(SpeechError::Network("connection reset".to_string()));
        let f = fixture_with(synthesizer, 10, true);

        let results = join_all((0..3).map(|_| f.handler.handle(command("boom")))).await;
        assert!(results.iter().all(|r| matches!(
            r,
            Err(ApplicationError::NoUpstreamResponse { .. })
        )));
        assert_eq!(f.synthesizer.calls(), 1);
        assert!(f.handler.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_caller_still_populates_cache() {
        let mut synthesizer = CountingSynthesizer::new();
        synthesizer.delay = Some(Duration::from_millis(50));
        let f = fixture_with(synthesizer, 10, false);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), f.handler.handle(command("hello"))).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let response = f.handler.handle(command("hello")).await.unwrap();
        assert_eq!(response.cache_status, CacheStatus::Hit);
        assert_eq!(f.synthesizer.calls(), 1);
    }
}
