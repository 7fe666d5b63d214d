//! HTTP Speech Client - 调用外部语音合成服务（ElevenLabs 兼容 API）
//!
//! 实现 SpeechSynthesizerPort trait
//!
//! 外部 API:
//! POST {base_url}/v1/text-to-speech/{voice_id}?optimize_streaming_latency=4&output_format=mp3_22050_32
//! Headers: xi-api-key, Accept: audio/mpeg
//! Request: {"text": "...", "model_id": "...", "voice_settings": {...}}  (JSON)
//! Response: audio/mpeg binary

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechError, SpeechSynthesizerPort, SynthesisRequest};

/// 音色参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        // 降低稳定性/保真度换取速度
        Self {
            stability: 0.3,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: false,
        }
    }
}

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeechHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// HTTP 语音客户端配置
#[derive(Clone)]
pub struct HttpSpeechClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// API 凭证，未配置时请求返回 MissingCredential
    pub api_key: Option<String>,
    /// 模型 ID
    pub model_id: String,
    /// 输出格式
    pub output_format: String,
    pub voice_settings: VoiceSettings,
    /// 0-4，4 为最大延迟优化
    pub optimize_streaming_latency: u8,
    /// 请求超时时间（秒），None 表示使用传输层默认值
    pub timeout_secs: Option<u64>,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: None,
            model_id: "eleven_flash_v2_5".to_string(),
            output_format: "mp3_22050_32".to_string(),
            voice_settings: VoiceSettings::default(),
            optimize_streaming_latency: 4,
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for HttpSpeechClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSpeechClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_id", &self.model_id)
            .field("output_format", &self.output_format)
            .field("voice_settings", &self.voice_settings)
            .field("optimize_streaming_latency", &self.optimize_streaming_latency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpSpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// HTTP 语音合成客户端
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    /// 创建新的客户端
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SpeechError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SpeechError::Internal(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// 获取合成 URL
    fn synthesis_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        )
    }
}

#[async_trait]
impl SpeechSynthesizerPort for HttpSpeechClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Bytes, SpeechError> {
        let api_key = self.api_key().ok_or(SpeechError::MissingCredential)?;
        let url = self.synthesis_url(request.voice_id.as_str());

        let body = SpeechHttpRequest {
            text: request.text.as_str(),
            model_id: &self.config.model_id,
            voice_settings: self.config.voice_settings,
        };

        tracing::debug!(
            url = %url,
            text_chars = request.text.char_count(),
            model_id = %self.config.model_id,
            "Sending speech synthesis request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[
                (
                    "optimize_streaming_latency",
                    self.config.optimize_streaming_latency.to_string(),
                ),
                ("output_format", self.config.output_format.clone()),
            ])
            .header("xi-api-key", api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    SpeechError::Internal(e.to_string())
                } else if e.is_connect() {
                    SpeechError::Network(format!("Cannot connect to speech provider: {}", e))
                } else {
                    SpeechError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Upstream {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        tracing::debug!(
            voice_id = %request.voice_id,
            audio_size = audio.len(),
            "Speech provider responded"
        );

        Ok(audio)
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::{SpeechText, VoiceId};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str, voice: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: SpeechText::new(text).unwrap(),
            voice_id: VoiceId::new(voice).unwrap(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = HttpSpeechClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.model_id, "eleven_flash_v2_5");
        assert_eq!(config.output_format, "mp3_22050_32");
        assert_eq!(config.optimize_streaming_latency, 4);
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = HttpSpeechClientConfig::default().with_api_key("sk-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_is_configured() {
        let client = HttpSpeechClient::new(HttpSpeechClientConfig::default()).unwrap();
        assert!(!client.is_configured());

        let client =
            HttpSpeechClient::new(HttpSpeechClientConfig::default().with_api_key("  ")).unwrap();
        assert!(!client.is_configured());

        let client =
            HttpSpeechClient::new(HttpSpeechClientConfig::default().with_api_key("key")).unwrap();
        assert!(client.is_configured());
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let client = HttpSpeechClient::new(HttpSpeechClientConfig::default()).unwrap();
        let err = client.synthesize(request("hello", "voice")).await.unwrap_err();
        assert!(matches!(err, SpeechError::MissingCredential));
    }

    #[tokio::test]
    async fn test_synthesize_sends_fast_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/voice-1"))
            .and(header("xi-api-key", "secret"))
            .and(header("accept", "audio/mpeg"))
            .and(query_param("optimize_streaming_latency", "4"))
            .and(query_param("output_format", "mp3_22050_32"))
            .and(body_partial_json(json!({
                "text": "Revenue is up",
                "model_id": "eleven_flash_v2_5",
                "voice_settings": {"use_speaker_boost": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(b"ID3audio".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpSpeechClient::new(HttpSpeechClientConfig::new(server.uri()).with_api_key("secret"))
                .unwrap();
        let audio = client
            .synthesize(request("Revenue is up", "voice-1"))
            .await
            .unwrap();
        assert_eq!(audio, Bytes::from_static(b"ID3audio"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client =
            HttpSpeechClient::new(HttpSpeechClientConfig::new(server.uri()).with_api_key("bad"))
                .unwrap();
        let err = client.synthesize(request("hello", "voice")).await.unwrap_err();
        match err {
            SpeechError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpSpeechClient::new(
            HttpSpeechClientConfig::new(format!("http://127.0.0.1:{}", port)).with_api_key("key"),
        )
        .unwrap();

        let err = client.synthesize(request("hello", "voice")).await.unwrap_err();
        assert!(matches!(err, SpeechError::Network(_)));
    }
}
