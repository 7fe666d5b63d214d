//! HTTP BI Client - 调用远端 BI 分析服务
//!
//! 实现 BiBackendPort trait，原样转发 JSON 载荷
//!
//! 外部 API:
//! POST {url}
//! Request: 任意 JSON（约定为 {"question": "...", "conversation_history": "..."}）
//! Response: JSON（SQL、表格结果、base64 图表、自然语言洞察）

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::application::ports::{BiBackendError, BiBackendPort};

/// HTTP BI 客户端配置
#[derive(Debug, Clone)]
pub struct HttpBiClientConfig {
    /// BI 查询端点完整 URL
    pub url: String,
    /// 请求超时时间（秒），None 表示使用传输层默认值
    pub timeout_secs: Option<u64>,
}

impl Default for HttpBiClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/query".to_string(),
            timeout_secs: None,
        }
    }
}

impl HttpBiClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// HTTP BI 客户端
pub struct HttpBiClient {
    client: Client,
    config: HttpBiClientConfig,
}

impl HttpBiClient {
    pub fn new(config: HttpBiClientConfig) -> Result<Self, BiBackendError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BiBackendError::Internal(e.to_string()))?;

        Ok(Self { client, config })
    }
}

/// 响应体按 JSON 解析，失败时退化为 JSON 字符串
fn parse_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

#[async_trait]
impl BiBackendPort for HttpBiClient {
    async fn query(&self, payload: Value) -> Result<Value, BiBackendError> {
        tracing::debug!(url = %self.config.url, "Sending BI query");

        let response = self
            .client
            .post(&self.config.url)
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    BiBackendError::Internal(e.to_string())
                } else {
                    // 请求已发出（或尝试发出）但没有拿到响应
                    BiBackendError::NoResponse(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            // 错误体读不完整时仍以上游状态码为准
            let body = match response.bytes().await {
                Ok(raw) => parse_body(&raw),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read BI error body");
                    Value::String(String::new())
                }
            };
            return Err(BiBackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // 响应体中途断开等同于没有拿到响应
        let raw = response
            .bytes()
            .await
            .map_err(|e| BiBackendError::NoResponse(format!("Incomplete BI response: {}", e)))?;
        let body = parse_body(&raw);

        tracing::info!(
            status = status.as_u16(),
            response_size = raw.len(),
            "BI query completed"
        );

        Ok(body)
    }
}
