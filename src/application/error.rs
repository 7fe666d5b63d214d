//! 应用层错误定义
//!
//! 统一的命令错误类型，HTTP 层据此映射状态码

use serde_json::Value;
use thiserror::Error;

use crate::application::ports::{BiBackendError, SpeechError};
use crate::domain::speech::SpeechDomainError;

/// 上游服务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Speech,
    BiBackend,
}

impl UpstreamService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::BiBackend => "bi_backend",
        }
    }
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 请求数据缺失或格式错误
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 必需的凭证未配置
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// 上游返回了失败状态码
    #[error("{service} upstream returned HTTP {status}")]
    UpstreamError {
        service: UpstreamService,
        status: u16,
        body: Value,
    },

    /// 网络层失败，没有收到上游响应
    #[error("No response from {service} upstream: {message}")]
    NoUpstreamResponse {
        service: UpstreamService,
        message: String,
    },

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<SpeechDomainError> for ApplicationError {
    fn from(err: SpeechDomainError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<SpeechError> for ApplicationError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::MissingCredential => Self::Misconfigured(err.to_string()),
            SpeechError::Upstream { status, body } => Self::UpstreamError {
                service: UpstreamService::Speech,
                status,
                body: Value::String(body),
            },
            SpeechError::Network(message) => Self::NoUpstreamResponse {
                service: UpstreamService::Speech,
                message,
            },
            SpeechError::InvalidResponse(message) | SpeechError::Internal(message) => {
                Self::InternalError(message)
            }
        }
    }
}

impl From<BiBackendError> for ApplicationError {
    fn from(err: BiBackendError) -> Self {
        match err {
            BiBackendError::Status { status, body } => Self::UpstreamError {
                service: UpstreamService::BiBackend,
                status,
                body,
            },
            BiBackendError::NoResponse(message) => Self::NoUpstreamResponse {
                service: UpstreamService::BiBackend,
                message,
            },
            BiBackendError::Internal(message) => Self::InternalError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_speech_error_conversion() {
        let err: ApplicationError = SpeechError::Upstream {
            status: 401,
            body: "unauthorized".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError { service: UpstreamService::Speech, status: 401, .. }
        ));

        let err: ApplicationError = SpeechError::MissingCredential.into();
        assert!(matches!(err, ApplicationError::Misconfigured(_)));
    }

    #[test]
    fn test_bi_error_conversion_keeps_body() {
        let err: ApplicationError = BiBackendError::Status {
            status: 422,
            body: json!({"detail": "bad question"}),
        }
        .into();
        match err {
            ApplicationError::UpstreamError { service, status, body } => {
                assert_eq!(service, UpstreamService::BiBackend);
                assert_eq!(status, 422);
                assert_eq!(body, json!({"detail": "bad question"}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
