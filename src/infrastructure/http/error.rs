//! HTTP Error Handling
//!
//! 网关边界：所有错误在这里转换为 `{ error, details? }` JSON 与对应状态码

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::application::{ApplicationError, UpstreamService};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: Value) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    /// 请求数据缺失或格式错误
    BadRequest(String),
    /// 服务端缺少必需配置
    Misconfigured(String),
    /// 语音服务商返回失败状态
    SpeechUpstream { status: u16, body: Value },
    /// 语音服务商无响应
    SpeechUnreachable(String),
    /// BI 后端返回失败状态，原样透传状态码
    BiUpstream { status: u16, body: Value },
    /// BI 后端无响应
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg))
            }
            ApiError::Misconfigured(msg) => {
                tracing::error!(error = %msg, "Gateway misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
            ApiError::SpeechUpstream { status, body } => {
                tracing::error!(upstream_status = status, "Speech provider error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details(
                        "Speech provider error",
                        json!({ "status": status, "body": body }),
                    ),
                )
            }
            ApiError::SpeechUnreachable(msg) => {
                tracing::error!(error = %msg, "Speech provider unreachable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to reach speech provider", Value::String(msg)),
                )
            }
            ApiError::BiUpstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                if status.is_server_error() {
                    tracing::error!(upstream_status = %status.as_u16(), "BI backend error");
                } else {
                    tracing::warn!(upstream_status = %status.as_u16(), "BI backend rejected query");
                }
                (status, ErrorResponse::with_details("Server error", body))
            }
            ApiError::BadGateway(msg) => {
                tracing::error!(error = %msg, "No response from BI backend");
                (StatusCode::BAD_GATEWAY, ErrorResponse::new("No response from server"))
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Internal server error", Value::String(msg)),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ApplicationError::Misconfigured(msg) => ApiError::Misconfigured(msg),
            ApplicationError::UpstreamError {
                service: UpstreamService::Speech,
                status,
                body,
            } => ApiError::SpeechUpstream { status, body },
            ApplicationError::UpstreamError {
                service: UpstreamService::BiBackend,
                status,
                body,
            } => ApiError::BiUpstream { status, body },
            ApplicationError::NoUpstreamResponse {
                service: UpstreamService::Speech,
                message,
            } => ApiError::SpeechUnreachable(message),
            ApplicationError::NoUpstreamResponse {
                service: UpstreamService::BiBackend,
                message,
            } => ApiError::BadGateway(message),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_bad_gateway_body() {
        let (status, body) = render(ApiError::BadGateway("connection refused".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "No response from server"}));
    }

    #[tokio::test]
    async fn test_bi_upstream_relays_status_and_body() {
        let (status, body) = render(ApiError::BiUpstream {
            status: 404,
            body: json!({"detail": "Not Found"}),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"error": "Server error", "details": {"detail": "Not Found"}})
        );
    }

    #[tokio::test]
    async fn test_invalid_upstream_status_becomes_bad_gateway() {
        let (status, _) = render(ApiError::BiUpstream {
            status: 42,
            body: Value::Null,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_speech_upstream_is_500() {
        let (status, body) = render(ApiError::SpeechUpstream {
            status: 401,
            body: json!("invalid api key"),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Speech provider error");
        assert_eq!(body["details"]["status"], 401);
    }

    #[test]
    fn test_application_error_mapping() {
        let api: ApiError = ApplicationError::invalid_input("Text is required").into();
        assert!(matches!(api, ApiError::BadRequest(_)));

        let api: ApiError = ApplicationError::NoUpstreamResponse {
            service: UpstreamService::Speech,
            message: "reset".into(),
        }
        .into();
        assert!(matches!(api, ApiError::SpeechUnreachable(_)));

        let api: ApiError = ApplicationError::NoUpstreamResponse {
            service: UpstreamService::BiBackend,
            message: "reset".into(),
        }
        .into();
        assert!(matches!(api, ApiError::BadGateway(_)));
    }
}
