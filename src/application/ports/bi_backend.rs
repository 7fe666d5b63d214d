//! BI Backend Port - 远端 BI 分析服务抽象

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// BI 后端错误
#[derive(Debug, Clone, Error)]
pub enum BiBackendError {
    /// 上游返回了错误状态码
    #[error("BI backend returned HTTP {status}")]
    Status { status: u16, body: Value },

    /// 请求已发出但没有收到响应（连接拒绝、重置、超时）
    #[error("No response from BI backend: {0}")]
    NoResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// BI Backend Port
///
/// 载荷原样转发，响应原样返回，不解释字段
#[async_trait]
pub trait BiBackendPort: Send + Sync {
    async fn query(&self, payload: Value) -> Result<Value, BiBackendError>;
}
