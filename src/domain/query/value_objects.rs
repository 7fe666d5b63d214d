//! Query Context - Value Objects

use serde::Deserialize;
use serde_json::Value;

/// 约定的 BI 查询请求体
///
/// 网关原样转发任意 JSON，这个类型只用于日志
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_history: Option<String>,
}

impl QueryRequest {
    /// 尝试按约定形状解读任意载荷，不符合时返回 None
    pub fn from_payload(payload: &Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}
