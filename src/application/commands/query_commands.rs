//! Query Commands - BI 查询转发命令

use serde_json::Value;

/// 转发 BI 查询命令
#[derive(Debug, Clone)]
pub struct ForwardQuery {
    /// 原样转发的请求体
    pub payload: Value,
}

/// 转发 BI 查询响应
#[derive(Debug, Clone)]
pub struct ForwardQueryResponse {
    /// 上游原样返回的 JSON
    pub body: Value,
}
