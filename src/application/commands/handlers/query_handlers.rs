//! Query Command Handlers

use std::sync::Arc;

use serde_json::Value;

use crate::application::commands::query_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::BiBackendPort;
use crate::domain::query::QueryRequest;

/// ForwardQuery Handler - 转发 BI 查询
///
/// 不重试，不覆盖传输层超时
pub struct ForwardQueryHandler {
    bi_backend: Arc<dyn BiBackendPort>,
}

impl ForwardQueryHandler {
    pub fn new(bi_backend: Arc<dyn BiBackendPort>) -> Self {
        Self { bi_backend }
    }

    pub async fn handle(&self, command: ForwardQuery) -> Result<ForwardQueryResponse, ApplicationError> {
        if command.payload.is_null() {
            return Err(ApplicationError::invalid_input("Request body is required"));
        }

        match QueryRequest::from_payload(&command.payload) {
            Some(query) => tracing::info!(
                question_chars = query.question.chars().count(),
                has_history = query.conversation_history.is_some(),
                "Forwarding BI query"
            ),
            None => tracing::info!(
                payload_kind = payload_kind(&command.payload),
                "Forwarding non-standard BI payload"
            ),
        }

        let body = self.bi_backend.query(command.payload).await.map_err(|e| {
            tracing::warn!(error = %e, "BI query failed");
            ApplicationError::from(e)
        })?;

        Ok(ForwardQueryResponse { body })
    }
}

fn payload_kind(payload: &Value) -> &'static str {
    match payload {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
