//! Speech Synthesis Handlers

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::application::{CacheStatus, SynthesizeSpeech};
use crate::infrastructure::http::dto::SynthesizeSpeechRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const X_CACHE: &str = "x-cache";

/// POST /speech-synthesis - 返回 audio/mpeg
pub async fn synthesize_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SynthesizeSpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let command = SynthesizeSpeech {
        text: req.text,
        voice_id: req.voice_id,
    };
    let result = state.synthesize_speech_handler.handle(command).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(header::CONTENT_LENGTH, result.audio.len())
        .header(X_CACHE, result.cache_status.as_str());

    if result.cache_status == CacheStatus::Hit {
        builder = builder.header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.client_cache_max_age_secs),
        );
    }

    builder
        .body(Body::from(result.audio))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
