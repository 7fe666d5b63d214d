//! Speech Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechDomainError {
    #[error("Text is required")]
    EmptyText,

    #[error("Invalid voice id: {0}")]
    InvalidVoiceId(String),
}
