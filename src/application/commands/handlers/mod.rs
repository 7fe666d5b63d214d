//! Command Handlers 实现

mod query_handlers;
mod speech_handlers;

pub use query_handlers::*;
pub use speech_handlers::*;
