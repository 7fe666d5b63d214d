//! 应用层 - 命令
//!
//! 两个网关各自的命令及处理器

mod query_commands;
mod speech_commands;

pub mod handlers;

pub use query_commands::*;
pub use speech_commands::*;
