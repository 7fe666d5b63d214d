//! HTTP Handlers

mod cache;
mod ping;
mod query;
mod speech;

pub use cache::*;
pub use ping::*;
pub use query::*;
pub use speech::*;
