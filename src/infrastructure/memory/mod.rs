//! Memory Layer - In-Memory State Management
//!
//! 实现进程内的合成音频缓存，生命周期与进程一致

mod speech_cache;

pub use speech_cache::InMemorySpeechCache;
