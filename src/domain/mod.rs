//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Speech Context: 语音合成文本、音色与缓存 key
//! - Query Context: BI 查询请求

pub mod query;
pub mod speech;
