//! Query Context - BI 查询限界上下文
//!
//! 网关不解释查询内容，这里只描述约定的请求形状

mod value_objects;

pub use value_objects::QueryRequest;
