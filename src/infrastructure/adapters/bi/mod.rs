//! BI Adapter - HTTP BI 后端客户端实现

mod http_bi_client;

pub use http_bi_client::*;
