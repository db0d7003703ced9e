//! 错误类型
//!
//! 分支错误（AgentError / SourceError）在调用点被吸收为默认值，不会冒泡到请求层；
//! 唯一向调用方暴露的是 DispatchError（没有 Handler 可处理）。

use thiserror::Error;

/// 后端数据源错误（HTTP、文件、格式）
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Agent 处理过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Source failure: {0}")]
    Source(#[from] SourceError),

    #[error("Agent timeout: {0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Agent failed: {0}")]
    Failed(String),
}

/// 分发错误：没有任何 Handler 的 can_handle 返回 true
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No handler available for request type '{request_type}'")]
    NoHandler { request_type: String },
}
