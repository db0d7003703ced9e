//! 核心层：错误类型与失败隔离组合子

pub mod error;
pub mod isolation;

pub use error::{AgentError, DispatchError, SourceError};
pub use isolation::{isolate, with_fallback, BranchOutcome, Isolated};
