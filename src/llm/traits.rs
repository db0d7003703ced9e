//! AI 合成网关抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 SynthesisGateway：
//! 输入一组已核实的事实（grounding）与提示词，返回自由文本；可能失败或超时。

use async_trait::async_trait;
use thiserror::Error;

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

/// 合成网关 trait
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    /// 网关名称（日志用）
    fn name(&self) -> &str;

    /// 基于 grounding 事实与 prompt 生成回复
    async fn synthesize(&self, grounding: &[String], prompt: &str) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
