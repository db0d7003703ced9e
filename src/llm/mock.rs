//! Mock 合成网关（用于测试与本地运行，无需 API）
//!
//! 逐条复述 grounding 事实，输出确定、可断言的文本。

use async_trait::async_trait;

use crate::llm::{LlmError, SynthesisGateway};

/// Mock 网关：把事实拼成一句回复
#[derive(Debug, Default)]
pub struct MockSynthesizer;

#[async_trait]
impl SynthesisGateway for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, grounding: &[String], _prompt: &str) -> Result<String, LlmError> {
        if grounding.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(format!("Here is what I found: {}.", grounding.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cites_every_fact() {
        let facts = vec!["Jam (traffic, high)".to_string(), "Flood (high)".to_string()];
        let text = MockSynthesizer.synthesize(&facts, "prompt").await.unwrap();
        assert!(text.contains("Jam (traffic, high)"));
        assert!(text.contains("Flood (high)"));
    }

    #[tokio::test]
    async fn test_refuses_empty_grounding() {
        let err = MockSynthesizer.synthesize(&[], "prompt").await.unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
    }
}
