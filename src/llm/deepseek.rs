//! DeepSeek 预设：OpenAI 兼容端点 + 模型名校正
//!
//! 端点默认 https://api.deepseek.com，[llm] base_url 可改指向自建代理。
//! 配置的 model 不是 deepseek-* 时（例如沿用了 gpt-4o-mini）改用 deepseek-chat；
//! 简报类合成不需要思考模式，deepseek-reasoner 只在显式配置时使用。

use crate::config::LlmSection;
use crate::llm::OpenAiSynthesizer;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

/// 实际请求的模型名
pub fn deepseek_model(configured: &str) -> &str {
    let model = configured.trim();
    if model.starts_with("deepseek-") {
        model
    } else {
        DEEPSEEK_CHAT
    }
}

/// DEEPSEEK_API_KEY 优先，其次 OPENAI_API_KEY
pub fn deepseek_api_key() -> Option<String> {
    std::env::var("DEEPSEEK_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
}

pub fn create_deepseek_synthesizer(llm: &LlmSection) -> OpenAiSynthesizer {
    let model = deepseek_model(&llm.model);
    if model != llm.model.trim() {
        tracing::warn!(
            configured = %llm.model,
            "Model is not a DeepSeek model, using {}",
            model
        );
    }
    let base_url = llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
    OpenAiSynthesizer::new(Some(base_url), model, deepseek_api_key().as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SynthesisGateway;

    #[test]
    fn test_model_resolution() {
        assert_eq!(deepseek_model("deepseek-chat"), DEEPSEEK_CHAT);
        assert_eq!(deepseek_model(" deepseek-reasoner "), DEEPSEEK_REASONER);
        assert_eq!(deepseek_model("gpt-4o-mini"), DEEPSEEK_CHAT);
        assert_eq!(deepseek_model(""), DEEPSEEK_CHAT);
    }

    #[test]
    fn test_foreign_model_replaced() {
        let llm = LlmSection {
            provider: "deepseek".to_string(),
            model: "gpt-4o-mini".to_string(),
            ..LlmSection::default()
        };
        assert_eq!(create_deepseek_synthesizer(&llm).name(), DEEPSEEK_CHAT);
    }
}
