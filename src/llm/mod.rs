//! LLM 层：合成网关抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_synthesizer, deepseek_model, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use mock::MockSynthesizer;
pub use openai::{OpenAiSynthesizer, TokenUsage};
pub use traits::{LlmError, SynthesisGateway};
