//! Beacon - 城市事件与预警的 Agent 分发与回复合成核心
//!
//! 模块划分：
//! - **envelope**: 请求 / 响应信封与领域数据（CityEvent、AlertRecord）
//! - **agents**: 领域检索单元（Events / Alerts）及其数据源（内存、文件、HTTP）
//! - **handlers**: 页面编排器（chat / events / alerts / dashboard）、接地提示词与兜底
//! - **dispatch**: 请求类别归一与按优先级选择 Handler 的注册表
//! - **llm**: 合成网关抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **core**: 错误类型与分支隔离（超时、错误、panic 均降级为默认值）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **app**: 由配置装配网关、Agent 与分发器
//! - **observability**: 日志初始化

pub mod agents;
pub mod app;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod envelope;
pub mod handlers;
pub mod llm;
pub mod observability;

#[cfg(test)]
mod test_support;

pub use app::{create_default_dispatcher, create_dispatcher};
pub use dispatch::Dispatcher;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
