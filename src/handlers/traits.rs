//! Page Handler 抽象
//!
//! Handler 声明自己接收哪些请求（kinds + can_handle）与优先级，并实现编排协议：
//! 扇出到 Agent → 汇合 → 接地校验 → 合成（带兜底）→ 组装响应。
//! handle 总是返回 success = true 的响应，失败在内部隔离。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::agents::AgentSet;
use crate::config::AppConfig;
use crate::dispatch::RequestKind;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::llm::SynthesisGateway;

#[async_trait]
pub trait PageHandler: Send + Sync {
    /// 页面标签（chat / events / alerts / dashboard），同时作为响应的 agent_id
    fn page_type(&self) -> &str;

    /// 优先级：数值越大越先尝试
    fn priority(&self) -> i32;

    /// 注册到分发表中的请求类别
    fn kinds(&self) -> &[RequestKind];

    /// 最终判定；默认只要任一 kind 与请求匹配即可
    fn can_handle(&self, request: &RequestEnvelope) -> bool {
        self.kinds().iter().any(|k| k.matches(request))
    }

    async fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope;

    fn description(&self) -> &str;
}

/// Handler 的运行参数（来自配置，启动后不变）
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// 请求没有片区时使用的规范区域名
    pub default_area: String,
    pub agent_timeout: Duration,
    pub synthesis_timeout: Duration,
}

impl HandlerSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            default_area: cfg.app.default_area.clone(),
            agent_timeout: cfg.agents.timeout(),
            synthesis_timeout: cfg.llm.timeouts.synthesis(),
        }
    }
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Handler 共享依赖：Agent 集合、合成网关、运行参数
#[derive(Clone)]
pub struct HandlerContext {
    pub agents: AgentSet,
    pub gateway: Arc<dyn SynthesisGateway>,
    pub settings: HandlerSettings,
}

impl HandlerContext {
    pub fn new(agents: AgentSet, gateway: Arc<dyn SynthesisGateway>, settings: HandlerSettings) -> Self {
        Self {
            agents,
            gateway,
            settings,
        }
    }
}
