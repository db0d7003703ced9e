//! Agent 抽象
//!
//! 每个 Agent 负责一类领域数据（事件、预警…），接收请求信封并异步返回响应信封。
//! 约定：后端失败由 Agent 自行降级（空数据 + metadata.degraded），
//! 返回 Err 只作为调用点隔离边界的最后防线。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};

#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent 标识（写入响应的 agent_id）
    fn agent_id(&self) -> &str;

    fn description(&self) -> &str;

    /// 处理请求：事件类 Agent 只填 events，预警类只填 alerts
    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError>;
}

/// Handler 可用的 Agent 集合，进程启动时组装，之后只读共享
#[derive(Clone)]
pub struct AgentSet {
    pub events: Arc<dyn Agent>,
    pub alerts: Arc<dyn Agent>,
}

impl AgentSet {
    pub fn new(events: Arc<dyn Agent>, alerts: Arc<dyn Agent>) -> Self {
        Self { events, alerts }
    }
}
