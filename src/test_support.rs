//! 单元测试用替身：可计数的网关、静态 / 失败 / 慢速 Agent

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::agents::{Agent, AgentSet};
use crate::core::AgentError;
use crate::envelope::{AlertRecord, CityEvent, RequestEnvelope, ResponseEnvelope};
use crate::handlers::{HandlerContext, HandlerSettings};
use crate::llm::{LlmError, SynthesisGateway};

pub fn test_settings() -> HandlerSettings {
    HandlerSettings {
        default_area: "Bengaluru".to_string(),
        agent_timeout: Duration::from_secs(1),
        synthesis_timeout: Duration::from_millis(300),
    }
}

pub fn context_with(
    events: Arc<dyn Agent>,
    alerts: Arc<dyn Agent>,
    gateway: Arc<dyn SynthesisGateway>,
) -> HandlerContext {
    HandlerContext::new(AgentSet::new(events, alerts), gateway, test_settings())
}

/// 返回固定事件，不做过滤；记录收到的请求
pub struct StaticEventsAgent {
    events: Vec<CityEvent>,
    seen: Mutex<Vec<RequestEnvelope>>,
}

impl StaticEventsAgent {
    pub fn new(events: Vec<CityEvent>) -> Self {
        Self {
            events,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_requests(&self) -> Vec<RequestEnvelope> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for StaticEventsAgent {
    fn agent_id(&self) -> &str {
        "static_events"
    }

    fn description(&self) -> &str {
        "static events"
    }

    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(ResponseEnvelope::builder(request.request_id(), "static_events")
            .events(self.events.clone())
            .build())
    }
}

pub struct StaticAlertsAgent {
    alerts: Vec<AlertRecord>,
    seen: Mutex<Vec<RequestEnvelope>>,
}

impl StaticAlertsAgent {
    pub fn new(alerts: Vec<AlertRecord>) -> Self {
        Self {
            alerts,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_requests(&self) -> Vec<RequestEnvelope> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for StaticAlertsAgent {
    fn agent_id(&self) -> &str {
        "static_alerts"
    }

    fn description(&self) -> &str {
        "static alerts"
    }

    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(ResponseEnvelope::builder(request.request_id(), "static_alerts")
            .alerts(self.alerts.clone())
            .build())
    }
}

/// 总是返回 Err 的 Agent
pub struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    fn agent_id(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn process_request(&self, _request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        Err(AgentError::Failed("backend exploded".into()))
    }
}

/// 先睡眠再返回数据
pub struct SlowAgent {
    delay: Duration,
    events: Vec<CityEvent>,
    alerts: Vec<AlertRecord>,
}

impl SlowAgent {
    pub fn events(delay: Duration, events: Vec<CityEvent>) -> Self {
        Self {
            delay,
            events,
            alerts: Vec::new(),
        }
    }

    pub fn alerts(delay: Duration, alerts: Vec<AlertRecord>) -> Self {
        Self {
            delay,
            events: Vec::new(),
            alerts,
        }
    }
}

#[async_trait]
impl Agent for SlowAgent {
    fn agent_id(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "sleeps before answering"
    }

    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        tokio::time::sleep(self.delay).await;
        Ok(ResponseEnvelope::builder(request.request_id(), "slow")
            .events(self.events.clone())
            .alerts(self.alerts.clone())
            .build())
    }
}

/// 记录调用次数与最后一次输入的网关
pub struct CountingGateway {
    reply: Result<String, LlmError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last: Mutex<Option<(Vec<String>, String)>>,
}

impl CountingGateway {
    pub fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(LlmError::ApiError("503 upstream".into())),
            ..Self::ok("")
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok("too late")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(Vec<String>, String)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisGateway for CountingGateway {
    fn name(&self) -> &str {
        "counting"
    }

    async fn synthesize(&self, grounding: &[String], prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((grounding.to_vec(), prompt.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
