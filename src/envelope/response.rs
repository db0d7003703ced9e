//! 响应信封
//!
//! success 只在请求结构上无法处理（无 Handler 匹配）时为 false；
//! Agent / LLM 失败不会翻转它。message 永不为空。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::{AlertRecord, CityEvent};

/// message 为空时的兜底文本
pub const DEFAULT_MESSAGE: &str = "Your request was processed, but there is nothing to show yet.";

/// Agent 在 metadata 中标记自身已降级（后端不可用）的键
pub const DEGRADED_KEY: &str = "degraded";

/// 响应信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    request_id: String,
    agent_id: String,
    success: bool,
    message: String,
    #[serde(default)]
    events: Vec<CityEvent>,
    #[serde(default)]
    alerts: Vec<AlertRecord>,
    #[serde(default)]
    metadata: Map<String, Value>,
    timestamp: DateTime<Utc>,
}

impl ResponseEnvelope {
    pub fn builder(request_id: impl Into<String>, agent_id: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder::new(request_id, agent_id)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn events(&self) -> &[CityEvent] {
        &self.events
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Agent 是否报告了降级
    pub fn is_degraded(&self) -> bool {
        self.metadata
            .get(DEGRADED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn into_events(self) -> Vec<CityEvent> {
        self.events
    }

    pub fn into_alerts(self) -> Vec<AlertRecord> {
        self.alerts
    }
}

/// 响应构建器
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    request_id: String,
    agent_id: String,
    success: bool,
    message: String,
    events: Vec<CityEvent>,
    alerts: Vec<AlertRecord>,
    metadata: Map<String, Value>,
}

impl ResponseBuilder {
    pub fn new(request_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            agent_id: agent_id.into(),
            success: true,
            message: String::new(),
            events: Vec::new(),
            alerts: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn events(mut self, events: Vec<CityEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn alerts(mut self, alerts: Vec<AlertRecord>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn degraded(self) -> Self {
        self.metadata(DEGRADED_KEY, Value::Bool(true))
    }

    /// 结构性失败（仅分发器在无 Handler 匹配时使用）
    pub fn failure(mut self) -> Self {
        self.success = false;
        self
    }

    pub fn build(self) -> ResponseEnvelope {
        let message = if self.message.trim().is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            self.message
        };
        ResponseEnvelope {
            request_id: self.request_id,
            agent_id: self.agent_id,
            success: self.success,
            message,
            events: self.events,
            alerts: self.alerts,
            metadata: self.metadata,
            timestamp: Utc::now(),
        }
    }
}
