//! Events Agent：从事件源取数并按请求过滤
//!
//! 过滤顺序：去过期 → 类别 → 最低严重度（include_all_severities 时跳过）→ 时间窗口 → 范围；
//! 之后按严重度降序、时间降序排序并截断到 max_results。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::agents::{area_matches, Agent, EventSource};
use crate::core::AgentError;
use crate::envelope::{CityEvent, RequestEnvelope, ResponseEnvelope};

pub const EVENTS_AGENT_ID: &str = "events_agent";

/// 未指定 radius_km 时的搜索半径
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// 未指定 max_results 时的返回上限
pub const DEFAULT_MAX_EVENTS: usize = 50;

pub struct EventsAgent {
    source: Arc<dyn EventSource>,
}

impl EventsAgent {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }
}

/// 范围判断：双方都有坐标时只看距离；否则请求带片区时事件片区必须匹配（无片区的事件丢弃）；
/// 请求没有片区时不按片区过滤
fn in_range(event: &CityEvent, request: &RequestEnvelope) -> bool {
    if let Some((lat, lon)) = request.coordinates() {
        if let Some(distance) = event.distance_from_meters(lat, lon) {
            let radius_m = request.radius_km().unwrap_or(DEFAULT_RADIUS_KM) * 1000.0;
            return distance <= radius_m;
        }
    }
    match request.area() {
        Some(wanted) => event
            .location
            .area
            .as_deref()
            .is_some_and(|have| area_matches(have, wanted)),
        None => true,
    }
}

/// 纯函数过滤，便于测试
pub fn select_events(
    events: Vec<CityEvent>,
    request: &RequestEnvelope,
    now: DateTime<Utc>,
) -> Vec<CityEvent> {
    let min_severity = if request.parameters().include_all_severities() {
        None
    } else {
        request.severity_filter()
    };
    let limit = request
        .max_results()
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_EVENTS);

    let mut selected: Vec<CityEvent> = events
        .into_iter()
        .filter(|e| !e.is_expired_at(now))
        .filter(|e| request.category().map_or(true, |c| e.category == c))
        .filter(|e| min_severity.map_or(true, |min| e.severity >= min))
        .filter(|e| request.time_window().map_or(true, |w| w.contains(e.timestamp)))
        .filter(|e| in_range(e, request))
        .collect();

    selected.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    selected.truncate(limit);
    selected
}

#[async_trait]
impl Agent for EventsAgent {
    fn agent_id(&self) -> &str {
        EVENTS_AGENT_ID
    }

    fn description(&self) -> &str {
        "Retrieves city events (traffic, weather, civic, ...) filtered by location, category and severity"
    }

    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        let builder = ResponseEnvelope::builder(request.request_id(), EVENTS_AGENT_ID);

        match self.source.fetch_events(&request).await {
            Ok(raw) => {
                let fetched = raw.len();
                let events = select_events(raw, &request, Utc::now());
                tracing::debug!(
                    request_id = request.request_id(),
                    source = self.source.name(),
                    fetched,
                    selected = events.len(),
                    "events selected"
                );
                Ok(builder
                    .message(format!("Found {} events", events.len()))
                    .events(events)
                    .build())
            }
            Err(e) => {
                tracing::warn!(
                    request_id = request.request_id(),
                    source = self.source.name(),
                    "Event source failed ({}), returning empty result",
                    e
                );
                Ok(builder
                    .message("Events are temporarily unavailable")
                    .degraded()
                    .build())
            }
        }
    }
}
