//! Dashboard Handler：地图仪表盘简报
//!
//! 分发条件：requestType 包含 `DASHBOARD`，或 `parameters.page == "dashboard"`。
//! 并发拉取事件与预警，汇合后生成统计与一段简报。

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::dispatch::RequestKind;
use crate::envelope::{AlertRecord, CityEvent, RequestEnvelope, ResponseEnvelope, Severity};
use crate::handlers::common::{
    category_counts, count_phrase, degraded_sources, fetch_alerts, fetch_events,
    severity_counts, synthesize_or_fallback, ConversationContext, ResponseSource, Synthesis,
};
use crate::handlers::{HandlerContext, PageHandler, PromptBuilder};

pub const DASHBOARD_PAGE: &str = "dashboard";
pub const DASHBOARD_PRIORITY: i32 = 50;
pub const DASHBOARD_EVENTS_LIMIT: usize = 50;
pub const DASHBOARD_ALERTS_LIMIT: usize = 10;

pub const DASHBOARD_ALL_CLEAR: &str = "All clear: there are no active events or alerts right now.";

fn dashboard_stats(events: &[CityEvent], alerts: &[AlertRecord]) -> Value {
    let now = Utc::now();
    json!({
        "events_total": events.len(),
        "alerts_total": alerts.len(),
        "critical_events": events.iter().filter(|e| e.severity == Severity::Critical).count(),
        "high_events": events.iter().filter(|e| e.severity == Severity::High).count(),
        "recent_events": events.iter().filter(|e| e.is_recent_at(now)).count(),
        "critical_alerts": alerts.iter().filter(|a| a.severity() == Some(Severity::Critical)).count(),
        "by_severity": severity_counts(events),
        "by_category": category_counts(events),
    })
}

pub struct DashboardHandler {
    ctx: HandlerContext,
}

impl DashboardHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PageHandler for DashboardHandler {
    fn page_type(&self) -> &str {
        DASHBOARD_PAGE
    }

    fn priority(&self) -> i32 {
        DASHBOARD_PRIORITY
    }

    fn kinds(&self) -> &[RequestKind] {
        &[RequestKind::Dashboard]
    }

    async fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let area = ConversationContext::resolve(&request, &self.ctx.settings.default_area).area;

        let events_request = request
            .derive_sub_request("dashboard_events", "GET_EVENTS")
            .max_results(DASHBOARD_EVENTS_LIMIT)
            .build();
        let alerts_request = request
            .derive_sub_request("dashboard_alerts", "CHECK_ALERTS")
            .max_results(DASHBOARD_ALERTS_LIMIT)
            .build();

        let (events, alerts) = tokio::join!(
            fetch_events(&self.ctx, events_request),
            fetch_alerts(&self.ctx, alerts_request),
        );

        let stats = dashboard_stats(&events.items, &alerts.items);

        let synthesis = if events.items.is_empty() && alerts.items.is_empty() {
            Synthesis {
                text: DASHBOARD_ALL_CLEAR.to_string(),
                source: ResponseSource::Static,
            }
        } else {
            let prompt = PromptBuilder::new(
                "You write the three-sentence situation briefing at the top of a city operations dashboard.",
            )
            .events(&events.items)
            .alerts(&alerts.items)
            .query(format!("What is the current situation in {area}?"))
            .build();
            let fallback = format!(
                "{} and {} currently tracked in {}.",
                count_phrase(events.items.len(), "event", "events"),
                count_phrase(alerts.items.len(), "alert", "alerts"),
                area
            );
            let label = format!("synthesis:{}", request.request_id());
            synthesize_or_fallback(&self.ctx, &label, prompt, fallback).await
        };

        tracing::info!(
            request_id = request.request_id(),
            events = events.items.len(),
            alerts = alerts.items.len(),
            source = ?synthesis.source,
            "dashboard handled"
        );

        ResponseEnvelope::builder(request.request_id(), DASHBOARD_PAGE)
            .message(synthesis.text)
            .metadata("area", json!(area))
            .metadata("stats", stats)
            .metadata("response_source", json!(synthesis.source))
            .metadata(
                "degraded_sources",
                degraded_sources(&[
                    (events.label.as_str(), events.degraded),
                    (alerts.label.as_str(), alerts.degraded),
                ]),
            )
            .events(events.items)
            .alerts(alerts.items)
            .build()
    }

    fn description(&self) -> &str {
        "Situation briefing and statistics for the map dashboard (requestType contains DASHBOARD or page=dashboard)"
    }
}
