//! Alerts Handler：预警页
//!
//! 分发条件：requestType 包含 `ALERT`（如 CHECK_ALERTS），或 `parameters.page == "alerts"`。

use async_trait::async_trait;
use serde_json::json;

use crate::dispatch::RequestKind;
use crate::envelope::{RequestEnvelope, ResponseEnvelope, Severity};
use crate::handlers::common::{
    count_phrase, degraded_sources, fetch_alerts, synthesize_or_fallback,
    ConversationContext, ResponseSource, Synthesis,
};
use crate::handlers::{HandlerContext, PageHandler, PromptBuilder};

pub const ALERTS_PAGE: &str = "alerts";
pub const ALERTS_PRIORITY: i32 = 30;
pub const ALERTS_PAGE_LIMIT: usize = 10;

pub const NO_ALERTS_MESSAGE: &str = "There are no active alerts for your area right now.";

pub struct AlertsHandler {
    ctx: HandlerContext,
}

impl AlertsHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PageHandler for AlertsHandler {
    fn page_type(&self) -> &str {
        ALERTS_PAGE
    }

    fn priority(&self) -> i32 {
        ALERTS_PRIORITY
    }

    fn kinds(&self) -> &[RequestKind] {
        &[RequestKind::Alerts]
    }

    async fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let area = ConversationContext::resolve(&request, &self.ctx.settings.default_area).area;

        let sub_request = request
            .derive_sub_request("alerts", "CHECK_ALERTS")
            .max_results(request.max_results().unwrap_or(ALERTS_PAGE_LIMIT))
            .build();
        let alerts = fetch_alerts(&self.ctx, sub_request).await;

        let critical = alerts
            .items
            .iter()
            .filter(|a| a.severity() == Some(Severity::Critical))
            .count();
        let high = alerts
            .items
            .iter()
            .filter(|a| a.severity() == Some(Severity::High))
            .count();

        let synthesis = if alerts.items.is_empty() {
            Synthesis {
                text: NO_ALERTS_MESSAGE.to_string(),
                source: ResponseSource::Static,
            }
        } else {
            let question = request
                .query()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Which alerts should residents of {area} act on first?"));
            let prompt = PromptBuilder::new(
                "You brief residents on active civic alerts, most severe first, in plain language.",
            )
            .alerts(&alerts.items)
            .query(question)
            .build();
            let fallback = format!(
                "{} in {}.",
                count_phrase(alerts.items.len(), "active alert", "active alerts"),
                area
            );
            let label = format!("synthesis:{}", request.request_id());
            synthesize_or_fallback(&self.ctx, &label, prompt, fallback).await
        };

        tracing::info!(
            request_id = request.request_id(),
            alerts = alerts.items.len(),
            critical,
            source = ?synthesis.source,
            "alerts page handled"
        );

        ResponseEnvelope::builder(request.request_id(), ALERTS_PAGE)
            .message(synthesis.text)
            .metadata("area", json!(area))
            .metadata("total", json!(alerts.items.len()))
            .metadata("critical_count", json!(critical))
            .metadata("high_count", json!(high))
            .metadata("response_source", json!(synthesis.source))
            .metadata(
                "degraded_sources",
                degraded_sources(&[(alerts.label.as_str(), alerts.degraded)]),
            )
            .alerts(alerts.items)
            .build()
    }

    fn description(&self) -> &str {
        "Active alerts briefing (requestType contains ALERT or page=alerts)"
    }
}
