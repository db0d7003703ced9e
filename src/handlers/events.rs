//! Events Handler：事件列表页
//!
//! 分发条件：requestType 包含 `EVENT`（如 GET_EVENTS），或 `parameters.page == "events"`。
//! 单分支：保留调用方的类别 / 严重度 / 范围过滤；有数据时生成摘要，否则返回固定文案。

use async_trait::async_trait;
use serde_json::json;

use crate::dispatch::RequestKind;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::handlers::common::{
    category_counts, count_phrase, degraded_sources, fetch_events, severity_counts,
    synthesize_or_fallback, ConversationContext, ResponseSource, Synthesis,
};
use crate::handlers::{HandlerContext, PageHandler, PromptBuilder};

pub const EVENTS_PAGE: &str = "events";
pub const EVENTS_PRIORITY: i32 = 20;
pub const EVENTS_PAGE_LIMIT: usize = 25;

pub const NO_EVENTS_MESSAGE: &str = "No active events match your filters right now.";

pub struct EventsHandler {
    ctx: HandlerContext,
}

impl EventsHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PageHandler for EventsHandler {
    fn page_type(&self) -> &str {
        EVENTS_PAGE
    }

    fn priority(&self) -> i32 {
        EVENTS_PRIORITY
    }

    fn kinds(&self) -> &[RequestKind] {
        &[RequestKind::Events]
    }

    async fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let area = ConversationContext::resolve(&request, &self.ctx.settings.default_area).area;

        let sub_request = request
            .derive_sub_request("events", "GET_EVENTS")
            .max_results(request.max_results().unwrap_or(EVENTS_PAGE_LIMIT))
            .build();
        let events = fetch_events(&self.ctx, sub_request).await;

        let synthesis = if events.items.is_empty() {
            Synthesis {
                text: NO_EVENTS_MESSAGE.to_string(),
                source: ResponseSource::Static,
            }
        } else {
            let question = request
                .query()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Summarize the most important events in {area}."));
            let prompt = PromptBuilder::new(
                "You write the two-sentence summary shown above a list of city events.",
            )
            .events(&events.items)
            .query(question)
            .build();
            let fallback = format!(
                "Found {} in {}.",
                count_phrase(events.items.len(), "event", "events"),
                area
            );
            let label = format!("synthesis:{}", request.request_id());
            synthesize_or_fallback(&self.ctx, &label, prompt, fallback).await
        };

        tracing::info!(
            request_id = request.request_id(),
            events = events.items.len(),
            source = ?synthesis.source,
            "events page handled"
        );

        ResponseEnvelope::builder(request.request_id(), EVENTS_PAGE)
            .message(synthesis.text)
            .metadata("area", json!(area))
            .metadata("total", json!(events.items.len()))
            .metadata("severity_counts", severity_counts(&events.items))
            .metadata("category_counts", category_counts(&events.items))
            .metadata("response_source", json!(synthesis.source))
            .metadata(
                "degraded_sources",
                degraded_sources(&[(events.label.as_str(), events.degraded)]),
            )
            .events(events.items)
            .build()
    }

    fn description(&self) -> &str {
        "Filtered event listing with a short summary (requestType contains EVENT or page=events)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{CityEvent, EventCategory, Severity};
    use crate::test_support::{context_with, CountingGateway, StaticAlertsAgent, StaticEventsAgent};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_listing_skips_gateway() {
        let gateway = Arc::new(CountingGateway::ok("x"));
        let ctx = context_with(
            Arc::new(StaticEventsAgent::new(vec![])),
            Arc::new(StaticAlertsAgent::new(vec![])),
            gateway.clone(),
        );
        let resp = EventsHandler::new(ctx)
            .handle(RequestEnvelope::builder("GET_EVENTS").build())
            .await;
        assert!(resp.success());
        assert_eq!(resp.message(), NO_EVENTS_MESSAGE);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_counts_events() {
        let events = vec![
            CityEvent::new("1", "Jam", EventCategory::Traffic, Severity::High),
            CityEvent::new("2", "Rain", EventCategory::Weather, Severity::Moderate),
        ];
        let events_agent = Arc::new(StaticEventsAgent::new(events));
        let ctx = context_with(
            events_agent.clone(),
            Arc::new(StaticAlertsAgent::new(vec![])),
            Arc::new(CountingGateway::failing()),
        );
        let resp = EventsHandler::new(ctx)
            .handle(
                RequestEnvelope::builder("GET_EVENTS")
                    .request_id("r9")
                    .area("Indiranagar")
                    .severity_filter(Severity::Moderate)
                    .build(),
            )
            .await;
        assert_eq!(resp.message(), "Found 2 events in Indiranagar.");
        assert_eq!(resp.events().len(), 2);
        assert_eq!(resp.metadata()["severity_counts"]["high"], json!(1));
        assert_eq!(resp.metadata()["category_counts"]["weather"], json!(1));

        let seen = events_agent.seen_requests();
        assert_eq!(seen[0].request_id(), "r9_events");
        assert_eq!(seen[0].severity_filter(), Some(Severity::Moderate));
        assert_eq!(seen[0].max_results(), Some(EVENTS_PAGE_LIMIT));
    }
}
