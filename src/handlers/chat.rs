//! Chat Handler：对话式问答
//!
//! 分发条件：requestType 包含 `CHAT`，或 `parameters.page == "chat"`。
//!
//! 流程：
//! 1. 派生两个子请求：`<id>_chat_events`（全部严重度，最多 20 条）与 `<id>_chat_alerts`（最多 5 条）
//! 2. 并发扇出，每个分支独立隔离（失败即空列表）
//! 3. 汇合屏障：两个分支都结束后才检查数据
//! 4. 接地校验：无数据时返回固定文案，不调用网关
//! 5. 构建接地提示词 → 6. 调用网关（失败回退到引用原问题的兜底句）→ 7. 组装响应

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dispatch::RequestKind;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::handlers::common::{
    count_phrase, degraded_sources, fetch_alerts, fetch_events, synthesize_or_fallback,
    ConversationContext, ResponseSource, Synthesis,
};
use crate::handlers::{HandlerContext, PageHandler, PromptBuilder};

pub const CHAT_PAGE: &str = "chat";
pub const CHAT_PRIORITY: i32 = 100;

/// 聊天需要完整上下文，事件子请求不做严重度过滤
pub const CHAT_EVENTS_LIMIT: usize = 20;
pub const CHAT_ALERTS_LIMIT: usize = 5;

/// 无数据且无问题
pub const CHAT_GREETING: &str = "Hi! There are no current events or alerts in your area right now. Ask me about traffic, weather, outages or civic updates any time.";

/// 无数据但有问题：不把空上下文交给模型
pub const CHAT_NOTHING_TO_REPORT: &str = "I don't have any verified events or alerts that match your question right now, so there is nothing to report. Please check back a little later.";

pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What's the traffic like near me right now?",
    "Are there any weather alerts today?",
    "Are there power or water outages in my area?",
    "What events are happening in the city this weekend?",
    "Is it safe to travel to the airport now?",
];

fn persona(area: &str) -> String {
    format!(
        "You are Beacon, a friendly civic assistant that keeps residents of {area} informed about city events and alerts. Reply in at most four short sentences."
    )
}

fn default_question(area: &str) -> String {
    format!("Give me a quick summary of what's happening around {area}.")
}

/// 网关不可用时的确定性回复，原样引用用户问题
pub fn chat_fallback(question: &str, events: usize, alerts: usize, area: &str) -> String {
    format!(
        "Sorry, I couldn't put together a full answer to \"{}\" right now. I can see {} and {} for {}; please try again in a moment.",
        question,
        count_phrase(events, "event", "events"),
        count_phrase(alerts, "alert", "alerts"),
        area
    )
}

pub struct ChatHandler {
    ctx: HandlerContext,
}

impl ChatHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PageHandler for ChatHandler {
    fn page_type(&self) -> &str {
        CHAT_PAGE
    }

    fn priority(&self) -> i32 {
        CHAT_PRIORITY
    }

    fn kinds(&self) -> &[RequestKind] {
        &[RequestKind::Chat]
    }

    async fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let conversation = ConversationContext::resolve(&request, &self.ctx.settings.default_area);

        let events_request = request
            .derive_sub_request("chat_events", "GET_EVENTS")
            .include_all_severities(true)
            .max_results(CHAT_EVENTS_LIMIT)
            .build();
        let alerts_request = request
            .derive_sub_request("chat_alerts", "CHECK_ALERTS")
            .max_results(CHAT_ALERTS_LIMIT)
            .build();

        let (events, alerts) = tokio::join!(
            fetch_events(&self.ctx, events_request),
            fetch_alerts(&self.ctx, alerts_request),
        );

        let no_data = events.items.is_empty() && alerts.items.is_empty();
        let synthesis = match (no_data, request.query()) {
            (true, None) => Synthesis {
                text: CHAT_GREETING.to_string(),
                source: ResponseSource::Static,
            },
            (true, Some(_)) => Synthesis {
                text: CHAT_NOTHING_TO_REPORT.to_string(),
                source: ResponseSource::Static,
            },
            (false, query) => {
                let question = query
                    .map(str::to_string)
                    .unwrap_or_else(|| default_question(&conversation.area));
                let prompt = PromptBuilder::new(persona(&conversation.area))
                    .events(&events.items)
                    .alerts(&alerts.items)
                    .query(question.clone())
                    .build();
                let fallback = chat_fallback(
                    &question,
                    events.items.len(),
                    alerts.items.len(),
                    &conversation.area,
                );
                let label = format!("synthesis:{}", request.request_id());
                synthesize_or_fallback(&self.ctx, &label, prompt, fallback).await
            }
        };

        tracing::info!(
            request_id = request.request_id(),
            events = events.items.len(),
            alerts = alerts.items.len(),
            source = ?synthesis.source,
            "chat handled"
        );

        let suggested: Vec<Value> = SUGGESTED_QUESTIONS.iter().map(|q| json!(q)).collect();
        let degraded = degraded_sources(&[
            (events.label.as_str(), events.degraded),
            (alerts.label.as_str(), alerts.degraded),
        ]);

        ResponseEnvelope::builder(request.request_id(), CHAT_PAGE)
            .message(synthesis.text)
            .metadata("suggested_questions", Value::Array(suggested))
            .metadata("conversation_context", conversation.to_value())
            .metadata("events_count", json!(events.items.len()))
            .metadata("alerts_count", json!(alerts.items.len()))
            .metadata("response_source", json!(synthesis.source))
            .metadata("degraded_sources", degraded)
            .events(events.items)
            .alerts(alerts.items)
            .build()
    }

    fn description(&self) -> &str {
        "Conversational Q&A grounded in current city events and alerts (requestType contains CHAT or page=chat)"
    }
}
