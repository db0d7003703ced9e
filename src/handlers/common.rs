//! Handler 公共部件：隔离分支、合成兜底、会话上下文、统计
//!
//! 所有 Agent / 网关调用都经过 core::isolate，保证分支必定以值（成功值或默认值）结束。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::agents::Agent;
use crate::core::{isolate, BranchOutcome};
use crate::envelope::{AlertRecord, CityEvent, RequestEnvelope, ResponseEnvelope, Severity};
use crate::handlers::{GroundedPrompt, HandlerContext};
use crate::llm::LlmError;

/// 会话 / 用户标识缺省值
pub const ANONYMOUS: &str = "anonymous";

/// 单个扇出分支的结果
#[derive(Debug, Clone)]
pub struct BranchResult<T> {
    pub label: String,
    pub items: Vec<T>,
    /// 隔离边界触发（错误 / 超时 / panic）或 Agent 自报降级
    pub degraded: bool,
}

async fn run_branch<T, F>(
    ctx: &HandlerContext,
    agent: Arc<dyn Agent>,
    request: RequestEnvelope,
    extract: F,
) -> BranchResult<T>
where
    T: Send + 'static,
    F: FnOnce(ResponseEnvelope) -> Vec<T> + Send + 'static,
{
    let label = format!("{}:{}", agent.agent_id(), request.request_id());
    let isolated = isolate(
        &label,
        ctx.settings.agent_timeout,
        async move {
            let response = agent.process_request(request).await?;
            let reported = response.is_degraded();
            Ok::<_, crate::core::AgentError>((extract(response), reported))
        },
        (Vec::new(), false),
    )
    .await;

    let (items, reported) = isolated.value;
    BranchResult {
        label,
        items,
        degraded: reported || isolated.outcome != BranchOutcome::Ok,
    }
}

pub async fn fetch_events(ctx: &HandlerContext, request: RequestEnvelope) -> BranchResult<CityEvent> {
    run_branch(ctx, ctx.agents.events.clone(), request, ResponseEnvelope::into_events).await
}

pub async fn fetch_alerts(ctx: &HandlerContext, request: RequestEnvelope) -> BranchResult<AlertRecord> {
    run_branch(ctx, ctx.agents.alerts.clone(), request, ResponseEnvelope::into_alerts).await
}

/// 合成结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// 网关生成
    Ai,
    /// 网关失败后的确定性兜底
    Fallback,
    /// 无数据，固定文案（未调用网关）
    Static,
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub text: String,
    pub source: ResponseSource,
}

/// 调用网关；失败、超时或空白输出时返回 fallback
pub async fn synthesize_or_fallback(
    ctx: &HandlerContext,
    label: &str,
    prompt: GroundedPrompt,
    fallback: String,
) -> Synthesis {
    let gateway = ctx.gateway.clone();
    tracing::debug!(
        branch = label,
        gateway = gateway.name(),
        facts = prompt.facts.len(),
        prompt_chars = prompt.text.len(),
        "synthesizing"
    );
    let isolated = isolate(
        label,
        ctx.settings.synthesis_timeout,
        async move {
            let text = gateway.synthesize(&prompt.facts, &prompt.text).await?;
            let text = text.trim();
            if text.is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            Ok(Some(text.to_string()))
        },
        None,
    )
    .await;

    match isolated.value {
        Some(text) => Synthesis {
            text,
            source: ResponseSource::Ai,
        },
        None => Synthesis {
            text: fallback,
            source: ResponseSource::Fallback,
        },
    }
}

/// 会话上下文：缺失字段使用默认片区 / anonymous
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub area: String,
    pub session_id: String,
    pub user_id: String,
    pub has_coordinates: bool,
}

impl ConversationContext {
    pub fn resolve(request: &RequestEnvelope, default_area: &str) -> Self {
        let params = request.parameters();
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        Self {
            area: request.area().unwrap_or(default_area).to_string(),
            session_id: non_blank(&params.session_id).unwrap_or_else(|| ANONYMOUS.to_string()),
            user_id: non_blank(&params.user_id).unwrap_or_else(|| ANONYMOUS.to_string()),
            has_coordinates: request.coordinates().is_some(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// 降级分支标签列表
pub fn degraded_sources(labels: &[(&str, bool)]) -> Value {
    Value::Array(
        labels
            .iter()
            .filter(|(_, degraded)| *degraded)
            .map(|(label, _)| Value::String(label.to_string()))
            .collect(),
    )
}

/// 各严重度计数（四档全部列出）
pub fn severity_counts(events: &[CityEvent]) -> Value {
    let counts: BTreeMap<&str, usize> = Severity::ALL
        .iter()
        .map(|s| (s.as_str(), events.iter().filter(|e| e.severity == *s).count()))
        .collect();
    json!(counts)
}

pub fn category_counts(events: &[CityEvent]) -> Value {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for e in events {
        *counts.entry(e.category.as_str()).or_default() += 1;
    }
    json!(counts)
}

/// 带单复数的计数短语，如 "1 event" / "3 events"
pub fn count_phrase(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}
