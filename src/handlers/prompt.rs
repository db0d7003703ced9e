//! 接地提示词构建
//!
//! 结构固定：角色前言 + 禁止编造指令 + 编号且限长的真实数据摘要 + 原样附上的用户问题 + 收尾指令。
//! 事件渲染为 `title (category, severity)`，预警渲染为 `title (severity)`。

use crate::envelope::{AlertRecord, CityEvent};

/// 提示词中最多列出的事件数
pub const MAX_PROMPT_EVENTS: usize = 5;

/// 提示词中最多列出的预警数
pub const MAX_PROMPT_ALERTS: usize = 3;

pub const NO_INVENTION_DIRECTIVE: &str = "Use ONLY the data listed below. Do not invent events, alerts, places, times or numbers that are not in the data.";

pub const CLOSING_INSTRUCTION: &str = "Answer using only the data above. If the data does not cover the question, say so briefly instead of guessing.";

pub fn render_event(event: &CityEvent) -> String {
    format!("{} ({}, {})", event.title, event.category, event.severity)
}

/// 严重度优先用规范化值，其次原文，最后 unknown
pub fn render_alert(alert: &AlertRecord) -> String {
    let severity = match (alert.severity(), alert.severity_label()) {
        (Some(s), _) => s.to_string(),
        (None, Some(raw)) => raw.to_string(),
        (None, None) => "unknown".to_string(),
    };
    format!("{} ({})", alert.title(), severity)
}

/// 构建结果：完整提示词与交给网关的事实列表
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedPrompt {
    pub text: String,
    pub facts: Vec<String>,
}

pub struct PromptBuilder<'a> {
    persona: String,
    events: &'a [CityEvent],
    alerts: &'a [AlertRecord],
    query: String,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            events: &[],
            alerts: &[],
            query: String::new(),
        }
    }

    pub fn events(mut self, events: &'a [CityEvent]) -> Self {
        self.events = events;
        self
    }

    pub fn alerts(mut self, alerts: &'a [AlertRecord]) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn build(self) -> GroundedPrompt {
        let event_lines: Vec<String> = self
            .events
            .iter()
            .take(MAX_PROMPT_EVENTS)
            .map(render_event)
            .collect();
        let alert_lines: Vec<String> = self
            .alerts
            .iter()
            .take(MAX_PROMPT_ALERTS)
            .map(render_alert)
            .collect();

        let mut text = String::new();
        text.push_str(&self.persona);
        text.push('\n');
        text.push_str(NO_INVENTION_DIRECTIVE);
        text.push_str("\n\n");
        push_section(&mut text, "Current events", &event_lines, self.events.len());
        push_section(&mut text, "Active alerts", &alert_lines, self.alerts.len());
        text.push_str("User question: ");
        text.push_str(&self.query);
        text.push_str("\n\n");
        text.push_str(CLOSING_INSTRUCTION);

        let mut facts = event_lines;
        facts.extend(alert_lines);
        GroundedPrompt { text, facts }
    }
}

fn push_section(out: &mut String, heading: &str, lines: &[String], total: usize) {
    if lines.is_empty() {
        out.push_str(&format!("{heading}: none\n\n"));
        return;
    }
    out.push_str(&format!("{heading} (showing {} of {}):\n", lines.len(), total));
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, line));
    }
    out.push('\n');
}
