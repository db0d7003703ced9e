//! 请求类别
//!
//! 自由格式的 requestType / parameters.page 在入口处归一为封闭的 RequestKind；
//! 一个请求可能同时命中多个类别（如 requestType=CHAT 且 page=events），由分发器按优先级裁决。
//! 都不命中时为 Unrecognized，它不对应任何 Handler。

use std::fmt;

use serde::Serialize;

use crate::envelope::RequestEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Chat,
    Events,
    Alerts,
    Dashboard,
    Unrecognized,
}

impl RequestKind {
    pub const ROUTABLE: [RequestKind; 4] = [
        RequestKind::Chat,
        RequestKind::Dashboard,
        RequestKind::Alerts,
        RequestKind::Events,
    ];

    /// requestType 中需要包含的标记（大小写不敏感）
    pub fn type_token(&self) -> Option<&'static str> {
        match self {
            RequestKind::Chat => Some("CHAT"),
            RequestKind::Events => Some("EVENT"),
            RequestKind::Alerts => Some("ALERT"),
            RequestKind::Dashboard => Some("DASHBOARD"),
            RequestKind::Unrecognized => None,
        }
    }

    /// parameters.page 的取值
    pub fn page_tag(&self) -> Option<&'static str> {
        match self {
            RequestKind::Chat => Some("chat"),
            RequestKind::Events => Some("events"),
            RequestKind::Alerts => Some("alerts"),
            RequestKind::Dashboard => Some("dashboard"),
            RequestKind::Unrecognized => None,
        }
    }

    pub fn matches(&self, request: &RequestEnvelope) -> bool {
        let (Some(token), Some(tag)) = (self.type_token(), self.page_tag()) else {
            return false;
        };
        request.request_type().to_uppercase().contains(token)
            || request
                .parameters()
                .page()
                .is_some_and(|p| p.eq_ignore_ascii_case(tag))
    }

    /// 请求命中的全部类别；一个都没有时返回 [Unrecognized]
    pub fn classify(request: &RequestEnvelope) -> Vec<RequestKind> {
        let kinds: Vec<RequestKind> = Self::ROUTABLE
            .iter()
            .copied()
            .filter(|k| k.matches(request))
            .collect();
        if kinds.is_empty() {
            vec![RequestKind::Unrecognized]
        } else {
            kinds
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.page_tag().unwrap_or("unrecognized"))
    }
}
