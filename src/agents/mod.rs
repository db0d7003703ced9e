//! Agent 层：领域数据检索单元（事件、预警）及其后端数据源

pub mod alerts;
pub mod events;
pub mod http;
pub mod source;
pub mod traits;

pub use alerts::{select_alerts, AlertAgent, ALERT_AGENT_ID, DEFAULT_MAX_ALERTS};
pub use events::{select_events, EventsAgent, DEFAULT_MAX_EVENTS, DEFAULT_RADIUS_KM, EVENTS_AGENT_ID};
pub use http::{HttpAlertSource, HttpEventSource};
pub use source::{AlertSource, EventSource, InMemoryAlertSource, InMemoryEventSource};
pub use traits::{Agent, AgentSet};

/// 片区名匹配：忽略大小写；相等，或 candidate 以 wanted 整词开头（"Koramangala 5th Block" 属于 "Koramangala"）
pub(crate) fn area_matches(candidate: &str, wanted: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    let wanted = wanted.trim().to_lowercase();
    if candidate.is_empty() || wanted.is_empty() {
        return false;
    }
    match candidate.strip_prefix(&wanted) {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ','),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::area_matches;

    #[test]
    fn test_area_matches() {
        assert!(area_matches("Koramangala 5th Block", "koramangala"));
        assert!(area_matches("koramangala", "Koramangala "));
        assert!(!area_matches("Whitefield", "Koramangala"));
        assert!(!area_matches("", "Koramangala"));
    }

    #[test]
    fn test_area_matches_rejects_partial_names() {
        assert!(!area_matches("Nagar", "Indiranagar"));
        assert!(!area_matches("Indiranagar", "Nagar"));
        assert!(!area_matches("HSR", "HSR Layout"));
        assert!(!area_matches("Koramangalam", "Koramangala"));
    }
}
