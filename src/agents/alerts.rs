//! Alert Agent：从预警源取数，按片区与最低严重度过滤
//!
//! 无 area 字段的预警视为全城范围，始终保留；严重度无法识别的预警不参与严重度过滤。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agents::{area_matches, Agent, AlertSource};
use crate::core::AgentError;
use crate::envelope::{AlertRecord, RequestEnvelope, ResponseEnvelope};

pub const ALERT_AGENT_ID: &str = "alert_agent";

pub const DEFAULT_MAX_ALERTS: usize = 10;

pub struct AlertAgent {
    source: Arc<dyn AlertSource>,
}

impl AlertAgent {
    pub fn new(source: Arc<dyn AlertSource>) -> Self {
        Self { source }
    }
}

pub fn select_alerts(alerts: Vec<AlertRecord>, request: &RequestEnvelope) -> Vec<AlertRecord> {
    let min_severity = if request.parameters().include_all_severities() {
        None
    } else {
        request.severity_filter()
    };
    let limit = request
        .max_results()
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_ALERTS);

    let mut selected: Vec<AlertRecord> = alerts
        .into_iter()
        .filter(|a| match (request.area(), a.area()) {
            (Some(wanted), Some(have)) => area_matches(have, wanted),
            _ => true,
        })
        .filter(|a| match (min_severity, a.severity()) {
            (Some(min), Some(s)) => s >= min,
            _ => true,
        })
        .collect();

    // 稳定排序：同级保持来源顺序
    selected.sort_by(|a, b| b.severity().cmp(&a.severity()));
    selected.truncate(limit);
    selected
}

#[async_trait]
impl Agent for AlertAgent {
    fn agent_id(&self) -> &str {
        ALERT_AGENT_ID
    }

    fn description(&self) -> &str {
        "Surfaces active department alerts for an area"
    }

    async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
        let builder = ResponseEnvelope::builder(request.request_id(), ALERT_AGENT_ID);

        match self.source.fetch_alerts(&request).await {
            Ok(raw) => {
                let alerts = select_alerts(raw, &request);
                tracing::debug!(
                    request_id = request.request_id(),
                    source = self.source.name(),
                    selected = alerts.len(),
                    "alerts selected"
                );
                Ok(builder
                    .message(format!("Found {} alerts", alerts.len()))
                    .alerts(alerts)
                    .build())
            }
            Err(e) => {
                tracing::warn!(
                    request_id = request.request_id(),
                    source = self.source.name(),
                    "Alert source failed ({}), returning empty result",
                    e
                );
                Ok(builder
                    .message("Alerts are temporarily unavailable")
                    .degraded()
                    .build())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::InMemoryAlertSource;
    use crate::envelope::Severity;

    fn sample() -> Vec<AlertRecord> {
        vec![
            AlertRecord::new("Water supply cut", "moderate").with_area("Jayanagar"),
            AlertRecord::new("Flood warning", "HIGH").with_area("Koramangala"),
            AlertRecord::new("Heat advisory", "low"),
            AlertRecord::new("Gas leak", "critical").with_area("Koramangala"),
        ]
    }

    #[test]
    fn test_area_keeps_citywide_alerts() {
        let req = RequestEnvelope::builder("CHECK_ALERTS").area("Koramangala").build();
        let titles: Vec<_> = select_alerts(sample(), &req)
            .iter()
            .map(|a| a.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Gas leak", "Flood warning", "Heat advisory"]);
    }

    #[test]
    fn test_area_rejects_partial_name() {
        let alerts = vec![
            AlertRecord::new("Road closure", "high").with_area("Nagar"),
            AlertRecord::new("Power cut", "high").with_area("indiranagar"),
        ];
        let req = RequestEnvelope::builder("CHECK_ALERTS").area("Indiranagar").build();
        let titles: Vec<_> = select_alerts(alerts, &req)
            .iter()
            .map(|a| a.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Power cut"]);
    }

    #[test]
    fn test_min_severity() {
        let req = RequestEnvelope::builder("CHECK_ALERTS")
            .severity_filter(Severity::High)
            .build();
        assert_eq!(select_alerts(sample(), &req).len(), 2);
    }

    #[tokio::test]
    async fn test_populates_alerts_only() {
        let agent = AlertAgent::new(Arc::new(InMemoryAlertSource::new(sample())));
        let resp = agent
            .process_request(RequestEnvelope::builder("CHECK_ALERTS").max_results(2).build())
            .await
            .unwrap();
        assert_eq!(resp.alerts().len(), 2);
        assert!(resp.events().is_empty());
        assert_eq!(resp.agent_id(), ALERT_AGENT_ID);
    }
}
