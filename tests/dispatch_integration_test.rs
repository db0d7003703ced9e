//! 分发集成测试：真实 Agent + 内存数据源 + 分发器全链路

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use beacon::agents::{
        Agent, AgentSet, AlertAgent, EventsAgent, InMemoryAlertSource, InMemoryEventSource,
    };
    use beacon::config::AppConfig;
    use beacon::core::AgentError;
    use beacon::create_dispatcher;
    use beacon::envelope::{
        AlertRecord, CityEvent, EventCategory, RequestEnvelope, ResponseEnvelope, Severity,
    };
    use beacon::llm::{LlmError, MockSynthesizer, SynthesisGateway};
    use serde_json::json;

    struct CountingGateway {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingGateway {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl SynthesisGateway for CountingGateway {
        fn name(&self) -> &str {
            "counting"
        }

        async fn synthesize(&self, grounding: &[String], _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(format!("{} facts considered.", grounding.len()))
        }
    }

    /// 等待固定时长后返回空结果
    struct SleepyAgent {
        id: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Agent for SleepyAgent {
        fn agent_id(&self) -> &str {
            self.id
        }

        fn description(&self) -> &str {
            "sleepy"
        }

        async fn process_request(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, AgentError> {
            tokio::time::sleep(self.delay).await;
            Ok(ResponseEnvelope::builder(request.request_id(), self.id).build())
        }
    }

    fn koramangala_agents() -> AgentSet {
        let events = vec![
            CityEvent::new("ev-1", "Heavy jam on 80 Feet Road", EventCategory::Traffic, Severity::High)
                .with_area("Koramangala"),
            CityEvent::new("ev-2", "Book fair", EventCategory::Cultural, Severity::Low)
                .with_area("Jayanagar"),
        ];
        let alerts = vec![AlertRecord::new("Water supply disruption", "high").with_area("Koramangala")];
        AgentSet::new(
            Arc::new(EventsAgent::new(Arc::new(InMemoryEventSource::new(events)))),
            Arc::new(AlertAgent::new(Arc::new(InMemoryAlertSource::new(alerts)))),
        )
    }

    fn empty_agents() -> AgentSet {
        AgentSet::new(
            Arc::new(EventsAgent::new(Arc::new(InMemoryEventSource::new(vec![])))),
            Arc::new(AlertAgent::new(Arc::new(InMemoryAlertSource::new(vec![])))),
        )
    }

    #[tokio::test]
    async fn test_chat_koramangala_cites_both_items() {
        let cfg = AppConfig::default();
        let dispatcher = create_dispatcher(&cfg, koramangala_agents(), Arc::new(MockSynthesizer));

        let request = RequestEnvelope::builder("CHAT")
            .request_id("req-42")
            .query("Is there traffic near Koramangala?")
            .area("Koramangala")
            .build();
        let resp = dispatcher.submit(request).await;

        assert!(resp.success());
        assert_eq!(resp.request_id(), "req-42");
        assert_eq!(resp.agent_id(), "chat");
        assert!(resp.message().contains("Heavy jam on 80 Feet Road"));
        assert!(resp.message().contains("Water supply disruption"));
        assert!(!resp.message().contains("Book fair"));
        assert_eq!(resp.events().len(), 1);
        assert_eq!(resp.alerts().len(), 1);
        assert_eq!(
            resp.metadata()["suggested_questions"].as_array().map(Vec::len),
            Some(5)
        );
        assert_eq!(resp.metadata()["response_source"], json!("ai"));
        assert_eq!(
            resp.metadata()["conversation_context"]["area"],
            json!("Koramangala")
        );
    }

    #[tokio::test]
    async fn test_gateway_called_once_with_data_and_never_without() {
        let cfg = AppConfig::default();

        let gateway = Arc::new(CountingGateway::new(Duration::ZERO));
        let dispatcher = create_dispatcher(&cfg, koramangala_agents(), gateway.clone());
        let _ = dispatcher
            .submit(RequestEnvelope::builder("CHAT").query("What's up?").build())
            .await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        let gateway = Arc::new(CountingGateway::new(Duration::ZERO));
        let dispatcher = create_dispatcher(&cfg, empty_agents(), gateway.clone());
        let resp = dispatcher
            .submit(RequestEnvelope::builder("CHAT").query("Any floods?").build())
            .await;
        assert!(resp.success());
        assert_eq!(resp.metadata()["response_source"], json!("static"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_agents_run_concurrently() {
        let cfg = AppConfig::default();
        let agents = AgentSet::new(
            Arc::new(SleepyAgent {
                id: "events_agent",
                delay: Duration::from_millis(200),
            }),
            Arc::new(SleepyAgent {
                id: "alert_agent",
                delay: Duration::from_millis(200),
            }),
        );
        let dispatcher = create_dispatcher(&cfg, agents, Arc::new(MockSynthesizer));

        let start = Instant::now();
        let resp = dispatcher
            .submit(RequestEnvelope::builder("GET_DASHBOARD").build())
            .await;
        let elapsed = start.elapsed();

        assert!(resp.success());
        assert!(elapsed < Duration::from_millis(380), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_slow_gateway_falls_back_to_quoted_question() {
        let mut cfg = AppConfig::default();
        cfg.llm.timeouts.synthesis_ms = 100;
        let gateway = Arc::new(CountingGateway::new(Duration::from_secs(5)));
        let dispatcher = create_dispatcher(&cfg, koramangala_agents(), gateway);

        let start = Instant::now();
        let resp = dispatcher
            .submit(
                RequestEnvelope::builder("CHAT")
                    .query("Is 80 Feet Road blocked?")
                    .area("Koramangala")
                    .build(),
            )
            .await;

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(resp.success());
        assert!(resp.message().contains("\"Is 80 Feet Road blocked?\""));
        assert_eq!(resp.metadata()["response_source"], json!("fallback"));
    }

    #[tokio::test]
    async fn test_slow_agent_branch_is_cut_at_budget() {
        let mut cfg = AppConfig::default();
        cfg.agents.timeout_ms = 100;
        let alerts = vec![AlertRecord::new("Storm warning", "critical")];
        let agents = AgentSet::new(
            Arc::new(SleepyAgent {
                id: "events_agent",
                delay: Duration::from_secs(5),
            }),
            Arc::new(AlertAgent::new(Arc::new(InMemoryAlertSource::new(alerts)))),
        );
        let dispatcher = create_dispatcher(&cfg, agents, Arc::new(MockSynthesizer));

        let start = Instant::now();
        let resp = dispatcher
            .submit(RequestEnvelope::builder("CHAT").query("Any warnings?").build())
            .await;

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(resp.success());
        assert!(resp.events().is_empty());
        assert_eq!(resp.alerts().len(), 1);
        assert!(resp.message().contains("Storm warning"));
    }

    #[tokio::test]
    async fn test_unrecognized_request_type() {
        let cfg = AppConfig::default();
        let dispatcher = create_dispatcher(&cfg, koramangala_agents(), Arc::new(MockSynthesizer));
        let resp = dispatcher
            .submit(RequestEnvelope::builder("UPLOAD_PHOTO").build())
            .await;
        assert!(!resp.success());
        assert!(resp.message().contains("UPLOAD_PHOTO"));
    }

    #[tokio::test]
    async fn test_page_parameter_routes_and_unknown_params_ignored() {
        let cfg = AppConfig::default();
        let dispatcher = create_dispatcher(&cfg, koramangala_agents(), Arc::new(MockSynthesizer));

        let raw = r#"{
            "requestId": "wire-1",
            "requestType": "QUERY",
            "location": { "area": "Koramangala" },
            "parameters": { "page": "alerts", "theme": "dark", "session_id": "s-9" }
        }"#;
        let request: RequestEnvelope = serde_json::from_str(raw).unwrap();
        let resp = dispatcher.submit(request).await;

        assert!(resp.success());
        assert_eq!(resp.agent_id(), "alerts");
        assert_eq!(resp.alerts().len(), 1);

        let wire = serde_json::to_value(&resp).unwrap();
        assert_eq!(wire["requestId"], json!("wire-1"));
        assert_eq!(wire["agentId"], json!("alerts"));
        assert_eq!(wire["success"], json!(true));
        assert!(wire["timestamp"].is_string());
    }
}
