//! 应用装配：由配置创建合成网关、数据源、Agent 与分发器
//!
//! 所有 Handler 在这里一次性注册，之后分发表只读。

use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::{
    AgentSet, AlertAgent, AlertSource, EventSource, EventsAgent, HttpAlertSource, HttpEventSource,
    InMemoryAlertSource, InMemoryEventSource,
};
use crate::config::{load_config, AppConfig, GatewayChoice};
use crate::dispatch::Dispatcher;
use crate::handlers::{
    AlertsHandler, ChatHandler, DashboardHandler, EventsHandler, HandlerContext, HandlerSettings,
};
use crate::llm::{create_deepseek_synthesizer, MockSynthesizer, OpenAiSynthesizer, SynthesisGateway};

/// 根据 [llm] 配置与环境中可用的 API Key 创建合成网关
pub fn create_gateway_from_config(cfg: &AppConfig) -> Arc<dyn SynthesisGateway> {
    let deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let openai_key = std::env::var("OPENAI_API_KEY").ok();

    match cfg.llm.gateway_choice(deepseek_key, openai_key.is_some()) {
        GatewayChoice::DeepSeek => {
            let gateway = create_deepseek_synthesizer(&cfg.llm);
            tracing::info!("Using DeepSeek synthesis gateway ({})", gateway.name());
            Arc::new(gateway)
        }
        GatewayChoice::OpenAi => {
            tracing::info!("Using OpenAI-compatible synthesis gateway ({})", cfg.llm.model);
            Arc::new(OpenAiSynthesizer::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                openai_key.as_deref(),
            ))
        }
        GatewayChoice::Mock => {
            if !cfg.llm.provider.eq_ignore_ascii_case("mock") {
                tracing::warn!(
                    provider = %cfg.llm.provider,
                    "No API key for provider, using mock synthesis gateway"
                );
            } else {
                tracing::info!("Using mock synthesis gateway");
            }
            Arc::new(MockSynthesizer)
        }
    }
}

fn event_source_from_config(cfg: &AppConfig) -> Arc<dyn EventSource> {
    if let Some(url) = &cfg.agents.events_url {
        match HttpEventSource::new(url.clone(), cfg.agents.http_timeout_secs) {
            Ok(source) => {
                tracing::info!(url = %url, "Events source: HTTP");
                return Arc::new(source);
            }
            Err(e) => tracing::warn!(url = %url, "Events HTTP source unusable ({}), trying file", e),
        }
    }
    if let Some(path) = &cfg.agents.events_file {
        match InMemoryEventSource::from_json_file(path) {
            Ok(source) => {
                tracing::info!(path = %path.display(), count = source.len(), "Events source: file");
                return Arc::new(source);
            }
            Err(e) => tracing::warn!(path = %path.display(), "Events file unusable ({}), starting empty", e),
        }
    }
    Arc::new(InMemoryEventSource::new(Vec::new()))
}

fn alert_source_from_config(cfg: &AppConfig) -> Arc<dyn AlertSource> {
    if let Some(url) = &cfg.agents.alerts_url {
        match HttpAlertSource::new(url.clone(), cfg.agents.http_timeout_secs) {
            Ok(source) => {
                tracing::info!(url = %url, "Alerts source: HTTP");
                return Arc::new(source);
            }
            Err(e) => tracing::warn!(url = %url, "Alerts HTTP source unusable ({}), trying file", e),
        }
    }
    if let Some(path) = &cfg.agents.alerts_file {
        match InMemoryAlertSource::from_json_file(path) {
            Ok(source) => {
                tracing::info!(path = %path.display(), count = source.len(), "Alerts source: file");
                return Arc::new(source);
            }
            Err(e) => tracing::warn!(path = %path.display(), "Alerts file unusable ({}), starting empty", e),
        }
    }
    Arc::new(InMemoryAlertSource::new(Vec::new()))
}

/// 数据源优先级：URL > 文件 > 空内存源
pub fn create_agents_from_config(cfg: &AppConfig) -> AgentSet {
    AgentSet::new(
        Arc::new(EventsAgent::new(event_source_from_config(cfg))),
        Arc::new(AlertAgent::new(alert_source_from_config(cfg))),
    )
}

/// 注册四个页面 Handler
pub fn create_dispatcher(
    cfg: &AppConfig,
    agents: AgentSet,
    gateway: Arc<dyn SynthesisGateway>,
) -> Dispatcher {
    let ctx = HandlerContext::new(agents, gateway, HandlerSettings::from_config(cfg));
    Dispatcher::builder()
        .register(ChatHandler::new(ctx.clone()))
        .register(DashboardHandler::new(ctx.clone()))
        .register(AlertsHandler::new(ctx.clone()))
        .register(EventsHandler::new(ctx))
        .build()
}

/// 加载配置（失败时回退默认值）并创建完整分发器
pub fn create_default_dispatcher(config_path: Option<PathBuf>) -> (AppConfig, Dispatcher) {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let agents = create_agents_from_config(&cfg);
    let gateway = create_gateway_from_config(&cfg);
    let dispatcher = create_dispatcher(&cfg, agents, gateway);
    (cfg, dispatcher)
}
