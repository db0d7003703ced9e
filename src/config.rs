//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BEACON__*` 覆盖（双下划线表示嵌套，如 `BEACON__LLM__PROVIDER=openai`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub agents: AgentsSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// [app] 段：应用名、默认片区
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 请求未带片区时使用的规范区域名
    #[serde(default = "default_area")]
    pub default_area: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            default_area: default_area(),
        }
    }
}

fn default_area() -> String {
    "Bengaluru".to_string()
}

/// [agents] 段：单次 Agent 调用预算与数据源
///
/// 数据源优先级：*_url（HTTP）> *_file（JSON 快照）> 空内存源
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsSection {
    #[serde(default = "default_agent_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    pub events_url: Option<String>,
    pub alerts_url: Option<String>,
    pub events_file: Option<PathBuf>,
    pub alerts_file: Option<PathBuf>,
}

impl Default for AgentsSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_agent_timeout_ms(),
            http_timeout_secs: default_http_timeout_secs(),
            events_url: None,
            alerts_url: None,
            events_file: None,
            alerts_file: None,
        }
    }
}

impl AgentsSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

fn default_agent_timeout_ms() -> u64 {
    5_000
}

fn default_http_timeout_secs() -> u64 {
    10
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：mock / deepseek / openai；无 API Key 时一律回退到 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

/// 合成网关的最终选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayChoice {
    Mock,
    DeepSeek,
    OpenAi,
}

/// provider 允许的取值
pub const PROVIDERS: [&str; 3] = ["mock", "deepseek", "openai"];

impl LlmSection {
    /// provider 与可用的 API Key 共同决定后端；所需 Key 缺失时回退 Mock
    ///
    /// - deepseek：DEEPSEEK_API_KEY 或 OPENAI_API_KEY 任一即可（兼容端点）
    /// - openai：只认 OPENAI_API_KEY
    pub fn gateway_choice(&self, deepseek_key: bool, openai_key: bool) -> GatewayChoice {
        match self.provider.trim().to_lowercase().as_str() {
            "deepseek" if deepseek_key || openai_key => GatewayChoice::DeepSeek,
            "openai" if openai_key => GatewayChoice::OpenAi,
            _ => GatewayChoice::Mock,
        }
    }
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次合成调用预算（毫秒）
    #[serde(default = "default_synthesis_timeout_ms")]
    pub synthesis_ms: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            synthesis_ms: default_synthesis_timeout_ms(),
        }
    }
}

impl LlmTimeoutsSection {
    pub fn synthesis(&self) -> Duration {
        Duration::from_millis(self.synthesis_ms.max(1))
    }
}

fn default_synthesis_timeout_ms() -> u64 {
    8_000
}

const DEFAULT_CONFIG_CANDIDATES: [&str; 2] = ["config/default.toml", "../config/default.toml"];

fn default_config_file() -> Option<PathBuf> {
    DEFAULT_CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// 加载后的语义校验：未知 provider、空片区名在启动时就报错
fn validate(cfg: &AppConfig) -> Result<(), config::ConfigError> {
    let provider = cfg.llm.provider.trim().to_lowercase();
    if !PROVIDERS.contains(&provider.as_str()) {
        return Err(config::ConfigError::Message(format!(
            "llm.provider must be one of {:?}, got '{}'",
            PROVIDERS, cfg.llm.provider
        )));
    }
    if cfg.app.default_area.trim().is_empty() {
        return Err(config::ConfigError::Message(
            "app.default_area must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// 加载配置：config/default.toml（若存在）→ 显式文件 → 环境变量 BEACON__*
///
/// 显式传入的文件必须存在；环境变量用双下划线表示嵌套（`BEACON__AGENTS__TIMEOUT_MS=2000`）。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = default_config_file() {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("BEACON")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.default_area, "Bengaluru");
        assert_eq!(cfg.agents.timeout(), Duration::from_millis(5_000));
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.timeouts.synthesis(), Duration::from_millis(8_000));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[app]\ndefault_area = \"Mysuru\"\n\n[agents]\ntimeout_ms = 750\nevents_file = \"events.json\"\n\n[llm]\nprovider = \"openai\"\n\n[llm.timeouts]\nsynthesis_ms = 1200"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.app.default_area, "Mysuru");
        assert_eq!(cfg.agents.timeout_ms, 750);
        assert_eq!(cfg.agents.events_file, Some(PathBuf::from("events.json")));
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.timeouts.synthesis_ms, 1200);
        assert_eq!(cfg.llm.model, "deepseek-chat");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[llm]\nprovider = \"claude-local\"").unwrap();
        let err = load_config(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("llm.provider"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load_config(Some(PathBuf::from("/nonexistent/beacon.toml"))).is_err());
    }

    #[test]
    fn test_gateway_choice() {
        let mut llm = LlmSection::default();
        assert_eq!(llm.gateway_choice(true, true), GatewayChoice::Mock);

        llm.provider = "DeepSeek".to_string();
        assert_eq!(llm.gateway_choice(true, false), GatewayChoice::DeepSeek);
        assert_eq!(llm.gateway_choice(false, true), GatewayChoice::DeepSeek);
        assert_eq!(llm.gateway_choice(false, false), GatewayChoice::Mock);

        llm.provider = "openai".to_string();
        assert_eq!(llm.gateway_choice(false, true), GatewayChoice::OpenAi);
        assert_eq!(llm.gateway_choice(true, false), GatewayChoice::Mock);
    }
}
