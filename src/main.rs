//! Beacon - 城市事件与预警助手的分发核心
//!
//! 入口：初始化日志、加载配置、装配分发器，然后逐行读取 stdin 上的请求信封（JSON），
//! 每行输出一个响应信封（JSON）到 stdout。可选的第一个参数为额外配置文件路径。

use std::path::PathBuf;

use anyhow::Context;
use beacon::{create_default_dispatcher, RequestEnvelope, ResponseEnvelope};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    beacon::observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (cfg, dispatcher) = create_default_dispatcher(config_path);
    tracing::info!(
        app = cfg.app.name.as_deref().unwrap_or("beacon"),
        default_area = %cfg.app.default_area,
        "Dispatcher ready"
    );
    for info in dispatcher.describe() {
        tracing::info!(
            page = %info.page_type,
            priority = info.priority,
            "Registered handler: {}",
            info.description
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(request) => dispatcher.submit(request).await,
            Err(e) => {
                tracing::warn!("Malformed request envelope: {}", e);
                ResponseEnvelope::builder("unknown", "beacon")
                    .failure()
                    .message(format!("Malformed request envelope: {e}"))
                    .metadata("error", json!("malformed_request"))
                    .build()
            }
        };
        let mut out = serde_json::to_string(&response).context("Failed to encode response")?;
        out.push('\n');
        stdout
            .write_all(out.as_bytes())
            .await
            .context("Failed to write stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }

    Ok(())
}
