//! 可观测性：tracing 日志初始化
//!
//! stdout 留给响应 JSON，日志一律写 stderr。级别默认 info，可通过 RUST_LOG 覆盖。
//! 分支隔离的审计记录使用 target = "branch_audit"，可单独过滤（如 RUST_LOG=branch_audit=warn）。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
