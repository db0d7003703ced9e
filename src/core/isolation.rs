//! 失败隔离边界
//!
//! 每个挂起点（Agent 调用、LLM 合成）统一经过 isolate / with_fallback：
//! 任务在独立 tokio 任务中运行并受预算超时约束；出错、超时、panic 都在原地转为默认值，
//! 保证扇出 / 汇合屏障上的每个分支必定完成。每次调用输出结构化审计日志（JSON）。

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::timeout;

/// 分支结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchOutcome {
    Ok,
    Error,
    Timeout,
    Panic,
}

impl BranchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchOutcome::Ok => "ok",
            BranchOutcome::Error => "error",
            BranchOutcome::Timeout => "timeout",
            BranchOutcome::Panic => "panic",
        }
    }
}

/// 隔离后的分支结果：value 总是可用（成功值或默认值）
#[derive(Debug, Clone)]
pub struct Isolated<T> {
    pub value: T,
    pub outcome: BranchOutcome,
}

impl<T> Isolated<T> {
    pub fn is_degraded(&self) -> bool {
        self.outcome != BranchOutcome::Ok
    }
}

/// 在预算内运行 task；失败 / 超时 / panic 时返回 default，并记录 outcome
pub async fn isolate<T, E, F>(label: &str, budget: Duration, task: F, default: T) -> Isolated<T>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let start = Instant::now();
    let mut handle = tokio::spawn(task);

    let (value, outcome, detail) = match timeout(budget, &mut handle).await {
        Ok(Ok(Ok(value))) => (value, BranchOutcome::Ok, None),
        Ok(Ok(Err(e))) => (default, BranchOutcome::Error, Some(e.to_string())),
        Ok(Err(join_err)) => {
            let outcome = if join_err.is_panic() {
                BranchOutcome::Panic
            } else {
                BranchOutcome::Error
            };
            (default, outcome, Some(join_err.to_string()))
        }
        Err(_) => {
            handle.abort();
            (default, BranchOutcome::Timeout, None)
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let audit = serde_json::json!({
        "event": "branch_audit",
        "branch": label,
        "outcome": outcome.as_str(),
        "duration_ms": duration_ms,
        "budget_ms": budget.as_millis() as u64,
        "error": detail,
    });
    if outcome == BranchOutcome::Ok {
        tracing::info!(target: "branch_audit", audit = %audit, "branch");
    } else {
        tracing::warn!(target: "branch_audit", audit = %audit, "branch degraded, using fallback");
    }

    Isolated { value, outcome }
}

/// 只关心值的简写：失败时直接得到 default
pub async fn with_fallback<T, E, F>(label: &str, budget: Duration, task: F, default: T) -> T
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    isolate(label, budget, task, default).await.value
}
