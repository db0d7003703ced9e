//! 分发器 / 注册表
//!
//! 启动时通过 DispatcherBuilder 注册 Handler，build 后分发表只读。
//! 选择规则：按请求命中的类别收集候选 → 优先级降序 → 同优先级按注册顺序（先注册者胜）→
//! 第一个 can_handle 为真的 Handler。无候选时返回 success = false 的结构性失败。

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::core::DispatchError;
use crate::dispatch::RequestKind;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::handlers::PageHandler;

/// 结构性失败响应的 agent_id
pub const DISPATCHER_ID: &str = "dispatcher";

#[derive(Clone)]
struct Registered {
    seq: usize,
    handler: Arc<dyn PageHandler>,
}

/// Handler 概要（日志 / 文档）
#[derive(Debug, Clone, Serialize)]
pub struct HandlerInfo {
    pub page_type: String,
    pub priority: i32,
    pub kinds: Vec<RequestKind>,
    pub description: String,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: Vec<Arc<dyn PageHandler>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(self, handler: impl PageHandler + 'static) -> Self {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(mut self, handler: Arc<dyn PageHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> Dispatcher {
        let mut routes: HashMap<RequestKind, Vec<Registered>> = HashMap::new();
        for (seq, handler) in self.handlers.iter().enumerate() {
            for kind in handler.kinds() {
                if *kind == RequestKind::Unrecognized {
                    tracing::warn!(
                        page_type = handler.page_type(),
                        "Handler registered for unrecognized requests, ignoring that route"
                    );
                    continue;
                }
                routes.entry(*kind).or_default().push(Registered {
                    seq,
                    handler: handler.clone(),
                });
            }
        }
        for list in routes.values_mut() {
            list.sort_by_key(|r| (Reverse(r.handler.priority()), r.seq));
        }
        Dispatcher {
            routes,
            handlers: self.handlers,
        }
    }
}

pub struct Dispatcher {
    routes: HashMap<RequestKind, Vec<Registered>>,
    handlers: Vec<Arc<dyn PageHandler>>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// 选出处理该请求的 Handler
    pub fn select(&self, request: &RequestEnvelope) -> Result<Arc<dyn PageHandler>, DispatchError> {
        let kinds = RequestKind::classify(request);
        let mut candidates: Vec<&Registered> = kinds
            .iter()
            .filter_map(|k| self.routes.get(k))
            .flatten()
            .collect();
        candidates.sort_by_key(|r| (Reverse(r.handler.priority()), r.seq));
        candidates.dedup_by_key(|r| r.seq);

        candidates
            .into_iter()
            .find(|r| r.handler.can_handle(request))
            .map(|r| r.handler.clone())
            .ok_or_else(|| DispatchError::NoHandler {
                request_type: request.request_type().to_string(),
            })
    }

    /// 唯一入口：分发并返回响应；只有无 Handler 匹配时 success = false
    pub async fn submit(&self, request: RequestEnvelope) -> ResponseEnvelope {
        match self.select(&request) {
            Ok(handler) => {
                tracing::info!(
                    request_id = request.request_id(),
                    request_type = request.request_type(),
                    handler = handler.page_type(),
                    "Dispatching request"
                );
                handler.handle(request).await
            }
            Err(e) => {
                tracing::warn!(
                    request_id = request.request_id(),
                    request_type = request.request_type(),
                    "{}",
                    e
                );
                ResponseEnvelope::builder(request.request_id(), DISPATCHER_ID)
                    .failure()
                    .message(format!("{e}."))
                    .metadata("error", json!("no_handler"))
                    .metadata("request_type", json!(request.request_type()))
                    .build()
            }
        }
    }

    /// 已注册 Handler，按注册顺序
    pub fn describe(&self) -> Vec<HandlerInfo> {
        self.handlers
            .iter()
            .map(|h| HandlerInfo {
                page_type: h.page_type().to_string(),
                priority: h.priority(),
                kinds: h.kinds().to_vec(),
                description: h.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
