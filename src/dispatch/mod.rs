//! 分发层：请求类别归一与 Handler 注册表

pub mod dispatcher;
pub mod kind;

pub use dispatcher::{Dispatcher, DispatcherBuilder, HandlerInfo, DISPATCHER_ID};
pub use kind::RequestKind;
