//! Page Handler 层：每类客户端请求一个编排器（chat / events / alerts / dashboard）
//!
//! | Handler   | priority | requestType 包含 | parameters.page |
//! |-----------|----------|------------------|-----------------|
//! | chat      | 100      | CHAT             | chat            |
//! | dashboard | 50       | DASHBOARD        | dashboard       |
//! | alerts    | 30       | ALERT            | alerts          |
//! | events    | 20       | EVENT            | events          |

pub mod alerts;
pub mod chat;
pub mod common;
pub mod dashboard;
pub mod events;
pub mod prompt;
pub mod traits;

pub use alerts::AlertsHandler;
pub use chat::{ChatHandler, CHAT_GREETING, CHAT_NOTHING_TO_REPORT, SUGGESTED_QUESTIONS};
pub use common::{ConversationContext, ResponseSource, ANONYMOUS};
pub use dashboard::DashboardHandler;
pub use events::EventsHandler;
pub use prompt::{
    render_alert, render_event, GroundedPrompt, PromptBuilder, MAX_PROMPT_ALERTS,
    MAX_PROMPT_EVENTS,
};
pub use traits::{HandlerContext, HandlerSettings, PageHandler};
