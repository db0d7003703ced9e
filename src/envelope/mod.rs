//! 信封层：请求 / 响应值对象与领域数据（城市事件、预警记录）
//!
//! 分发器、Handler、Agent 之间只交换这些类型。

pub mod alert;
pub mod event;
pub mod request;
pub mod response;

pub use alert::AlertRecord;
pub use event::{
    haversine_meters, CityEvent, EventCategory, EventLocation, EventSource, Severity,
    EARTH_RADIUS_M, RECENT_WINDOW_DAYS,
};
pub use request::{RequestBuilder, RequestEnvelope, RequestLocation, RequestParameters, TimeWindow};
pub use response::{ResponseBuilder, ResponseEnvelope, DEFAULT_MESSAGE, DEGRADED_KEY};
