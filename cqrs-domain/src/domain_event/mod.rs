//! 领域事件（Domain Event）与事件消息
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent` / `EventType`），
//! 以及附带创建时间与进程内序号的 `EventMessage`。

mod business_context;
mod domain_event_trait;
mod event_message;

pub use business_context::BusinessContext;
pub use domain_event_trait::{AsAny, DomainEvent, EventType};
pub use event_message::EventMessage;

pub(crate) use domain_event_trait::normalize_event_type;
