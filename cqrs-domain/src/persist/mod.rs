//! 持久化形态（persist）
//!
//! - `Serializer`/`JsonEventSerializer`：事件消息与结构化数据之间的转换；
//! - `SerializedEvent`：跨越进程边界时的事件标准形态；
//! - `AggregateRepository`/`InMemoryAggregateRepository`：以共享句柄交付聚合。
//!
//! 具体存储后端（数据库、消息队列）由上层实现并注入。
//!
mod aggregate_repository;
mod serialized_event;
mod serializer;

pub use aggregate_repository::{AggregateRepository, InMemoryAggregateRepository};
pub use serialized_event::{SerializedEvent, deserialize_events, serialize_events};
pub use serializer::{JsonEventSerializer, Serializer};
