//! 事件的结构化形态（SerializedEvent）
//!
//! 事件跨越持久化或传输边界时使用的标准形态，
//! 由 [`Serializer`](super::Serializer) 与 `EventMessage` 相互转换。
//!
use super::serializer::Serializer;
use crate::{domain_event::EventMessage, error::DomainResult};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件类型，用于选择解码器
    event_type: String,
    /// 事件在原进程内的序号（仅用于审计，还原时重新分配）
    sequence_id: u64,
    /// 事件创建时间
    occurred_at: DateTime<Utc>,
    /// 事件负载，存储事件的具体数据
    payload: Value,
}

impl SerializedEvent {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

pub fn serialize_events<S>(
    serializer: &S,
    messages: &[EventMessage],
) -> DomainResult<Vec<SerializedEvent>>
where
    S: Serializer + ?Sized,
{
    messages.iter().map(|m| serializer.to_mapping(m)).collect()
}

/// 按原始顺序还原事件；还原后的消息保留创建时间，序号按还原顺序重新分配
pub fn deserialize_events<S>(
    serializer: &S,
    events: &[SerializedEvent],
) -> DomainResult<Vec<EventMessage>>
where
    S: Serializer + ?Sized,
{
    let mut ordered: Vec<&SerializedEvent> = events.iter().collect();
    ordered.sort_by_key(|e| (e.occurred_at, e.sequence_id));
    ordered.into_iter().map(|e| serializer.from_mapping(e)).collect()
}
