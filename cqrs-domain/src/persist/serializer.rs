//! 事件序列化器（Serializer）
//!
//! 以显式登记的“编码/解码函数对”取代基于反射的对象映射：
//! 每个事件类型在登记时提供 serde 编解码，按事件名称查找。
//!
use super::serialized_event::SerializedEvent;
use crate::domain_event::{DomainEvent, EventMessage, EventType, normalize_event_type};
use crate::error::{DomainError, DomainResult};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

/// 事件消息 <-> 结构化数据
pub trait Serializer: Send + Sync {
    fn to_mapping(&self, message: &EventMessage) -> DomainResult<SerializedEvent>;

    fn from_mapping(&self, data: &SerializedEvent) -> DomainResult<EventMessage>;
}

type EncodeFn = Box<dyn Fn(&dyn DomainEvent) -> Option<serde_json::Result<Value>> + Send + Sync>;
type DecodeFn = Box<dyn Fn(Value) -> serde_json::Result<Arc<dyn DomainEvent>> + Send + Sync>;

struct EventCodec {
    rust_type: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

/// 基于 serde_json 的事件序列化器
#[derive(Default)]
pub struct JsonEventSerializer {
    codecs: HashMap<String, EventCodec>,
}

impl JsonEventSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记事件类型的编解码器
    pub fn register<E>(mut self) -> Self
    where
        E: DomainEvent + EventType + Serialize + DeserializeOwned,
    {
        let encode: EncodeFn = Box::new(|event: &dyn DomainEvent| {
            event.downcast_ref::<E>().map(serde_json::to_value)
        });
        let decode: DecodeFn = Box::new(|value: Value| {
            let event: E = serde_json::from_value(value)?;
            Ok(Arc::new(event) as Arc<dyn DomainEvent>)
        });

        self.codecs.insert(
            normalize_event_type(E::EVENT_TYPE),
            EventCodec {
                rust_type: type_name::<E>(),
                encode,
                decode,
            },
        );
        self
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.codecs.contains_key(&normalize_event_type(event_type))
    }

    fn codec(&self, event_type: &str) -> DomainResult<&EventCodec> {
        self.codecs
            .get(&normalize_event_type(event_type))
            .ok_or_else(|| DomainError::UnregisteredEventType {
                event_type: event_type.to_string(),
            })
    }
}

impl Serializer for JsonEventSerializer {
    fn to_mapping(&self, message: &EventMessage) -> DomainResult<SerializedEvent> {
        let codec = self.codec(message.event_type())?;
        let payload = (codec.encode)(message.payload()).ok_or_else(|| DomainError::TypeMismatch {
            expected: codec.rust_type.to_string(),
            found: message.event_type().to_string(),
        })??;

        Ok(SerializedEvent::builder()
            .event_type(message.event_type().to_string())
            .sequence_id(message.sequence_id())
            .occurred_at(message.created_at())
            .payload(payload)
            .build())
    }

    fn from_mapping(&self, data: &SerializedEvent) -> DomainResult<EventMessage> {
        let codec = self.codec(data.event_type())?;
        let payload = (codec.decode)(data.payload().clone())?;
        Ok(EventMessage::from_shared(payload, data.occurred_at()))
    }
}
