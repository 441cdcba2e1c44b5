//! 领域层统一错误定义
//!
//! 聚焦事件应用、序列化与解析等最小必要集合，
//! 便于在应用层统一转换为 `AppError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 聚合根/事件应用 ---
    #[error("there is no apply rule for event \"{event_type}\" on aggregate \"{aggregate_type}\"")]
    UnknownEvent {
        event_type: String,
        aggregate_type: &'static str,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 仓储 ---
    #[error("aggregate not found: {aggregate_type}/{id}")]
    NotFound {
        aggregate_type: &'static str,
        id: String,
    },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("unregistered event type: {event_type}")]
    UnregisteredEventType { event_type: String },
    #[error("parse error: {reason}")]
    Parse { reason: String },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn unknown_event(event_type: impl Into<String>, aggregate_type: &'static str) -> Self {
        DomainError::UnknownEvent {
            event_type: event_type.into(),
            aggregate_type,
        }
    }
}

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
