use cqrs_domain::error::DomainError;

/// 应用层错误
///
/// 命令处理器返回的任何错误都会原样穿过命令总线；
/// 总线自身只产生 `HandlerNotFound`、`AlreadyRegisteredCommand` 与 `TypeMismatch`。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: command={command}")]
    AlreadyRegisteredCommand { command: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
