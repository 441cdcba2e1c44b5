//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部事件的处理逻辑与元信息（名称、订阅类型、失败回调）。
//!
use crate::domain_event::EventMessage;

/// 处理器声明自己能处理的事件名称
#[derive(Clone, Debug)]
pub enum HandledEventType {
    One(String),
    Many(Vec<String>),
    All,
}

impl HandledEventType {
    pub fn one(event_type: impl Into<String>) -> Self {
        HandledEventType::One(event_type.into())
    }

    pub fn many<I, S>(event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HandledEventType::Many(event_types.into_iter().map(Into::into).collect())
    }
}

/// 事件处理器：处理某一类型的事件
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与失败报告）
    fn handler_name(&self) -> &str;

    /// 返回该处理器支持的事件类型
    fn handled_event_type(&self) -> HandledEventType;

    /// 处理事件
    fn handle(&self, message: &EventMessage) -> anyhow::Result<()>;

    /// 处理失败回调：总线捕获错误后调用，随后继续投递其余处理器与事件
    fn on_failure(&self, _message: &EventMessage, _error: &anyhow::Error) {}
}
