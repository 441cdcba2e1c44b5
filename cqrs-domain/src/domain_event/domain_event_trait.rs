use std::any::Any;
use std::fmt;

/// 类型擦除辅助：为任意 `'static` 类型提供 `&dyn Any` 视图，
/// 使 `dyn DomainEvent` 可以安全地向下转换为具体事件类型。
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件以 `Arc<dyn DomainEvent>` 的形式在聚合、总线与处理器之间共享，
/// 因此要求 `Send + Sync`。
pub trait DomainEvent: AsAny + fmt::Debug + Send + Sync {
    /// 事件的逻辑名称（如 `EmailChanged`），用于匹配应用规则与处理器
    fn event_type(&self) -> &str;
}

/// 事件类型在编译期已知的逻辑名称。
///
/// 登记应用规则与编解码器时只有类型没有实例，需要静态名称；
/// `#[domain_event]` 宏会同时实现本 trait 与 [`DomainEvent`]。
pub trait EventType {
    const EVENT_TYPE: &'static str;
}

impl dyn DomainEvent {
    /// 向下转换为具体事件类型
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        <dyn DomainEvent as AsAny>::as_any(self).downcast_ref::<E>()
    }

    /// 是否为给定的具体事件类型
    pub fn is<E: DomainEvent>(&self) -> bool {
        <dyn DomainEvent as AsAny>::as_any(self).is::<E>()
    }
}

/// 名称比较的归一化形式：应用规则与处理器订阅均按大小写不敏感匹配
pub(crate) fn normalize_event_type(event_type: &str) -> String {
    event_type.to_ascii_lowercase()
}
