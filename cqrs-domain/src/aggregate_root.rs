//! 聚合根（AggregateRoot）
//!
//! 领域方法只表达意图，所有状态变更都通过 `apply` 记录为领域事件：
//! 1. 按事件逻辑名称在应用规则表中查找规则（大小写不敏感）；
//! 2. 找不到规则时立即返回 `DomainError::UnknownEvent`，不入队；
//! 3. 同步执行规则，修改聚合自身字段；
//! 4. 将 `EventMessage` 追加到待提交队列，等待应用层取出（提交）或丢弃（回滚）。
//!
//! 规则表在首次使用时构建一次（通常放在 `LazyLock` 中），
//! 取代按方法名拼接的运行时查找。
//!
use crate::domain_event::{DomainEvent, EventMessage, EventType, normalize_event_type};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use parking_lot::Mutex;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 在多个组件之间共享的聚合句柄
pub type SharedAggregate<A> = Arc<Mutex<A>>;

type ApplyFn<A> = Box<dyn Fn(&mut A, &dyn DomainEvent) -> bool + Send + Sync>;

struct ApplyRule<A> {
    rust_type: &'static str,
    apply: ApplyFn<A>,
}

/// 事件名称 -> 状态变更规则 的显式映射
pub struct ApplyRules<A> {
    rules: HashMap<String, ApplyRule<A>>,
}

impl<A: 'static> ApplyRules<A> {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// 为事件类型 `E` 登记状态变更规则；同名事件重复登记时以后者为准
    pub fn on<E, F>(mut self, rule: F) -> Self
    where
        E: DomainEvent + EventType,
        F: Fn(&mut A, &E) + Send + Sync + 'static,
    {
        let apply: ApplyFn<A> = Box::new(move |aggregate: &mut A, event: &dyn DomainEvent| {
            match event.downcast_ref::<E>() {
                Some(event) => {
                    rule(aggregate, event);
                    true
                }
                None => false,
            }
        });

        self.rules.insert(
            normalize_event_type(E::EVENT_TYPE),
            ApplyRule {
                rust_type: type_name::<E>(),
                apply,
            },
        );
        self
    }

    /// 是否存在能处理该事件名称的规则
    pub fn handles(&self, event_type: &str) -> bool {
        self.rules.contains_key(&normalize_event_type(event_type))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<A: 'static> Default for ApplyRules<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ApplyRules<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rules.keys()).finish()
    }
}

/// 聚合内部尚未提交的事件队列（按记录顺序）
#[derive(Debug, Default, Clone)]
pub struct PendingEvents {
    messages: Vec<EventMessage>,
}

impl PendingEvents {
    pub fn push(&mut self, message: EventMessage) {
        self.messages.push(message);
    }

    /// 取出全部事件并清空队列
    pub fn drain(&mut self) -> Vec<EventMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventMessage> {
        self.messages.iter()
    }
}

/// 持有待提交事件队列的能力（由 `#[aggregate_root]` 宏生成）
pub trait HasPendingEvents {
    fn pending_events(&self) -> &PendingEvents;

    fn pending_events_mut(&mut self) -> &mut PendingEvents;
}

/// 聚合根接口
pub trait AggregateRoot: Entity + HasPendingEvents + Sized + 'static {
    const TYPE: &'static str;

    /// 该聚合的应用规则表
    fn apply_rules() -> &'static ApplyRules<Self>;

    /// 记录一个领域事件：执行对应规则并加入待提交队列
    fn apply<E: DomainEvent>(&mut self, event: E) -> DomainResult<()> {
        self.apply_message(EventMessage::new(event))
    }

    /// 记录一个已包装的事件消息
    fn apply_message(&mut self, message: EventMessage) -> DomainResult<()> {
        mutate(self, &message)?;
        self.pending_events_mut().push(message);
        Ok(())
    }

    /// 回放历史事件以重建状态，不进入待提交队列
    fn replay<I>(&mut self, history: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = EventMessage>,
    {
        for message in history {
            mutate(self, &message)?;
        }
        Ok(())
    }

    /// 取出全部待提交事件并清空队列（提交时使用）
    fn pull_pending_events(&mut self) -> Vec<EventMessage> {
        self.pending_events_mut().drain()
    }

    /// 丢弃全部待提交事件（回滚时使用）
    fn discard_pending_events(&mut self) {
        self.pending_events_mut().clear();
    }
}

fn mutate<A: AggregateRoot>(aggregate: &mut A, message: &EventMessage) -> DomainResult<()> {
    let event_type = message.event_type();
    let Some(rule) = A::apply_rules()
        .rules
        .get(&normalize_event_type(event_type))
    else {
        return Err(DomainError::unknown_event(event_type, A::TYPE));
    };

    if !(rule.apply)(aggregate, message.payload()) {
        return Err(DomainError::TypeMismatch {
            expected: rule.rust_type.to_string(),
            found: event_type.to_string(),
        });
    }
    Ok(())
}

/// 对象安全的事件来源视图，供工作单元统一收集/丢弃不同类型聚合的事件
pub trait EventSource: Send {
    fn source_type(&self) -> &'static str;

    fn source_id(&self) -> String;

    fn drain_events(&mut self) -> Vec<EventMessage>;

    fn discard_events(&mut self) -> usize;
}

impl<A: AggregateRoot> EventSource for A {
    fn source_type(&self) -> &'static str {
        A::TYPE
    }

    fn source_id(&self) -> String {
        self.id().to_string()
    }

    fn drain_events(&mut self) -> Vec<EventMessage> {
        self.pull_pending_events()
    }

    fn discard_events(&mut self) -> usize {
        let discarded = self.pending_events().len();
        self.discard_pending_events();
        discarded
    }
}
