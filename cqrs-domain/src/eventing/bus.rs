//! 事件总线（EventBus）协议
//!
//! 发布只负责入队，`dispatch_events` 负责一次投递周期：
//! 快照并清空待投递集合、排序、逐事件逐处理器调用并隔离失败。
//!
use crate::domain_event::EventMessage;

/// 事件总线：负责接收事件并在投递周期中分发
pub trait EventBus: Send + Sync {
    /// 发布事件；同一周期内重复发布同一事件实例只投递一次
    fn publish(&self, message: EventMessage);

    fn publish_batch(&self, messages: Vec<EventMessage>) {
        for message in messages {
            self.publish(message);
        }
    }

    /// 执行一次投递周期
    fn dispatch_events(&self) -> DispatchReport;
}

/// 一次投递周期的统计结果
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 本周期处理的事件数
    pub messages: usize,
    /// 成功的 (事件, 处理器) 调用次数
    pub deliveries: usize,
    /// 失败并被隔离的 (事件, 处理器) 调用次数
    pub failures: usize,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.messages == 0
    }

    pub(crate) fn merge(&mut self, other: DispatchReport) {
        self.messages += other.messages;
        self.deliveries += other.deliveries;
        self.failures += other.failures;
    }
}
