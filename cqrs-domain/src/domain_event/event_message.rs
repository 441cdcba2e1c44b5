use super::domain_event_trait::DomainEvent;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// 进程级单调序号：仅通过 next_sequence_id 递增，进程生命周期内不重置
static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_sequence_id() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// 事件消息：包装领域事件，附带创建时间与进程内单调序号。
///
/// - `created_at`（微秒精度）与 `sequence_id` 仅在构造时赋值，之后不可变；
/// - 排序键为 `(created_at, sequence_id)`，同一时钟刻度内由序号决定先后；
/// - 克隆只增加载荷的引用计数，克隆体与原消息被视为“同一事件”，
///   去重按载荷实例身份（而非字段值）判断。
#[derive(Debug, Clone)]
pub struct EventMessage {
    payload: Arc<dyn DomainEvent>,
    created_at: DateTime<Utc>,
    sequence_id: u64,
}

impl EventMessage {
    /// 以当前时间包装事件
    pub fn new<E: DomainEvent>(event: E) -> Self {
        Self::at(event, Utc::now())
    }

    /// 以指定时间包装事件（例如还原已持久化的事件），序号仍取自进程计数器
    pub fn at<E: DomainEvent>(event: E, created_at: DateTime<Utc>) -> Self {
        Self::from_shared(Arc::new(event), created_at)
    }

    /// 包装已共享的事件载荷
    pub fn from_shared(payload: Arc<dyn DomainEvent>, created_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            created_at: created_at.trunc_subsecs(6),
            sequence_id: next_sequence_id(),
        }
    }

    pub fn payload(&self) -> &dyn DomainEvent {
        self.payload.as_ref()
    }

    pub fn shared_payload(&self) -> &Arc<dyn DomainEvent> {
        &self.payload
    }

    pub fn event_type(&self) -> &str {
        self.payload.event_type()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// 投递顺序键
    pub fn ordering_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.sequence_id)
    }

    /// 向下转换为具体事件类型
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.payload().downcast_ref::<E>()
    }

    /// 两条消息是否包装同一个事件实例
    pub fn is_same_event(&self, other: &EventMessage) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.payload), Arc::as_ptr(&other.payload))
    }

    /// 载荷实例地址，作为去重键使用；仅在消息存活期间有意义
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.payload) as *const () as usize
    }
}

impl<E: DomainEvent> From<E> for EventMessage {
    fn from(event: E) -> Self {
        EventMessage::new(event)
    }
}
