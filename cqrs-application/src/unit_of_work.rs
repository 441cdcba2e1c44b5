//! 工作单元（UnitOfWork）
//!
//! 记录一次命令处理过程中被修改的聚合。命令总线在处理器返回后：
//! - 成功：`commit` 依次取出各聚合的待提交事件；
//! - 失败：`rollback` 丢弃各聚合的待提交事件。
//!
//! 同一个聚合句柄重复登记只保留一次。
//!
//! 处理器应通过 `load` / `add` 取得聚合，加载与登记一步完成；
//! 未经工作单元修改的聚合不会被提交。
//!
use cqrs_domain::aggregate_root::{AggregateRoot, EventSource, HasPendingEvents, SharedAggregate};
use cqrs_domain::domain_event::EventMessage;
use cqrs_domain::error::DomainResult;
use cqrs_domain::persist::AggregateRepository;
use parking_lot::Mutex;
use std::sync::Arc;

type TrackedSource = Arc<Mutex<dyn EventSource>>;

#[derive(Default)]
pub struct UnitOfWork {
    tracked: Vec<TrackedSource>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新建的聚合，返回可继续操作的共享句柄
    pub fn attach<A: AggregateRoot>(&mut self, aggregate: A) -> SharedAggregate<A> {
        let shared = Arc::new(Mutex::new(aggregate));
        self.track(&shared);
        shared
    }

    /// 从仓储加载聚合并登记
    ///
    /// 加载时残留的待提交事件来自未被任何工作单元跟踪的修改，
    /// 不属于本次命令，先行丢弃。
    pub fn load<A, R>(&mut self, repo: &R, id: &A::Id) -> DomainResult<SharedAggregate<A>>
    where
        A: AggregateRoot,
        R: AggregateRepository<A> + ?Sized,
    {
        let aggregate = repo.load(id)?;
        {
            let mut guard = aggregate.lock();
            let stale = guard.pending_events().len();
            if stale > 0 {
                tracing::warn!(
                    aggregate_type = A::TYPE,
                    aggregate_id = %id,
                    stale,
                    "untracked pending events discarded on load"
                );
                guard.discard_pending_events();
            }
        }
        self.track(&aggregate);
        Ok(aggregate)
    }

    /// 保存聚合到仓储并登记，聚合在保存前记录的事件随本次命令提交
    pub fn add<A, R>(&mut self, repo: &R, aggregate: A) -> SharedAggregate<A>
    where
        A: AggregateRoot,
        R: AggregateRepository<A> + ?Sized,
    {
        let shared = repo.add(aggregate);
        self.track(&shared);
        shared
    }

    /// 登记一个已有的聚合句柄
    pub fn track<A: AggregateRoot>(&mut self, aggregate: &SharedAggregate<A>) {
        let already = self
            .tracked
            .iter()
            .any(|t| std::ptr::addr_eq(Arc::as_ptr(t), Arc::as_ptr(aggregate)));
        if already {
            return;
        }
        let source: TrackedSource = aggregate.clone();
        self.tracked.push(source);
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// 按登记顺序取出全部聚合的待提交事件
    pub fn commit(self) -> Vec<EventMessage> {
        let mut events = Vec::new();
        for source in self.tracked {
            let mut guard = source.lock();
            let drained = guard.drain_events();
            tracing::debug!(
                aggregate_type = guard.source_type(),
                aggregate_id = %guard.source_id(),
                events = drained.len(),
                "pending events drained"
            );
            events.extend(drained);
        }
        events
    }

    /// 丢弃全部聚合的待提交事件，返回丢弃的事件数
    pub fn rollback(self) -> usize {
        self.tracked
            .into_iter()
            .map(|source| source.lock().discard_events())
            .sum()
    }
}
