//! 聚合仓储（AggregateRepository）
//!
//! 以共享句柄的形式交付聚合，命令处理器加载后交由工作单元跟踪，
//! 提交时取出事件，回滚时丢弃事件。
//!
use crate::aggregate_root::{AggregateRoot, SharedAggregate};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub trait AggregateRepository<A>: Send + Sync
where
    A: AggregateRoot,
{
    fn find(&self, id: &A::Id) -> Option<SharedAggregate<A>>;

    /// 保存聚合，若已存在同标识的聚合则覆盖
    fn add(&self, aggregate: A) -> SharedAggregate<A>;

    fn load(&self, id: &A::Id) -> DomainResult<SharedAggregate<A>> {
        self.find(id).ok_or_else(|| DomainError::NotFound {
            aggregate_type: A::TYPE,
            id: id.to_string(),
        })
    }
}

impl<A, T> AggregateRepository<A> for Arc<T>
where
    A: AggregateRoot,
    T: AggregateRepository<A> + ?Sized,
{
    fn find(&self, id: &A::Id) -> Option<SharedAggregate<A>> {
        (**self).find(id)
    }

    fn add(&self, aggregate: A) -> SharedAggregate<A> {
        (**self).add(aggregate)
    }
}

/// 内存聚合仓储，按标识的字符串形式索引
pub struct InMemoryAggregateRepository<A> {
    items: RwLock<HashMap<String, SharedAggregate<A>>>,
}

impl<A: AggregateRoot> InMemoryAggregateRepository<A> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl<A: AggregateRoot> Default for InMemoryAggregateRepository<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AggregateRoot> AggregateRepository<A> for InMemoryAggregateRepository<A> {
    fn find(&self, id: &A::Id) -> Option<SharedAggregate<A>> {
        self.items.read().get(&id.to_string()).cloned()
    }

    fn add(&self, aggregate: A) -> SharedAggregate<A> {
        let key = aggregate.id().to_string();
        let shared = Arc::new(Mutex::new(aggregate));
        self.items.write().insert(key, Arc::clone(&shared));
        shared
    }
}
