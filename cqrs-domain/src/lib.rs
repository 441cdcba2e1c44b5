//! CQRS 领域层基础库（cqrs-domain）
//!
//! 提供进程内 CQRS 所需的领域层构件：
//! - 领域事件（`domain_event`）：事件载荷约束与带时间戳/序号的 `EventMessage`；
//! - 聚合根（`aggregate_root`）：通过显式的应用规则表记录与回放领域事件；
//! - 事件系统（`eventing`）：同步事件总线、处理器与定位器；
//! - 持久化形态（`persist`）：事件序列化器与内存聚合仓储。
//!
//! 典型用法：
//! 1. 用 `#[domain_event]` 定义事件、用 `#[aggregate_root]` 定义聚合；
//! 2. 在 `AggregateRoot::apply_rules` 中登记每个事件对应的状态变更规则；
//! 3. 领域方法调用 `apply` 记录事件，由应用层在命令成功后取出并发布到 `EventBus`；
//! 4. `EventBus::dispatch_events` 按 `(created_at, sequence_id)` 顺序投递给处理器。
//!
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod persist;

// 允许在本 crate 内部通过 ::cqrs_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::cqrs_domain 路径。
extern crate self as cqrs_domain;
