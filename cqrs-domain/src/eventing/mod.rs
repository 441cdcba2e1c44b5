//! 事件子系统（eventing）
//!
//! 提供进程内事件发布与处理的基础抽象与实现：
//! - `EventBus`：发布与投递周期协议；
//! - `EventHandler`：对事件进行消费处理，可声明失败回调；
//! - `EventHandlerLocator`：登记时解析处理器能力，投递时按名称查找；
//! - `InMemoryEventBus`：同步、按序、失败隔离的总线实现。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod handler;
pub mod locator;

pub use bus::{DispatchReport, EventBus};
pub use bus_inmemory::{DispatchMode, EventBusConfig, InMemoryEventBus};
pub use handler::{EventHandler, HandledEventType};
pub use locator::EventHandlerLocator;
