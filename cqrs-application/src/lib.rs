//! CQRS 应用层（cqrs-application）
//!
//! 命令从进入总线到事件发布的完整链路：
//! 1. `CommandHandlerLocator` 按命令类型解析唯一的处理器；
//! 2. 处理器在 `UnitOfWork` 中加载/创建聚合并调用领域方法；
//! 3. 处理器成功：工作单元取出全部待提交事件，批量发布到 `EventBus` 并执行一次投递周期；
//! 4. 处理器失败：工作单元丢弃全部待提交事件，错误原样返回给调用方。
//!
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod command_handler_locator;
pub mod context;
pub mod error;
pub mod inmemory_command_bus;
pub mod unit_of_work;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use unit_of_work::UnitOfWork;

// 允许 `#[command]` 宏生成的 ::cqrs_application 路径在本 crate 内解析
extern crate self as cqrs_application;
