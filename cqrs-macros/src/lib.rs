mod aggregate_root;
mod command;
mod domain_event;
mod utils;

use proc_macro::TokenStream;

/// 聚合根宏
/// - 追加字段：`id: IdType`、`pending_events: PendingEvents`（若缺失）并置于字段最前
/// - 自动实现 `::cqrs_domain::entity::Entity` 与 `::cqrs_domain::aggregate_root::HasPendingEvents`
/// - 支持参数：`#[aggregate_root(id = IdType, debug = true|false)]`，`id` 默认 `String`
#[proc_macro_attribute]
pub fn aggregate_root(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate_root::expand(attr, item)
}

/// 领域事件宏
/// - 适用于任意结构体（含单元结构体）
/// - 实现 `EventType` 与 `DomainEvent`，事件名默认为去掉 `Event` 后缀的类型名
/// - 支持参数：`#[domain_event(name = "...")]`
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 命令宏
/// - 实现 `::cqrs_application::command::Command`，命令名默认为去掉 `Command` 后缀的类型名
/// - 支持参数：`#[command(name = "...")]`
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    command::expand(attr, item)
}
