use crate::{command::Command, context::AppContext, error::AppError};

/// 命令总线（Command Bus）
///
/// - 根据命令的具体类型路由到唯一的处理器；
/// - 处理器成功则提交（发布聚合事件），失败则回滚（丢弃聚合事件）并原样返回错误；
/// - 该 trait 带有泛型方法，以具体实现类型注入使用。
pub trait CommandBus: Send + Sync {
    fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError>;
}
