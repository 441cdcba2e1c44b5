use crate::{command::Command, context::AppContext, error::AppError, unit_of_work::UnitOfWork};

/// 命令处理器
///
/// 处理器通过 `uow` 登记本次修改过的聚合，由命令总线决定提交或回滚；
/// 处理器自身不应发布事件。
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    fn handle(&self, ctx: &AppContext, uow: &mut UnitOfWork, cmd: C) -> Result<(), AppError>;
}

impl<C, F> CommandHandler<C> for F
where
    C: Command,
    F: Fn(&AppContext, &mut UnitOfWork, C) -> Result<(), AppError> + Send + Sync,
{
    fn handle(&self, ctx: &AppContext, uow: &mut UnitOfWork, cmd: C) -> Result<(), AppError> {
        self(ctx, uow, cmd)
    }
}
