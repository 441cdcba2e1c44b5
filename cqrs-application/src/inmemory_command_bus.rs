use crate::{
    command::Command, command_bus::CommandBus, command_handler::CommandHandler,
    command_handler_locator::CommandHandlerLocator, context::AppContext, error::AppError,
    unit_of_work::UnitOfWork,
};
use cqrs_domain::eventing::EventBus;
use std::sync::Arc;

/// 基于内存的 CommandBus 实现
/// - 通过 `CommandHandlerLocator` 按命令类型解析唯一处理器
/// - 处理器成功：提交工作单元，批量发布事件并执行一次投递周期
/// - 处理器失败：回滚工作单元，不发布任何事件，错误原样返回
pub struct InMemoryCommandBus {
    locator: CommandHandlerLocator,
    event_bus: Arc<dyn EventBus>,
}

impl InMemoryCommandBus {
    pub fn new(event_bus: Arc<dyn EventBus>) -> Self {
        Self::with_locator(CommandHandlerLocator::new(), event_bus)
    }

    pub fn with_locator(locator: CommandHandlerLocator, event_bus: Arc<dyn EventBus>) -> Self {
        Self { locator, event_bus }
    }

    /// 注册命令处理器；同一命令类型只能注册一次
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.locator.register::<C, H>(handler)
    }

    pub fn locator(&self) -> &CommandHandlerLocator {
        &self.locator
    }

    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.event_bus
    }
}

impl CommandBus for InMemoryCommandBus {
    fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        let span = tracing::debug_span!(
            "command",
            command = C::NAME,
            correlation_id = ctx.biz.correlation_id(),
            causation_id = ctx.biz.causation_id(),
            actor_type = ctx.biz.actor_type(),
            actor_id = ctx.biz.actor_id(),
            idempotency_key = ctx.idempotency_key.as_deref()
        );
        let _enter = span.enter();

        let handler = self.locator.resolve::<C>()?;
        let mut uow = UnitOfWork::new();

        match handler.handle(ctx, &mut uow, cmd) {
            Ok(()) => {
                let events = uow.commit();
                tracing::debug!(events = events.len(), "command handled, publishing events");
                if !events.is_empty() {
                    self.event_bus.publish_batch(events);
                }
                self.event_bus.dispatch_events();
                Ok(())
            }
            Err(err) => {
                let discarded = uow.rollback();
                tracing::debug!(
                    discarded,
                    error = %err,
                    "command failed, pending events discarded"
                );
                Err(err)
            }
        }
    }
}
