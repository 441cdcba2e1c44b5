use crate::{command::Command, command_handler::CommandHandler, error::AppError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId};
use std::sync::Arc;

struct RegisteredHandler {
    command: &'static str,
    // 实际存放 `Arc<dyn CommandHandler<C>>`，C 与键中的 TypeId 对应
    handler: Arc<dyn Any + Send + Sync>,
}

/// 命令类型 -> 处理器 的登记表
///
/// 每种命令只允许一个处理器；重复登记会被拒绝而不是覆盖。
#[derive(Default)]
pub struct CommandHandlerLocator {
    handlers: DashMap<TypeId, RegisteredHandler>,
}

impl CommandHandlerLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记命令处理器
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = handler;

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(RegisteredHandler {
                    command: C::NAME,
                    handler: Arc::new(handler),
                });
                tracing::debug!(command = C::NAME, "command handler registered");
                Ok(())
            }
        }
    }

    /// 解析命令对应的处理器
    pub fn resolve<C: Command>(&self) -> Result<Arc<dyn CommandHandler<C>>, AppError> {
        let registered = self
            .handlers
            .get(&TypeId::of::<C>())
            .ok_or(AppError::HandlerNotFound(C::NAME))?;

        registered
            .handler
            .downcast_ref::<Arc<dyn CommandHandler<C>>>()
            .cloned()
            .ok_or(AppError::TypeMismatch {
                expected: C::NAME,
                found: registered.command,
            })
    }

    pub fn contains<C: Command>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<C>())
    }

    /// 已登记的命令名称（无序）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|entry| entry.command).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::AppContext, unit_of_work::UnitOfWork};

    struct Ping;
    impl Command for Ping {
        const NAME: &'static str = "Ping";
    }

    struct Pong;
    impl Command for Pong {
        const NAME: &'static str = "Pong";
    }

    struct PingHandler;
    impl CommandHandler<Ping> for PingHandler {
        fn handle(&self, _: &AppContext, _: &mut UnitOfWork, _: Ping) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn resolves_registered_handler() {
        let locator = CommandHandlerLocator::new();
        locator.register::<Ping, _>(Arc::new(PingHandler)).unwrap();

        assert!(locator.contains::<Ping>());
        assert!(!locator.contains::<Pong>());
        assert_eq!(locator.registered_commands(), vec!["Ping"]);

        let handler = locator.resolve::<Ping>().unwrap();
        let mut uow = UnitOfWork::new();
        handler.handle(&AppContext::default(), &mut uow, Ping).unwrap();
    }

    #[test]
    fn missing_handler_names_the_command() {
        let locator = CommandHandlerLocator::new();
        match locator.resolve::<Pong>() {
            Err(AppError::HandlerNotFound(name)) => assert_eq!(name, "Pong"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("expected HandlerNotFound"),
        }
    }

    #[test]
    fn second_registration_is_rejected() {
        let locator = CommandHandlerLocator::new();
        locator.register::<Ping, _>(Arc::new(PingHandler)).unwrap();

        let err = locator
            .register::<Ping, _>(Arc::new(PingHandler))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AlreadyRegisteredCommand { command: "Ping" }
        ));
        assert_eq!(locator.len(), 1);
    }
}
