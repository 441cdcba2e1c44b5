//! 演示：命令 -> 聚合事件 -> 有序投递，以及处理器失败的隔离
//!
//! 运行：`RUST_LOG=debug cargo run -p cqrs-application --example user_email`
use cqrs_application::command_bus::CommandBus;
use cqrs_application::command_handler::CommandHandler;
use cqrs_application::context::AppContext;
use cqrs_application::error::AppError;
use cqrs_application::{InMemoryCommandBus, UnitOfWork};
use cqrs_domain::aggregate_root::{AggregateRoot, ApplyRules};
use cqrs_domain::domain_event::{BusinessContext, EventMessage};
use cqrs_domain::entity::Entity;
use cqrs_domain::error::DomainResult;
use cqrs_domain::eventing::{
    DispatchMode, EventBusConfig, EventHandler, HandledEventType, InMemoryEventBus,
};
use cqrs_domain::persist::{AggregateRepository, InMemoryAggregateRepository};
use cqrs_macros::{aggregate_root, command, domain_event};
use std::sync::{Arc, LazyLock};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[domain_event]
struct UserRegisteredEvent {
    email: String,
}

#[domain_event]
struct EmailChangedEvent {
    email: String,
}

#[aggregate_root(id = Uuid)]
struct User {
    email: String,
}

impl User {
    fn register(id: Uuid, email: &str) -> DomainResult<Self> {
        let mut user = User::new(id);
        user.apply(UserRegisteredEvent {
            email: email.to_string(),
        })?;
        Ok(user)
    }

    fn change_email(&mut self, email: &str) -> DomainResult<()> {
        self.apply(EmailChangedEvent {
            email: email.to_string(),
        })
    }
}

impl AggregateRoot for User {
    const TYPE: &'static str = "User";

    fn apply_rules() -> &'static ApplyRules<Self> {
        static RULES: LazyLock<ApplyRules<User>> = LazyLock::new(|| {
            ApplyRules::new()
                .on(|u: &mut User, e: &UserRegisteredEvent| u.email = e.email.clone())
                .on(|u: &mut User, e: &EmailChangedEvent| u.email = e.email.clone())
        });
        &RULES
    }
}

#[command]
struct RegisterUserCommand {
    id: Uuid,
    email: String,
}

#[command]
struct ChangeEmailCommand {
    id: Uuid,
    email: String,
}

struct UserHandlers {
    users: Arc<InMemoryAggregateRepository<User>>,
}

impl CommandHandler<RegisterUserCommand> for UserHandlers {
    fn handle(
        &self,
        _ctx: &AppContext,
        uow: &mut UnitOfWork,
        cmd: RegisterUserCommand,
    ) -> Result<(), AppError> {
        let user = User::register(cmd.id, &cmd.email)?;
        uow.add(&*self.users, user);
        Ok(())
    }
}

impl CommandHandler<ChangeEmailCommand> for UserHandlers {
    fn handle(
        &self,
        _ctx: &AppContext,
        uow: &mut UnitOfWork,
        cmd: ChangeEmailCommand,
    ) -> Result<(), AppError> {
        if !cmd.email.contains('@') {
            return Err(AppError::Validation(format!("invalid email: {}", cmd.email)));
        }
        let user = uow.load(&*self.users, &cmd.id)?;
        user.lock().change_email(&cmd.email)?;
        Ok(())
    }
}

struct WelcomeMailer;

impl EventHandler for WelcomeMailer {
    fn handler_name(&self) -> &str {
        "welcome_mailer"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::one("UserRegistered")
    }

    fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
        if let Some(e) = message.downcast_ref::<UserRegisteredEvent>() {
            tracing::info!(email = %e.email, "welcome mail sent");
        }
        Ok(())
    }
}

struct FlakyAudit;

impl EventHandler for FlakyAudit {
    fn handler_name(&self) -> &str {
        "flaky_audit"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
        anyhow::bail!("audit store unavailable for {}", message.event_type())
    }

    fn on_failure(&self, message: &EventMessage, error: &anyhow::Error) {
        tracing::error!(
            sequence_id = message.sequence_id(),
            %error,
            "audit record lost"
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config: EventBusConfig = serde_json::from_str(r#"{ "dispatch_mode": "deferred" }"#)?;
    assert_eq!(config.dispatch_mode, DispatchMode::Deferred);

    let event_bus = Arc::new(InMemoryEventBus::with_config(config));
    event_bus.register(Arc::new(WelcomeMailer));
    event_bus.register(Arc::new(FlakyAudit));

    let users = Arc::new(InMemoryAggregateRepository::<User>::new());
    let handlers = Arc::new(UserHandlers {
        users: users.clone(),
    });

    let bus = InMemoryCommandBus::new(event_bus);
    bus.register::<RegisterUserCommand, _>(handlers.clone())?;
    bus.register::<ChangeEmailCommand, _>(handlers)?;

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .correlation_id("demo-1".into())
            .actor_type("system".into())
            .build(),
        idempotency_key: None,
    };

    let id = Uuid::new_v4();
    bus.dispatch(
        &ctx,
        RegisterUserCommand {
            id,
            email: "alice@example.com".into(),
        },
    )?;
    bus.dispatch(
        &ctx,
        ChangeEmailCommand {
            id,
            email: "alice@example.org".into(),
        },
    )?;

    let rejected = bus.dispatch(
        &ctx,
        ChangeEmailCommand {
            id,
            email: "not-an-email".into(),
        },
    );
    tracing::info!(error = ?rejected.err(), "invalid command rejected");

    let user = users.load(&id)?;
    tracing::info!(email = %user.lock().email, "final state");
    Ok(())
}
