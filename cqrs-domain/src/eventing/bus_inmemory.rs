//! 进程内同步事件总线（InMemoryEventBus）
//!
//! 状态机：空闲 → 接收（`publish` 累积）→ 投递中（`dispatch_events`）→ 空闲。
//! - `publish`：按载荷实例身份去重后入队，默认不触发处理器；
//! - `dispatch_events`：原子地快照并清空待投递集合，按 `(created_at, sequence_id)`
//!   升序逐事件投递给全部匹配的处理器，单个处理器失败只影响自身；
//! - 投递过程中再次发布的事件进入下一周期；处理器内（同一线程）再次调用
//!   `dispatch_events` 直接返回空报告；
//! - 其他线程的 `dispatch_events` 等待当前周期结束后执行自己的周期。
//!
//! 注意：处理器调用期间只持有可重入的周期锁，处理器内部可以安全地发布事件或登记处理器，
//! 但不能等待其他线程的投递完成。

use super::bus::{DispatchReport, EventBus};
use super::handler::EventHandler;
use super::locator::EventHandlerLocator;
use crate::domain_event::{DomainEvent, EventMessage};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Arc;

/// 发布后的投递方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// 仅入队，由调用方显式执行 `dispatch_events`
    #[default]
    Deferred,
    /// 周期外的发布立即驱动投递，直到队列为空或达到 `max_rounds`
    Immediate,
}

/// 事件总线配置
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub dispatch_mode: DispatchMode,
    /// Immediate 模式下一次发布最多驱动的连续投递周期数
    pub max_rounds: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::Deferred,
            max_rounds: 16,
        }
    }
}

#[derive(Default)]
struct PendingMessages {
    messages: Vec<EventMessage>,
    identities: HashSet<usize>,
}

impl PendingMessages {
    fn insert(&mut self, message: EventMessage) -> bool {
        if !self.identities.insert(message.identity()) {
            return false;
        }
        self.messages.push(message);
        true
    }

    fn take(&mut self) -> Vec<EventMessage> {
        self.identities.clear();
        std::mem::take(&mut self.messages)
    }
}

struct CycleGuard<'a> {
    running: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl<'a> CycleGuard<'a> {
    /// 阻塞直到其他线程的周期结束；同一线程在周期内重入时返回 `None`
    fn enter(cycle: &'a ReentrantMutex<Cell<bool>>) -> Option<Self> {
        let running = cycle.lock();
        if running.replace(true) {
            return None;
        }
        Some(Self { running })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.running.set(false);
    }
}

/// 同步的进程内事件总线
pub struct InMemoryEventBus {
    locator: RwLock<EventHandlerLocator>,
    pending: Mutex<PendingMessages>,
    cycle: ReentrantMutex<Cell<bool>>,
    config: EventBusConfig,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_config(EventBusConfig::default())
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self::with_locator(EventHandlerLocator::new(), config)
    }

    pub fn with_locator(locator: EventHandlerLocator, config: EventBusConfig) -> Self {
        Self {
            locator: RwLock::new(locator),
            pending: Mutex::new(PendingMessages::default()),
            cycle: ReentrantMutex::new(Cell::new(false)),
            config,
        }
    }

    /// 登记事件处理器
    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        tracing::debug!(handler = handler.handler_name(), "event handler registered");
        self.locator.write().register(handler);
    }

    /// 包装并发布一个领域事件
    pub fn publish_event<E: DomainEvent>(&self, event: E) {
        self.publish(EventMessage::new(event));
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// 当前待投递的事件数
    pub fn pending_len(&self) -> usize {
        self.pending.lock().messages.len()
    }

    /// 是否有投递周期正在运行（任意线程）
    pub fn is_dispatching(&self) -> bool {
        self.cycle.try_lock().is_none_or(|running| running.get())
    }

    fn enqueue(&self, message: EventMessage) {
        let sequence_id = message.sequence_id();
        let payload = message.shared_payload().clone();
        if !self.pending.lock().insert(message) {
            tracing::debug!(
                event_type = payload.event_type(),
                sequence_id,
                "event already pending in this cycle, ignored"
            );
        }
    }

    fn drive(&self) {
        let Some(guard) = CycleGuard::enter(&self.cycle) else {
            // 处理器内的发布：由外层的后续轮次处理
            return;
        };

        let mut total = DispatchReport::default();
        let mut rounds = 0;
        while rounds < self.config.max_rounds {
            let report = self.run_cycle();
            if report.is_empty() {
                break;
            }
            total.merge(report);
            rounds += 1;
        }
        drop(guard);

        let leftover = self.pending_len();
        if leftover > 0 && rounds >= self.config.max_rounds {
            tracing::warn!(
                rounds,
                leftover,
                messages = total.messages,
                "dispatch round limit reached, events left pending"
            );
        }
    }

    fn run_cycle(&self) -> DispatchReport {
        let mut messages = self.pending.lock().take();
        if messages.is_empty() {
            return DispatchReport::default();
        }
        messages.sort_by_key(EventMessage::ordering_key);

        let span = tracing::debug_span!("dispatch_cycle", messages = messages.len());
        let _enter = span.enter();

        let mut report = DispatchReport {
            messages: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            let handlers = self.locator.read().matching(message.event_type());
            for handler in handlers {
                match handler.handle(message) {
                    Ok(()) => report.deliveries += 1,
                    Err(err) => {
                        report.failures += 1;
                        tracing::warn!(
                            handler = handler.handler_name(),
                            event_type = message.event_type(),
                            sequence_id = message.sequence_id(),
                            error = %err,
                            "event handler failed"
                        );
                        handler.on_failure(message, &err);
                    }
                }
            }
        }

        tracing::debug!(
            deliveries = report.deliveries,
            failures = report.failures,
            "dispatch cycle finished"
        );
        report
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, message: EventMessage) {
        self.enqueue(message);
        if self.config.dispatch_mode == DispatchMode::Immediate {
            self.drive();
        }
    }

    fn publish_batch(&self, messages: Vec<EventMessage>) {
        for message in messages {
            self.enqueue(message);
        }
        if self.config.dispatch_mode == DispatchMode::Immediate {
            self.drive();
        }
    }

    fn dispatch_events(&self) -> DispatchReport {
        let Some(_guard) = CycleGuard::enter(&self.cycle) else {
            tracing::debug!("dispatch requested during a running cycle, deferred");
            return DispatchReport::default();
        };
        self.run_cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventing::HandledEventType;
    use chrono::{TimeZone, Utc};
    use cqrs_macros::domain_event;
    use std::sync::OnceLock;

    #[domain_event]
    struct FooEvent {
        tag: &'static str,
    }

    #[domain_event]
    struct BarEvent {
        tag: &'static str,
    }

    fn tag_of(message: &EventMessage) -> &'static str {
        if let Some(e) = message.downcast_ref::<FooEvent>() {
            e.tag
        } else if let Some(e) = message.downcast_ref::<BarEvent>() {
            e.tag
        } else {
            "?"
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        types: HandledEventType,
        log: Log,
    }

    impl EventHandler for Recorder {
        fn handler_name(&self) -> &str {
            self.name
        }
        fn handled_event_type(&self) -> HandledEventType {
            self.types.clone()
        }
        fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
            self.log
                .lock()
                .push(format!("{}:{}", self.name, tag_of(message)));
            Ok(())
        }
    }

    fn recorder(name: &'static str, types: HandledEventType, log: &Log) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            types,
            log: log.clone(),
        })
    }

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn dispatch_orders_by_creation_time() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::one("Foo"), &log));

        let e2 = EventMessage::at(FooEvent { tag: "e2" }, at(14, 21));
        let e1 = EventMessage::at(FooEvent { tag: "e1" }, at(14, 20));
        let e3 = EventMessage::at(FooEvent { tag: "e3" }, at(14, 11));
        bus.publish(e2);
        bus.publish(e1);
        bus.publish(e3);

        let report = bus.dispatch_events();
        assert_eq!(report.messages, 3);
        assert_eq!(*log.lock(), ["r:e3", "r:e1", "r:e2"]);
    }

    #[test]
    fn same_timestamp_falls_back_to_sequence() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::All, &log));

        let ts = at(9, 0);
        let a = EventMessage::at(FooEvent { tag: "a" }, ts);
        let b = EventMessage::at(BarEvent { tag: "b" }, ts);
        let c = EventMessage::at(FooEvent { tag: "c" }, ts);
        bus.publish_batch(vec![c, a, b]);
        bus.dispatch_events();

        assert_eq!(*log.lock(), ["r:a", "r:b", "r:c"]);
    }

    #[test]
    fn publish_does_not_invoke_handlers() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::All, &log));

        bus.publish_event(FooEvent { tag: "x" });
        assert!(log.lock().is_empty());
        assert_eq!(bus.pending_len(), 1);
    }

    #[test]
    fn same_instance_is_delivered_once_per_cycle() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::All, &log));

        let message = EventMessage::new(FooEvent { tag: "dup" });
        bus.publish(message.clone());
        bus.publish(message.clone());
        assert_eq!(bus.pending_len(), 1);

        let report = bus.dispatch_events();
        assert_eq!(report.deliveries, 1);
        assert_eq!(*log.lock(), ["r:dup"]);

        // 周期之间不保留去重记录
        bus.publish(message);
        bus.dispatch_events();
        assert_eq!(*log.lock(), ["r:dup", "r:dup"]);
    }

    #[test]
    fn equal_content_in_distinct_instances_is_delivered_twice() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::All, &log));

        bus.publish_event(FooEvent { tag: "same" });
        bus.publish_event(FooEvent { tag: "same" });
        bus.dispatch_events();
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn empty_dispatch_is_a_noop() {
        let log = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(recorder("r", HandledEventType::All, &log));

        assert_eq!(bus.dispatch_events(), DispatchReport::default());
        assert!(log.lock().is_empty());
    }

    struct FailOnFoo {
        failures: Log,
    }

    impl EventHandler for FailOnFoo {
        fn handler_name(&self) -> &str {
            "fail-on-foo"
        }
        fn handled_event_type(&self) -> HandledEventType {
            HandledEventType::All
        }
        fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
            if message.payload().is::<FooEvent>() {
                anyhow::bail!("cannot handle {}", tag_of(message));
            }
            Ok(())
        }
        fn on_failure(&self, message: &EventMessage, error: &anyhow::Error) {
            self.failures
                .lock()
                .push(format!("{}|{}", tag_of(message), error));
        }
    }

    #[test]
    fn handler_failures_are_isolated() {
        let log = Log::default();
        let failures = Log::default();
        let bus = InMemoryEventBus::new();
        bus.register(Arc::new(FailOnFoo {
            failures: failures.clone(),
        }));
        bus.register(recorder("r", HandledEventType::All, &log));

        bus.publish_event(FooEvent { tag: "x" });
        bus.publish_event(BarEvent { tag: "y" });
        let report = bus.dispatch_events();

        assert_eq!(report.messages, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.deliveries, 3);
        assert_eq!(*log.lock(), ["r:x", "r:y"]);
        assert_eq!(*failures.lock(), ["x|cannot handle x"]);
        assert_eq!(bus.pending_len(), 0);
    }

    /// 处理 Foo 时向同一总线发布 Bar，并尝试嵌套投递
    struct Republisher {
        bus: OnceLock<Arc<InMemoryEventBus>>,
        nested: Mutex<Vec<DispatchReport>>,
    }

    impl EventHandler for Republisher {
        fn handler_name(&self) -> &str {
            "republisher"
        }
        fn handled_event_type(&self) -> HandledEventType {
            HandledEventType::one("Foo")
        }
        fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
            let bus = self.bus.get().expect("bus attached");
            bus.publish_event(BarEvent { tag: tag_of(message) });
            self.nested.lock().push(bus.dispatch_events());
            Ok(())
        }
    }

    fn republishing_bus(
        config: EventBusConfig,
        log: &Log,
    ) -> (Arc<InMemoryEventBus>, Arc<Republisher>) {
        let bus = Arc::new(InMemoryEventBus::with_config(config));
        let republisher = Arc::new(Republisher {
            bus: OnceLock::new(),
            nested: Mutex::new(Vec::new()),
        });
        let _ = republisher.bus.set(bus.clone());
        bus.register(republisher.clone());
        bus.register(recorder("r", HandledEventType::All, log));
        (bus, republisher)
    }

    #[test]
    fn reentrant_publish_is_deferred_to_next_cycle() {
        let log = Log::default();
        let (bus, republisher) = republishing_bus(EventBusConfig::default(), &log);

        bus.publish_event(FooEvent { tag: "first" });
        let first = bus.dispatch_events();
        assert_eq!(first.messages, 1);
        assert_eq!(*log.lock(), ["r:first"]);
        assert_eq!(bus.pending_len(), 1);
        assert_eq!(*republisher.nested.lock(), [DispatchReport::default()]);

        let second = bus.dispatch_events();
        assert_eq!(second.messages, 1);
        assert_eq!(*log.lock(), ["r:first", "r:first"]);
        assert_eq!(bus.pending_len(), 0);
    }

    #[test]
    fn immediate_mode_drives_until_queue_is_empty() {
        let log = Log::default();
        let config = EventBusConfig {
            dispatch_mode: DispatchMode::Immediate,
            ..Default::default()
        };
        let (bus, _republisher) = republishing_bus(config, &log);

        bus.publish_event(FooEvent { tag: "now" });
        // Foo 在第一轮投递，Bar 在第二轮投递
        assert_eq!(*log.lock(), ["r:now", "r:now"]);
        assert_eq!(bus.pending_len(), 0);
        assert!(!bus.is_dispatching());
    }

    struct Echo {
        bus: OnceLock<Arc<InMemoryEventBus>>,
    }

    impl EventHandler for Echo {
        fn handler_name(&self) -> &str {
            "echo"
        }
        fn handled_event_type(&self) -> HandledEventType {
            HandledEventType::All
        }
        fn handle(&self, _message: &EventMessage) -> anyhow::Result<()> {
            let bus = self.bus.get().expect("bus attached");
            bus.publish_event(FooEvent { tag: "again" });
            Ok(())
        }
    }

    #[test]
    fn immediate_mode_stops_at_round_limit() {
        let config = EventBusConfig {
            dispatch_mode: DispatchMode::Immediate,
            max_rounds: 3,
        };
        let bus = Arc::new(InMemoryEventBus::with_config(config));
        let echo = Arc::new(Echo {
            bus: OnceLock::new(),
        });
        let _ = echo.bus.set(bus.clone());
        bus.register(echo);

        bus.publish_event(FooEvent { tag: "start" });
        assert_eq!(bus.pending_len(), 1);
        assert!(!bus.is_dispatching());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EventBusConfig =
            serde_json::from_str(r#"{"dispatch_mode":"immediate"}"#).unwrap();
        assert_eq!(config.dispatch_mode, DispatchMode::Immediate);
        assert_eq!(config.max_rounds, 16);
    }

    /// 投递时阻塞，直到收到放行信号
    struct Gate {
        entered: std::sync::mpsc::SyncSender<()>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
        log: Log,
    }

    impl EventHandler for Gate {
        fn handler_name(&self) -> &str {
            "gate"
        }
        fn handled_event_type(&self) -> HandledEventType {
            HandledEventType::one("Foo")
        }
        fn handle(&self, message: &EventMessage) -> anyhow::Result<()> {
            self.entered.send(())?;
            self.release.lock().recv()?;
            self.log.lock().push(format!("gate:{}", tag_of(message)));
            Ok(())
        }
    }

    #[test]
    fn dispatch_from_another_thread_waits_and_runs_its_own_cycle() {
        use std::sync::mpsc::sync_channel;
        use std::thread;
        use std::time::Duration;

        let log = Log::default();
        let (entered_tx, entered_rx) = sync_channel(1);
        let (release_tx, release_rx) = sync_channel(1);
        let bus = Arc::new(InMemoryEventBus::new());
        bus.register(Arc::new(Gate {
            entered: entered_tx,
            release: Mutex::new(release_rx),
            log: log.clone(),
        }));
        bus.register(recorder("r", HandledEventType::one("Bar"), &log));

        bus.publish_event(FooEvent { tag: "slow" });
        let first = {
            let bus = bus.clone();
            thread::spawn(move || bus.dispatch_events())
        };
        entered_rx.recv().unwrap();
        assert!(bus.is_dispatching());

        let (published_tx, published_rx) = sync_channel(1);
        let second = {
            let bus = bus.clone();
            thread::spawn(move || {
                bus.publish_event(BarEvent { tag: "fast" });
                published_tx.send(()).unwrap();
                bus.dispatch_events()
            })
        };
        published_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        let first = first.join().unwrap();
        let second = second.join().unwrap();
        assert_eq!(first.messages, 1);
        assert_eq!(second.messages, 1);
        assert_eq!(*log.lock(), ["gate:slow", "r:fast"]);
        assert_eq!(bus.pending_len(), 0);
        assert!(!bus.is_dispatching());
    }
}
