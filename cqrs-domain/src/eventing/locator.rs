//! 事件处理器定位器（EventHandlerLocator）
//!
//! 在登记时把处理器按声明的事件名称展开为查找表，
//! 投递时按名称取出处理器列表，不再逐次推断处理能力。
//!
use super::handler::{EventHandler, HandledEventType};
use crate::domain_event::normalize_event_type;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct EventHandlerLocator {
    // 名称 -> [(登记序号, 处理器)]
    by_type: HashMap<String, Vec<(usize, Arc<dyn EventHandler>)>>,
    all: Vec<(usize, Arc<dyn EventHandler>)>,
    registered: usize,
}

impl EventHandlerLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handlers(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        let mut locator = Self::new();
        for h in handlers {
            locator.register(h);
        }
        locator
    }

    /// 登记处理器；同一处理器实例可重复登记，每次登记都会被独立调用
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let order = self.registered;
        self.registered += 1;

        match handler.handled_event_type() {
            HandledEventType::All => self.all.push((order, handler)),
            HandledEventType::One(t) => {
                self.by_type
                    .entry(normalize_event_type(&t))
                    .or_default()
                    .push((order, handler));
            }
            HandledEventType::Many(ts) => {
                let mut keys: Vec<String> = ts.iter().map(|t| normalize_event_type(t)).collect();
                keys.sort();
                keys.dedup();
                for key in keys {
                    self.by_type
                        .entry(key)
                        .or_default()
                        .push((order, handler.clone()));
                }
            }
        }
    }

    /// 能处理该事件的处理器，按登记顺序排列
    pub fn matching(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        let mut merged: Vec<(usize, Arc<dyn EventHandler>)> = Vec::new();
        if let Some(list) = self.by_type.get(&normalize_event_type(event_type)) {
            merged.extend(list.iter().cloned());
        }
        merged.extend(self.all.iter().cloned());
        merged.sort_by_key(|(order, _)| *order);
        merged.into_iter().map(|(_, h)| h).collect()
    }

    pub fn handles(&self, event_type: &str) -> bool {
        !self.all.is_empty() || self.by_type.contains_key(&normalize_event_type(event_type))
    }

    /// 已登记的处理器数量
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }
}
