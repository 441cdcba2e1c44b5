use cqrs_domain::domain_event::{DomainEvent, EventMessage, EventType};
use cqrs_macros::domain_event;
use serde::{Deserialize, Serialize};

#[domain_event]
#[derive(PartialEq, Serialize, Deserialize)]
struct EmailChangedEvent {
    email: String,
}

#[domain_event(name = "account.closed")]
struct AccountClosed;

#[domain_event]
struct Event(u32);

fn main() {
    assert_eq!(EmailChangedEvent::EVENT_TYPE, "EmailChanged");
    assert_eq!(AccountClosed::EVENT_TYPE, "account.closed");
    assert_eq!(Event::EVENT_TYPE, "Event");

    let e = EmailChangedEvent {
        email: "a@example.com".into(),
    };
    assert_eq!(e.clone(), e);
    assert_eq!(e.event_type(), "EmailChanged");

    let msg = EventMessage::new(e);
    assert!(msg.payload().is::<EmailChangedEvent>());
    println!("{:?}", AccountClosed);
}
