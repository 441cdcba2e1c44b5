use cqrs_domain::aggregate_root::{AggregateRoot, ApplyRules, HasPendingEvents};
use cqrs_domain::entity::Entity;
use cqrs_macros::{aggregate_root, domain_event};
use std::sync::LazyLock;

#[domain_event]
struct RenamedEvent {
    name: String,
}

#[aggregate_root(id = uuid::Uuid)]
#[derive(Clone)]
struct Account {
    name: String,
}

#[aggregate_root(debug = false)]
struct Ledger {
    entries: Vec<u64>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ledger({})", self.id)
    }
}

impl AggregateRoot for Account {
    const TYPE: &'static str = "Account";

    fn apply_rules() -> &'static ApplyRules<Self> {
        static RULES: LazyLock<ApplyRules<Account>> = LazyLock::new(|| {
            ApplyRules::new().on(|a: &mut Account, e: &RenamedEvent| a.name = e.name.clone())
        });
        &RULES
    }
}

fn main() {
    let id = uuid::Uuid::new_v4();
    let mut account = Account::new(id);
    assert_eq!(account.id(), &id);
    assert!(account.pending_events().is_empty());

    account
        .apply(RenamedEvent {
            name: "alice".into(),
        })
        .unwrap();
    assert_eq!(account.name, "alice");
    assert_eq!(account.clone().pull_pending_events().len(), 1);

    let ledger = Ledger::new("l-1".to_string());
    assert!(ledger.entries.is_empty());
    assert_eq!(format!("{ledger:?}"), "Ledger(l-1)");
}
