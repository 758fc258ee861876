//! Shared helpers for integration tests
//!
//! Builds a fully wired MessageProcessor over the in-memory store, the mock
//! calendar and the mock notifier, with the demo tenant seeded.

#![allow(dead_code)]

use std::sync::Arc;

use qualibot::config::BotConfig;
use qualibot::dispatch::MessageProcessor;
use qualibot::store::memory::InMemoryStore;
use qualibot::store::Tenant;
use qualibot::testing::mocks::{MockCalendar, MockNotifier};

pub const LEAD_PHONE: &str = "+254700000001";
pub const AGENT_PHONE: &str = "+254711000000";

pub struct Harness {
    pub processor: MessageProcessor,
    pub store: InMemoryStore,
    pub calendar: Arc<MockCalendar>,
    pub notifier: Arc<MockNotifier>,
    pub tenant: Tenant,
}

/// Test configuration mirroring the defaults.
pub fn test_config() -> BotConfig {
    let toml_content = r#"
[bot]
id = "test-bot"

[tenant_defaults]
bot_name = "Kezia"
company_name = "Acme Homes"
property_types = "Buy, Rent, Land"

[scheduling]
days_ahead = 5
day_start_hour = 9
day_end_hour = 17
slot_minutes = 60
utc_offset_hours = 3
skip_weekends = true
"#;
    let config: BotConfig = toml::from_str(toml_content).expect("test config should parse");
    config.validate().expect("test config should validate");
    config
}

/// Processor over the demo tenant with recording collaborators.
pub async fn harness() -> Harness {
    let store = InMemoryStore::new();
    let tenant = store.seed_demo().await;
    let calendar = Arc::new(MockCalendar::new());
    let notifier = Arc::new(MockNotifier::new());

    let processor = MessageProcessor::new(
        test_config(),
        Arc::new(store.clone()),
        calendar.clone(),
        notifier.clone(),
    );

    Harness {
        processor,
        store,
        calendar,
        notifier,
        tenant,
    }
}

/// Drive the dialogue up to the given message list, returning the last
/// reply.
pub async fn drive(harness: &Harness, messages: &[&str]) -> String {
    let mut last_reply = String::new();
    for message in messages {
        let outcome = harness
            .processor
            .handle_inbound(harness.tenant.id, LEAD_PHONE, message)
            .await
            .expect("turn should process");
        last_reply = outcome.reply;
    }
    last_reply
}

/// The standard rent qualification up to the property list.
pub fn rent_dialogue() -> Vec<&'static str> {
    vec![
        "Hi there, I want to rent an apartment",
        "my name is jane wanjiru",
        "120K",
        "Westlands",
        "3 bed",
    ]
}
