//! Router input types
//!
//! The router is a pure function: everything it may consult (the inbound
//! message, the persisted lead snapshot, the tenant's branding and catalog)
//! arrives in one `RouterInput`. The caller re-reads the lead before every
//! call; the router never sees stale state it wrote itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::router::stage::Stage;

/// Complete input for one routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterInput {
    /// Raw inbound message text.
    pub message: String,
    /// Sender phone in E.164-ish form (as delivered by the channel).
    pub phone: String,
    /// Snapshot of the lead, `None` for a first contact.
    pub lead: Option<LeadSnapshot>,
    /// Tenant branding and catalog.
    pub tenant: TenantProfile,
}

impl RouterInput {
    /// Message with surrounding whitespace removed; every rule matches
    /// against this form.
    pub fn trimmed(&self) -> &str {
        self.message.trim()
    }
}

/// The persisted lead fields the router branches on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSnapshot {
    pub id: Uuid,
    pub stage: Stage,
    pub name: Option<String>,
    pub interest: Option<String>,
    pub budget: Option<u64>,
    pub location: Option<String>,
    pub size: Option<String>,
    /// Set by the follow-up job after a viewing; makes "1"/"2" meaningful.
    pub awaiting_followup: bool,
    /// Name of the property from the most recent viewing, for follow-up
    /// notifications.
    pub last_viewed_property: Option<String>,
}

impl LeadSnapshot {
    /// Minimal snapshot for a lead at a given stage. Tests and the
    /// simulator fill in the rest as the dialogue progresses.
    pub fn at_stage(id: Uuid, stage: Stage) -> Self {
        Self {
            id,
            stage,
            name: None,
            interest: None,
            budget: None,
            location: None,
            size: None,
            awaiting_followup: false,
            last_viewed_property: None,
        }
    }
}

/// Tenant branding and catalog, read-only to the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: Uuid,
    /// Display name the bot introduces itself with.
    pub bot_name: String,
    pub company_name: String,
    /// Offered property types, already split from the stored
    /// comma-separated form. May be empty; see `catalog`.
    pub property_types: Vec<String>,
    /// Agent WhatsApp number for follow-up notifications.
    pub whatsapp_number: Option<String>,
}

impl TenantProfile {
    /// The effective catalog: the tenant's configured types, or the stock
    /// Buy/Rent/Land set when none are configured.
    pub fn catalog(&self) -> Vec<String> {
        if self.property_types.is_empty() {
            vec!["Buy".to_string(), "Rent".to_string(), "Land".to_string()]
        } else {
            self.property_types.clone()
        }
    }

    /// Parse the record store's comma-separated type list.
    pub fn split_types(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
