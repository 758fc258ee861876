//! Router output types
//!
//! A routing decision is a `ResponseDescriptor`: what the caller should do
//! (`Action`), which lead fields to persist (`LeadPatch`), the reply to send,
//! and the structured values downstream lookups consume. The router never
//! performs I/O; the dispatcher owns persistence and side effects.

use serde::{Deserialize, Serialize};

use crate::router::stage::Stage;
use crate::store::LeadStatus;

/// What the caller should do with this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// First contact: create the lead, then apply the patch.
    Create,
    /// Apply the patch, send the reply.
    Update,
    /// Input failed this stage's validation; reply is the help prompt.
    Invalid,
    /// Budget captured; fetch available locations for the tenant.
    FetchLocations,
    /// Location captured; fetch available sizes.
    FetchSizes,
    /// Property selected; generate and offer viewing slots.
    Booking,
    /// Slot selected; create the calendar booking.
    CreateBooking,
    /// Cancel the confirmed booking.
    CancelBooking,
    /// Follow-up answered "interested": notify the agent.
    FollowupInterested,
    /// Follow-up answered "not interested".
    FollowupNotInterested,
    /// Internal fault; reply is a generic apology.
    Error,
}

impl Action {
    /// Snake-case tag, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Invalid => "invalid",
            Action::FetchLocations => "fetch_locations",
            Action::FetchSizes => "fetch_sizes",
            Action::Booking => "booking",
            Action::CreateBooking => "create_booking",
            Action::CancelBooking => "cancel_booking",
            Action::FollowupInterested => "followup_interested",
            Action::FollowupNotInterested => "followup_not_interested",
            Action::Error => "error",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead fields to persist for this turn. Only `Some` fields are written;
/// an all-`None` patch means the turn changed nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    pub stage: Option<Stage>,
    pub name: Option<String>,
    pub interest: Option<String>,
    pub budget: Option<u64>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub status: Option<LeadStatus>,
    pub awaiting_followup: Option<bool>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.stage.is_none()
            && self.name.is_none()
            && self.interest.is_none()
            && self.budget.is_none()
            && self.location.is_none()
            && self.size.is_none()
            && self.status.is_none()
            && self.awaiting_followup.is_none()
    }

    /// Patch that only moves the stage.
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }
}

/// Side-channel notification for the tenant's agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNotification {
    /// Message text for the agent.
    pub message: String,
    /// Destination number (the tenant's WhatsApp), when configured.
    pub destination: Option<String>,
    pub lead_name: Option<String>,
    pub lead_phone: String,
    pub property_name: Option<String>,
}

/// Complete routing decision for one inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub action: Action,
    pub update_fields: LeadPatch,
    pub reply: String,
    /// Create a new lead row before applying `update_fields`.
    #[serde(default)]
    pub create_lead: bool,
    /// Run the property search after persisting (size captured).
    #[serde(default)]
    pub search_properties: bool,
    /// Create the booking after persisting (slot captured).
    #[serde(default)]
    pub booking_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_notification: Option<AgentNotification>,
}

impl ResponseDescriptor {
    /// Descriptor with the given action, patch and reply, all optional
    /// fields unset.
    pub fn new(action: Action, update_fields: LeadPatch, reply: impl Into<String>) -> Self {
        Self {
            action,
            update_fields,
            reply: reply.into(),
            create_lead: false,
            search_properties: false,
            booking_request: false,
            detected_interest: None,
            bedrooms: None,
            location: None,
            property_number: None,
            slot_number: None,
            plot_size: None,
            agent_notification: None,
        }
    }

    /// Validation-failure descriptor: empty patch, help-text reply.
    pub fn invalid(reply: impl Into<String>) -> Self {
        Self::new(Action::Invalid, LeadPatch::default(), reply)
    }

    /// Internal-fault descriptor used at the router boundary.
    pub fn error(reply: impl Into<String>) -> Self {
        Self::new(Action::Error, LeadPatch::default(), reply)
    }
}
