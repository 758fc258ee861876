//! Record-store seam
//!
//! The production system keeps tenants, leads, properties and bookings in a
//! spreadsheet-like table service. That service is an external collaborator;
//! this crate only defines the [`RecordStore`] trait it is reached through,
//! plus the row types. [`memory::InMemoryStore`] backs the console simulator
//! and the test suite.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::router::input::{LeadSnapshot, TenantProfile};
use crate::router::response::LeadPatch;
use crate::router::stage::Stage;

/// Lead pipeline status, stored with the human-readable labels the tenant
/// sees in their sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    #[serde(rename = "Hot Lead")]
    HotLead,
    #[serde(rename = "Not Interested")]
    NotInterested,
    Cancelled,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::HotLead => "Hot Lead",
            LeadStatus::NotInterested => "Not Interested",
            LeadStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant row: one business customer of the bot platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub bot_name: String,
    pub company_name: String,
    /// Offered property types, comma-separated as stored.
    pub property_types: String,
    pub whatsapp_number: Option<String>,
}

impl Tenant {
    /// The router-facing view of this tenant.
    pub fn profile(&self) -> TenantProfile {
        TenantProfile {
            id: self.id,
            bot_name: self.bot_name.clone(),
            company_name: self.company_name.clone(),
            property_types: TenantProfile::split_types(&self.property_types),
            whatsapp_number: self.whatsapp_number.clone(),
        }
    }
}

/// Lead row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub interest: Option<String>,
    pub budget: Option<u64>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub stage: Stage,
    pub status: LeadStatus,
    pub awaiting_followup: bool,
    pub last_viewed_property: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Fresh lead for a first inbound message. The router's patch moves it
    /// to the right stage immediately after creation.
    pub fn new(tenant_id: Uuid, phone: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            phone: phone.to_string(),
            name: None,
            interest: None,
            budget: None,
            location: None,
            size: None,
            stage: Stage::AskedBuyOrRent,
            status: LeadStatus::New,
            awaiting_followup: false,
            last_viewed_property: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The router-facing view of this lead.
    pub fn snapshot(&self) -> LeadSnapshot {
        LeadSnapshot {
            id: self.id,
            stage: self.stage,
            name: self.name.clone(),
            interest: self.interest.clone(),
            budget: self.budget,
            location: self.location.clone(),
            size: self.size.clone(),
            awaiting_followup: self.awaiting_followup,
            last_viewed_property: self.last_viewed_property.clone(),
        }
    }

    /// Apply a router patch. Only `Some` fields are written.
    pub fn apply(&mut self, patch: &LeadPatch, now: DateTime<Utc>) {
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(interest) = &patch.interest {
            self.interest = Some(interest.clone());
        }
        if let Some(budget) = patch.budget {
            self.budget = Some(budget);
        }
        if let Some(location) = &patch.location {
            self.location = Some(location.clone());
        }
        if let Some(size) = &patch.size {
            self.size = Some(size.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(flag) = patch.awaiting_followup {
            self.awaiting_followup = flag;
        }
        self.updated_at = now;
    }
}

/// Property row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub property_type: String,
    pub location: String,
    pub price: u64,
    /// Bedroom count or plot-size string, matching the lead's `size` field.
    pub size: String,
    pub available: bool,
}

/// Booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Booking row: one viewing appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lead_id: Uuid,
    pub property_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calendar_event_id: Option<String>,
    pub status: BookingStatus,
}

/// Property search filter assembled by the dispatcher from the lead's
/// captured answers.
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    pub interest: Option<String>,
    pub location: Option<String>,
    pub max_price: Option<u64>,
    pub size: Option<String>,
}

/// Record-store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The spreadsheet-like table service, as seen by the dispatcher.
///
/// Implementations are expected to be cheap to clone behind an `Arc`; the
/// dispatcher holds one for the lifetime of the process. No method retries:
/// backoff is the implementation's concern.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_tenant(&self, tenant_id: Uuid) -> Result<Tenant, StoreError>;

    async fn find_lead_by_phone(
        &self,
        tenant_id: Uuid,
        phone: &str,
    ) -> Result<Option<Lead>, StoreError>;

    /// Create a lead row for a first contact. Status starts at `New`.
    async fn create_lead(&self, tenant_id: Uuid, phone: &str) -> Result<Lead, StoreError>;

    /// Apply a patch and return the updated row.
    async fn update_lead(&self, lead_id: Uuid, patch: &LeadPatch) -> Result<Lead, StoreError>;

    /// Remember the property a lead was last shown, for follow-ups.
    async fn set_last_viewed_property(
        &self,
        lead_id: Uuid,
        property_name: &str,
    ) -> Result<(), StoreError>;

    /// Distinct locations with available stock, optionally narrowed by
    /// interest.
    async fn list_locations(
        &self,
        tenant_id: Uuid,
        interest: Option<&str>,
    ) -> Result<Vec<String>, StoreError>;

    /// Distinct sizes on offer for an interest/location combination.
    async fn list_sizes(
        &self,
        tenant_id: Uuid,
        interest: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<String>, StoreError>;

    /// Available properties matching the query, in sheet order.
    async fn search_properties(
        &self,
        tenant_id: Uuid,
        query: &PropertyQuery,
    ) -> Result<Vec<Property>, StoreError>;

    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError>;

    /// Confirmed bookings for a property overlapping the window. Part of
    /// the best-effort conflict check; not a reservation.
    async fn confirmed_bookings_overlapping(
        &self,
        tenant_id: Uuid,
        property_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// The lead's most recent confirmed booking, if any.
    async fn latest_confirmed_booking(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<Booking>, StoreError>;

    async fn cancel_booking(&self, booking_id: Uuid) -> Result<(), StoreError>;
}
