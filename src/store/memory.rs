//! In-memory record store
//!
//! Backs the console simulator and the test suite. A single mutex around
//! plain vectors is plenty: the simulator is one conversation, and tests
//! exercise correctness, not throughput.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::router::response::LeadPatch;
use crate::store::{
    Booking, BookingStatus, Lead, Property, PropertyQuery, RecordStore, StoreError, Tenant,
};

#[derive(Default)]
struct Inner {
    tenants: HashMap<Uuid, Tenant>,
    leads: Vec<Lead>,
    properties: Vec<Property>,
    bookings: Vec<Booking>,
}

/// Mutex-protected tables, cloneable via `Arc`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tenant(&self, tenant: Tenant) {
        self.inner.lock().await.tenants.insert(tenant.id, tenant);
    }

    pub async fn add_property(&self, property: Property) {
        self.inner.lock().await.properties.push(property);
    }

    /// Direct read used by tests and the simulator prompt line.
    pub async fn get_lead(&self, lead_id: Uuid) -> Option<Lead> {
        self.inner
            .lock()
            .await
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .cloned()
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.inner.lock().await.bookings.clone()
    }

    /// Flip the follow-up flag the way the post-viewing job would.
    pub async fn mark_awaiting_followup(&self, lead_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let lead = inner
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))?;
        lead.awaiting_followup = true;
        Ok(())
    }

    /// A demo tenant with a small property book, for `qualibot chat`.
    pub async fn seed_demo(&self) -> Tenant {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            bot_name: "Kezia".to_string(),
            company_name: "Acme Homes".to_string(),
            property_types: "Buy, Rent, Land".to_string(),
            whatsapp_number: Some("+254711000000".to_string()),
        };
        self.add_tenant(tenant.clone()).await;

        let demo = [
            ("Sunset Villa", "Buy", "Karen", 28_000_000, "4"),
            ("Acacia Court 2B", "Rent", "Westlands", 95_000, "2"),
            ("Acacia Court 3A", "Rent", "Westlands", 120_000, "3"),
            ("Riverside Heights 7", "Rent", "Riverside", 150_000, "3"),
            ("Thika Greens Plot 14", "Land", "Thika", 3_500_000, "50x100"),
            ("Kitengela Acres", "Land", "Kitengela", 5_200_000, "1/2 Acre"),
        ];
        for (name, property_type, location, price, size) in demo {
            self.add_property(Property {
                id: Uuid::new_v4(),
                tenant_id: tenant.id,
                name: name.to_string(),
                property_type: property_type.to_string(),
                location: location.to_string(),
                price,
                size: size.to_string(),
                available: true,
            })
            .await;
        }

        tenant
    }
}

fn type_matches(property: &Property, interest: Option<&str>) -> bool {
    match interest {
        Some(interest) => property.property_type.eq_ignore_ascii_case(interest),
        None => true,
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_tenant(&self, tenant_id: Uuid) -> Result<Tenant, StoreError> {
        self.inner
            .lock()
            .await
            .tenants
            .get(&tenant_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("tenant {tenant_id}")))
    }

    async fn find_lead_by_phone(
        &self,
        tenant_id: Uuid,
        phone: &str,
    ) -> Result<Option<Lead>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .leads
            .iter()
            .find(|l| l.tenant_id == tenant_id && l.phone == phone)
            .cloned())
    }

    async fn create_lead(&self, tenant_id: Uuid, phone: &str) -> Result<Lead, StoreError> {
        let lead = Lead::new(tenant_id, phone, Utc::now());
        self.inner.lock().await.leads.push(lead.clone());
        Ok(lead)
    }

    async fn update_lead(&self, lead_id: Uuid, patch: &LeadPatch) -> Result<Lead, StoreError> {
        let mut inner = self.inner.lock().await;
        let lead = inner
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))?;
        lead.apply(patch, Utc::now());
        Ok(lead.clone())
    }

    async fn set_last_viewed_property(
        &self,
        lead_id: Uuid,
        property_name: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let lead = inner
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))?;
        lead.last_viewed_property = Some(property_name.to_string());
        lead.updated_at = Utc::now();
        Ok(())
    }

    async fn list_locations(
        &self,
        tenant_id: Uuid,
        interest: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let mut locations: Vec<String> = Vec::new();
        for property in inner
            .properties
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.available && type_matches(p, interest))
        {
            if !locations
                .iter()
                .any(|l| l.eq_ignore_ascii_case(&property.location))
            {
                locations.push(property.location.clone());
            }
        }
        Ok(locations)
    }

    async fn list_sizes(
        &self,
        tenant_id: Uuid,
        interest: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let mut sizes: Vec<String> = Vec::new();
        for property in inner.properties.iter().filter(|p| {
            p.tenant_id == tenant_id
                && p.available
                && type_matches(p, interest)
                && location.map_or(true, |loc| p.location.eq_ignore_ascii_case(loc))
        }) {
            if !sizes.iter().any(|s| s.eq_ignore_ascii_case(&property.size)) {
                sizes.push(property.size.clone());
            }
        }
        Ok(sizes)
    }

    async fn search_properties(
        &self,
        tenant_id: Uuid,
        query: &PropertyQuery,
    ) -> Result<Vec<Property>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .properties
            .iter()
            .filter(|p| {
                p.tenant_id == tenant_id
                    && p.available
                    && type_matches(p, query.interest.as_deref())
                    && query
                        .location
                        .as_deref()
                        .map_or(true, |loc| p.location.eq_ignore_ascii_case(loc))
                    && query.max_price.map_or(true, |max| p.price <= max)
                    && query
                        .size
                        .as_deref()
                        .map_or(true, |size| p.size.eq_ignore_ascii_case(size))
            })
            .cloned()
            .collect())
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        self.inner.lock().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn confirmed_bookings_overlapping(
        &self,
        tenant_id: Uuid,
        property_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .iter()
            .filter(|b| {
                b.tenant_id == tenant_id
                    && b.status == BookingStatus::Confirmed
                    && b.property_name == property_name
                    && b.start < end
                    && b.end > start
            })
            .cloned()
            .collect())
    }

    async fn latest_confirmed_booking(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.lead_id == lead_id && b.status == BookingStatus::Confirmed)
            .max_by_key(|b| b.start)
            .cloned())
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let booking = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {booking_id}")))?;
        booking.status = BookingStatus::Cancelled;
        Ok(())
    }
}
