//! Mock implementations for testing
//!
//! Provides mock CalendarProvider, Notifier and RecordStore implementations
//! to enable comprehensive testing without external dependencies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::notify::{Notifier, NotifyError};
use crate::router::response::LeadPatch;
use crate::scheduling::{CalendarError, CalendarEvent, CalendarProvider};
use crate::store::{Booking, Lead, Property, PropertyQuery, RecordStore, StoreError, Tenant};

/// Mock calendar with a configurable busy list. Created events count as
/// busy from then on, which makes double-booking scenarios easy to stage.
#[derive(Debug, Default)]
pub struct MockCalendar {
    busy: Arc<Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>>,
    created: Arc<Mutex<Vec<CalendarEvent>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub async fn mark_busy(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.busy.lock().await.push((start, end));
    }

    pub async fn created_events(&self) -> Vec<CalendarEvent> {
        self.created.lock().await.clone()
    }

    pub async fn deleted_events(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn is_window_free(
        &self,
        _property_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarError> {
        if self.should_fail {
            return Err(CalendarError::Unavailable("mock calendar down".to_string()));
        }
        let busy = self.busy.lock().await;
        if busy.iter().any(|(s, e)| *s < end && *e > start) {
            return Ok(false);
        }
        let created = self.created.lock().await;
        Ok(!created.iter().any(|ev| ev.start < end && ev.end > start))
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError> {
        if self.should_fail {
            return Err(CalendarError::Backend("mock create failure".to_string()));
        }
        let mut created = self.created.lock().await;
        created.push(event.clone());
        Ok(format!("evt-{}", created.len()))
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        if self.should_fail {
            return Err(CalendarError::Backend("mock delete failure".to_string()));
        }
        self.deleted.lock().await.push(event_id.to_string());
        Ok(())
    }
}

/// Mock notifier recording every outbound message.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    should_fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// All `(to, text)` pairs sent so far.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    /// Messages delivered to one number.
    pub async fn sent_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == phone)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_message(&self, to_phone: &str, text: &str) -> Result<(), NotifyError> {
        if self.should_fail {
            return Err(NotifyError::Delivery {
                to: to_phone.to_string(),
                message: "mock delivery failure".to_string(),
            });
        }
        self.sent
            .lock()
            .await
            .push((to_phone.to_string(), text.to_string()));
        Ok(())
    }
}

/// Record store whose every call fails, for dispatcher error-path tests.
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn err<T>() -> Result<T, StoreError> {
        Err(StoreError::Backend("mock store failure".to_string()))
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn get_tenant(&self, _tenant_id: Uuid) -> Result<Tenant, StoreError> {
        Self::err()
    }

    async fn find_lead_by_phone(
        &self,
        _tenant_id: Uuid,
        _phone: &str,
    ) -> Result<Option<Lead>, StoreError> {
        Self::err()
    }

    async fn create_lead(&self, _tenant_id: Uuid, _phone: &str) -> Result<Lead, StoreError> {
        Self::err()
    }

    async fn update_lead(&self, _lead_id: Uuid, _patch: &LeadPatch) -> Result<Lead, StoreError> {
        Self::err()
    }

    async fn set_last_viewed_property(
        &self,
        _lead_id: Uuid,
        _property_name: &str,
    ) -> Result<(), StoreError> {
        Self::err()
    }

    async fn list_locations(
        &self,
        _tenant_id: Uuid,
        _interest: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        Self::err()
    }

    async fn list_sizes(
        &self,
        _tenant_id: Uuid,
        _interest: Option<&str>,
        _location: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        Self::err()
    }

    async fn search_properties(
        &self,
        _tenant_id: Uuid,
        _query: &PropertyQuery,
    ) -> Result<Vec<Property>, StoreError> {
        Self::err()
    }

    async fn create_booking(&self, _booking: Booking) -> Result<Booking, StoreError> {
        Self::err()
    }

    async fn confirmed_bookings_overlapping(
        &self,
        _tenant_id: Uuid,
        _property_name: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        Self::err()
    }

    async fn latest_confirmed_booking(
        &self,
        _lead_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        Self::err()
    }

    async fn cancel_booking(&self, _booking_id: Uuid) -> Result<(), StoreError> {
        Self::err()
    }
}
