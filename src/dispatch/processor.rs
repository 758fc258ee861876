//! Message processor
//!
//! Orchestrates one conversational turn: resolve the tenant, load the lead,
//! run the pure router, persist its patch, perform the delegated side
//! effects (lookups, property search, slot offers, booking creation and
//! cancellation, agent notifications), and deliver the reply. All I/O goes
//! through the injected collaborator traits; the processor owns no business
//! rules of its own beyond sequencing.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BotConfig;
use crate::dispatch::tenant_cache::TenantCache;
use crate::error::{sanitize_log_message, BotResult};
use crate::notify::Notifier;
use crate::observability::metrics::metrics;
use crate::router::input::{RouterInput, TenantProfile};
use crate::router::response::{Action, LeadPatch, ResponseDescriptor};
use crate::router::rules::route;
use crate::router::stage::Stage;
use crate::scheduling::{CalendarEvent, CalendarProvider, SlotGenerator};
use crate::store::{Booking, BookingStatus, Lead, PropertyQuery, RecordStore};

/// Properties listed per search reply.
const MAX_LISTED_PROPERTIES: usize = 5;
/// Viewing slots offered per reply.
const MAX_OFFERED_SLOTS: usize = 6;

/// Result of one processed turn, for callers that want to inspect it
/// (the simulator, tests, the gateway's delivery receipts).
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub action: Action,
    pub reply: String,
    pub lead_id: Option<Uuid>,
}

/// The dispatcher around the pure router.
pub struct MessageProcessor {
    config: BotConfig,
    store: Arc<dyn RecordStore>,
    calendar: Arc<dyn CalendarProvider>,
    notifier: Arc<dyn Notifier>,
    tenants: TenantCache,
    slots: SlotGenerator,
}

impl MessageProcessor {
    pub fn new(
        config: BotConfig,
        store: Arc<dyn RecordStore>,
        calendar: Arc<dyn CalendarProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tenants = TenantCache::new(std::time::Duration::from_secs(
            config.cache.tenant_ttl_secs,
        ));
        let slots = SlotGenerator::new(config.scheduling.clone());
        Self {
            config,
            store,
            calendar,
            notifier,
            tenants,
            slots,
        }
    }

    /// The injected tenant cache, for invalidation when a tenant edits
    /// their settings.
    pub fn tenant_cache(&self) -> &TenantCache {
        &self.tenants
    }

    /// Process one inbound message end to end and send the reply.
    #[tracing::instrument(name = "handle_inbound", skip_all, fields(tenant_id = %tenant_id))]
    pub async fn handle_inbound(
        &self,
        tenant_id: Uuid,
        phone: &str,
        text: &str,
    ) -> BotResult<TurnOutcome> {
        let started = Instant::now();
        metrics().record_message_received();

        let tenant = self.tenant_profile(tenant_id).await?;
        let existing = self.store.find_lead_by_phone(tenant_id, phone).await?;

        let input = RouterInput {
            message: text.to_string(),
            phone: phone.to_string(),
            lead: existing.as_ref().map(Lead::snapshot),
            tenant: tenant.clone(),
        };
        let descriptor = route(&input);

        metrics().record_action(descriptor.action.as_str());
        match descriptor.action {
            Action::Invalid => metrics().record_validation_failure(),
            Action::Error => metrics().record_router_error(),
            _ => {}
        }

        let lead = self.persist(tenant_id, phone, &descriptor, existing).await?;

        let mut reply = descriptor.reply.clone();
        if let Some(lead) = &lead {
            reply = self
                .run_side_effects(&descriptor, lead, &tenant, reply)
                .await?;
        }

        self.notifier.send_message(phone, &reply).await?;
        metrics().record_reply_sent();
        metrics().record_processing_time_ms(started.elapsed().as_millis() as u64);

        info!(
            action = descriptor.action.as_str(),
            lead_id = ?lead.as_ref().map(|l| l.id),
            "turn processed"
        );

        Ok(TurnOutcome {
            action: descriptor.action,
            reply,
            lead_id: lead.map(|l| l.id),
        })
    }

    /// Resolve the tenant profile through the TTL cache, filling blank
    /// branding from the deployment defaults.
    async fn tenant_profile(&self, tenant_id: Uuid) -> BotResult<TenantProfile> {
        if let Some(profile) = self.tenants.get(tenant_id).await {
            return Ok(profile);
        }

        let tenant = self.store.get_tenant(tenant_id).await?;
        let mut profile = tenant.profile();
        let defaults = &self.config.tenant_defaults;
        if profile.bot_name.trim().is_empty() {
            profile.bot_name = defaults.bot_name.clone();
        }
        if profile.company_name.trim().is_empty() {
            profile.company_name = defaults.company_name.clone();
        }
        if profile.property_types.is_empty() {
            profile.property_types = TenantProfile::split_types(&defaults.property_types);
        }

        self.tenants.insert(profile.clone()).await;
        Ok(profile)
    }

    /// Create the lead and/or apply the router's patch.
    async fn persist(
        &self,
        tenant_id: Uuid,
        phone: &str,
        descriptor: &ResponseDescriptor,
        existing: Option<Lead>,
    ) -> BotResult<Option<Lead>> {
        if descriptor.create_lead {
            metrics().record_lead_created();
            let created = self.store.create_lead(tenant_id, phone).await?;
            if descriptor.update_fields.is_empty() {
                return Ok(Some(created));
            }
            let updated = self
                .store
                .update_lead(created.id, &descriptor.update_fields)
                .await?;
            return Ok(Some(updated));
        }

        match existing {
            Some(lead) if !descriptor.update_fields.is_empty() => {
                let updated = self
                    .store
                    .update_lead(lead.id, &descriptor.update_fields)
                    .await?;
                Ok(Some(updated))
            }
            other => Ok(other),
        }
    }

    /// Perform the action's delegated work. Receives the post-patch lead
    /// and may rewrite the reply; lookup failures degrade to an apology
    /// with the lead left in the transitional stage for a later retry.
    async fn run_side_effects(
        &self,
        descriptor: &ResponseDescriptor,
        lead: &Lead,
        tenant: &TenantProfile,
        reply: String,
    ) -> BotResult<String> {
        match descriptor.action {
            Action::FetchLocations => self.offer_locations(lead, reply).await,
            Action::FetchSizes => self.offer_sizes(lead, reply).await,
            Action::Booking => self.offer_slots(descriptor, lead, reply).await,
            Action::CreateBooking => self.book_slot(descriptor, lead, reply).await,
            Action::CancelBooking => self.cancel_latest_booking(lead, reply).await,
            Action::FollowupInterested => {
                metrics().record_hot_lead();
                self.notify_agent(descriptor, tenant).await;
                Ok(reply)
            }
            // a lead stuck in a transitional stage retries the stalled
            // lookup on its next message
            Action::Invalid => match lead.stage {
                Stage::FetchingLocations => self.offer_locations(lead, reply).await,
                Stage::FetchingSizes => self.offer_sizes(lead, reply).await,
                _ => Ok(reply),
            },
            _ => {
                if descriptor.search_properties {
                    self.offer_properties(lead, reply).await
                } else {
                    Ok(reply)
                }
            }
        }
    }

    async fn offer_locations(&self, lead: &Lead, reply: String) -> BotResult<String> {
        match self
            .store
            .list_locations(lead.tenant_id, lead.interest.as_deref())
            .await
        {
            Ok(locations) => {
                self.store
                    .update_lead(lead.id, &LeadPatch::stage(Stage::AskedLocation))
                    .await?;
                if locations.is_empty() {
                    Ok(format!("{reply}\n\nWhich area would you like to be in?"))
                } else {
                    Ok(format!(
                        "{reply}\n\nWe currently have options in:\n{}\n\nWhich area suits you?",
                        numbered(&locations)
                    ))
                }
            }
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "location lookup failed");
                Ok(lookup_failed_reply())
            }
        }
    }

    async fn offer_sizes(&self, lead: &Lead, reply: String) -> BotResult<String> {
        let land = is_land_interest(lead.interest.as_deref());
        let next_stage = if land {
            Stage::AskedLandSize
        } else {
            Stage::AskedSize
        };
        let question = if land {
            "What plot size are you after? e.g. \"50x100\" or \"1/4 Acre\"."
        } else {
            "How many bedrooms do you need?"
        };

        match self
            .store
            .list_sizes(
                lead.tenant_id,
                lead.interest.as_deref(),
                lead.location.as_deref(),
            )
            .await
        {
            Ok(sizes) => {
                self.store
                    .update_lead(lead.id, &LeadPatch::stage(next_stage))
                    .await?;
                if sizes.is_empty() {
                    Ok(format!("{reply}\n\n{question}"))
                } else {
                    Ok(format!(
                        "{reply}\n\nOn offer: {}\n\n{question}",
                        sizes.join(", ")
                    ))
                }
            }
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "size lookup failed");
                Ok(lookup_failed_reply())
            }
        }
    }

    /// Run the property search after the final qualification answer.
    async fn offer_properties(&self, lead: &Lead, reply: String) -> BotResult<String> {
        match self
            .store
            .search_properties(lead.tenant_id, &query_for(lead))
            .await
        {
            Ok(properties) if properties.is_empty() => Ok(format!(
                "{reply}\n\nNothing matches all your answers just yet. Reply HI \
                 to search again with different criteria, and we'll alert you \
                 when new stock arrives."
            )),
            Ok(properties) => {
                let lines: Vec<String> = properties
                    .iter()
                    .take(MAX_LISTED_PROPERTIES)
                    .map(property_line)
                    .collect();
                Ok(format!(
                    "{reply}\n\nHere's what we found:\n{}\n\nReply with the \
                     property number to book a viewing.",
                    numbered(&lines)
                ))
            }
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "property search failed");
                Ok(lookup_failed_reply())
            }
        }
    }

    /// A property was selected: remember it and offer viewing slots.
    async fn offer_slots(
        &self,
        descriptor: &ResponseDescriptor,
        lead: &Lead,
        reply: String,
    ) -> BotResult<String> {
        let number = descriptor.property_number.unwrap_or(0) as usize;
        let properties = match self
            .store
            .search_properties(lead.tenant_id, &query_for(lead))
            .await
        {
            Ok(properties) => properties,
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "property search failed");
                self.reset_stage(lead.id, Stage::Completed).await?;
                return Ok(lookup_failed_reply());
            }
        };

        let listed = properties.len().min(MAX_LISTED_PROPERTIES);
        if listed == 0 {
            self.reset_stage(lead.id, Stage::Completed).await?;
            return Ok(
                "Those properties are no longer available. Reply HI to start a new search."
                    .to_string(),
            );
        }
        if number == 0 || number > listed {
            self.reset_stage(lead.id, Stage::Completed).await?;
            return Ok(format!(
                "Please pick a property between 1 and {listed}."
            ));
        }

        let property = &properties[number - 1];
        self.store
            .set_last_viewed_property(lead.id, &property.name)
            .await?;

        match self
            .slots
            .available_slots(self.calendar.as_ref(), &property.name, Utc::now())
            .await
        {
            Ok(slots) if slots.is_empty() => {
                self.reset_stage(lead.id, Stage::Completed).await?;
                Ok(format!(
                    "No viewing slots are open for {} right now. Reply with \
                     another property number to try a different one.",
                    property.name
                ))
            }
            Ok(slots) => {
                let offset = self.slots.offset();
                let labels: Vec<String> = slots
                    .iter()
                    .take(MAX_OFFERED_SLOTS)
                    .map(|s| s.label(offset))
                    .collect();
                Ok(format!(
                    "{reply}\n\nViewing times for {}:\n{}",
                    property.name,
                    numbered(&labels)
                ))
            }
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "slot lookup failed");
                self.reset_stage(lead.id, Stage::Completed).await?;
                Ok(lookup_failed_reply())
            }
        }
    }

    /// A slot was selected: double-check availability, then create the
    /// calendar event and the booking row.
    ///
    /// The check is best-effort check-then-act. The calendar and the
    /// booking table are consulted immediately before the event is
    /// created; a race lost in that window surfaces as a second event on
    /// the agent's calendar, exactly like the manual double-booking it
    /// replaces.
    async fn book_slot(
        &self,
        descriptor: &ResponseDescriptor,
        lead: &Lead,
        _reply: String,
    ) -> BotResult<String> {
        let property_name = match &lead.last_viewed_property {
            Some(name) => name.clone(),
            None => {
                self.reset_stage(lead.id, Stage::Completed).await?;
                return Ok(
                    "I lost track of the property you picked. Reply with the \
                     property number again."
                        .to_string(),
                );
            }
        };

        let now = Utc::now();
        let slots = match self
            .slots
            .available_slots(self.calendar.as_ref(), &property_name, now)
            .await
        {
            Ok(slots) => slots,
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "slot lookup failed");
                self.reset_stage(lead.id, Stage::AwaitingTimeSlot).await?;
                return Ok(lookup_failed_reply());
            }
        };

        let offered = slots.len().min(MAX_OFFERED_SLOTS);
        let number = descriptor.slot_number.unwrap_or(0) as usize;
        if offered == 0 {
            self.reset_stage(lead.id, Stage::Completed).await?;
            return Ok(format!(
                "No viewing slots are open for {property_name} any more. Reply \
                 with a property number to pick again."
            ));
        }
        if number == 0 || number > offered {
            self.reset_stage(lead.id, Stage::AwaitingTimeSlot).await?;
            return Ok(format!("Please pick a slot between 1 and {offered}."));
        }

        let slot = slots[number - 1];

        // double-check right before creating: calendar, then booking table
        let calendar_free = self
            .calendar
            .is_window_free(&property_name, slot.start, slot.end)
            .await
            .unwrap_or(false);
        let store_conflicts = self
            .store
            .confirmed_bookings_overlapping(lead.tenant_id, &property_name, slot.start, slot.end)
            .await?;
        if !calendar_free || !store_conflicts.is_empty() {
            self.reset_stage(lead.id, Stage::AwaitingTimeSlot).await?;
            return Ok(
                "That slot was just taken. Reply with another slot number."
                    .to_string(),
            );
        }

        let event = CalendarEvent {
            title: format!("Viewing: {property_name}"),
            property_name: property_name.clone(),
            lead_phone: lead.phone.clone(),
            start: slot.start,
            end: slot.end,
        };
        let event_id = match self.calendar.create_event(&event).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %sanitize_log_message(&e.to_string()), "calendar event creation failed");
                self.reset_stage(lead.id, Stage::AwaitingTimeSlot).await?;
                return Ok(lookup_failed_reply());
            }
        };

        self.store
            .create_booking(Booking {
                id: Uuid::new_v4(),
                tenant_id: lead.tenant_id,
                lead_id: lead.id,
                property_name: property_name.clone(),
                start: slot.start,
                end: slot.end,
                calendar_event_id: event_id,
                status: BookingStatus::Confirmed,
            })
            .await?;
        metrics().record_booking_created();

        Ok(crate::router::prompts::booking_confirmed(
            &slot.label(self.slots.offset()),
        ))
    }

    async fn cancel_latest_booking(&self, lead: &Lead, reply: String) -> BotResult<String> {
        match self.store.latest_confirmed_booking(lead.id).await? {
            Some(booking) => {
                self.store.cancel_booking(booking.id).await?;
                if let Some(event_id) = &booking.calendar_event_id {
                    // best-effort: the booking row is already cancelled
                    if let Err(e) = self.calendar.delete_event(event_id).await {
                        warn!(error = %sanitize_log_message(&e.to_string()), "calendar event delete failed");
                    }
                }
                metrics().record_booking_cancelled();
                Ok(reply)
            }
            None => Ok(reply),
        }
    }

    async fn notify_agent(&self, descriptor: &ResponseDescriptor, tenant: &TenantProfile) {
        let Some(note) = &descriptor.agent_notification else {
            return;
        };
        match &note.destination {
            Some(destination) => {
                if let Err(e) = self.notifier.send_message(destination, &note.message).await {
                    warn!(error = %sanitize_log_message(&e.to_string()), "agent notification failed");
                }
            }
            None => {
                warn!(
                    tenant = %tenant.company_name,
                    "tenant has no WhatsApp number configured; dropping agent notification"
                );
            }
        }
    }

    async fn reset_stage(&self, lead_id: Uuid, stage: Stage) -> BotResult<()> {
        self.store
            .update_lead(lead_id, &LeadPatch::stage(stage))
            .await?;
        Ok(())
    }
}

fn query_for(lead: &Lead) -> PropertyQuery {
    PropertyQuery {
        interest: lead.interest.clone(),
        location: lead.location.clone(),
        max_price: lead.budget,
        size: lead.size.clone(),
    }
}

fn is_land_interest(interest: Option<&str>) -> bool {
    interest.map_or(false, |i| {
        let lower = i.to_lowercase();
        lower.contains("land") || lower.contains("plot") || lower.contains("acre")
    })
}

fn numbered<T: AsRef<str>>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn property_line(property: &crate::store::Property) -> String {
    let size = if property.size.chars().all(|c| c.is_ascii_digit()) {
        format!("{} bed", property.size)
    } else {
        property.size.clone()
    };
    format!(
        "{} ({size}, {}) at {}",
        property.name,
        property.location,
        format_amount(property.price)
    )
}

fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn lookup_failed_reply() -> String {
    "Sorry, I couldn't look that up right now. Please try again in a moment.".to_string()
}
