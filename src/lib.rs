//! Qualibot - conversational lead qualification for property viewings
//!
//! A WhatsApp-style bot that walks a prospective tenant or buyer through a
//! fixed qualification dialogue (property type, name, budget, location,
//! size), searches the tenant's property book, and books viewing slots on
//! the agency calendar.
//!
//! # Overview
//!
//! This crate provides:
//! - The pure conversation router: stage machine, regex extraction, reply
//!   selection
//! - An async dispatcher that persists router decisions and performs the
//!   delegated lookups and bookings
//! - Trait seams for the external collaborators: record store, calendar,
//!   notification channel
//! - Viewing-slot generation with best-effort conflict checks
//! - Observability: structured logging, metrics, health endpoints
//!
//! # Quick Start
//!
//! ```rust
//! use qualibot::router::{route, RouterInput, TenantProfile};
//! use uuid::Uuid;
//!
//! let tenant = TenantProfile {
//!     id: Uuid::new_v4(),
//!     bot_name: "Kezia".to_string(),
//!     company_name: "Acme Homes".to_string(),
//!     property_types: vec!["Buy".to_string(), "Rent".to_string()],
//!     whatsapp_number: None,
//! };
//!
//! // First contact: the router asks to create a lead and detects the
//! // interest from the message.
//! let input = RouterInput {
//!     message: "Hi, I'm looking to rent a flat".to_string(),
//!     phone: "+254700000001".to_string(),
//!     lead: None,
//!     tenant,
//! };
//!
//! let decision = route(&input);
//! assert!(decision.create_lead);
//! assert_eq!(decision.detected_interest.as_deref(), Some("Rent"));
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod notify;
pub mod observability;
pub mod router;
pub mod scheduling;
pub mod store;
pub mod testing;

pub use config::BotConfig;
pub use dispatch::{MessageProcessor, TurnOutcome};
pub use error::{BotError, BotResult};
pub use notify::{ConsoleNotifier, Notifier};
pub use router::{route, Action, LeadPatch, ResponseDescriptor, RouterInput, Stage, TenantProfile};
pub use scheduling::{CalendarProvider, SlotGenerator, ViewingSlot};
pub use store::{Lead, LeadStatus, RecordStore};
