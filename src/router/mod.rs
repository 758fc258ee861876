//! The conversation router
//!
//! Maps one inbound message plus a persisted lead snapshot and tenant
//! profile to a routing decision: the next stage, the lead fields to
//! persist, and the reply to send. Pure and synchronous: every call
//! receives the full state as input and returns a complete decision; the
//! caller (see [`crate::dispatch`]) owns persistence and side effects.

pub mod extract;
pub mod input;
pub mod prompts;
pub mod response;
pub mod rules;
pub mod stage;

pub use input::{LeadSnapshot, RouterInput, TenantProfile};
pub use response::{Action, AgentNotification, LeadPatch, ResponseDescriptor};
pub use rules::{route, Applies, Rule, RULES};
pub use stage::Stage;
