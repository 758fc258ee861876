//! The conversation rule table
//!
//! Dispatch is an ordered list of `(name, applicability, handler)` tuples.
//! A handler returns `Some(descriptor)` when its pattern matches and `None`
//! to pass the turn to the next rule; the first match wins. Unmatched input
//! lands on the stage help table. Each rule is a plain function, testable in
//! isolation.
//!
//! `route` is total: it never panics and never returns an error. A fault
//! inside a rule degrades to a descriptor with `Action::Error` and a generic
//! apology.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error};

use crate::router::extract;
use crate::router::input::RouterInput;
use crate::router::prompts;
use crate::router::response::{Action, AgentNotification, LeadPatch, ResponseDescriptor};
use crate::router::stage::Stage;
use crate::store::LeadStatus;

/// Which stages a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applies {
    /// Any stage (checked before the stage-specific rules).
    Any,
    /// Exactly one stage.
    At(Stage),
}

/// One row of the dispatch table.
pub struct Rule {
    pub name: &'static str,
    pub applies: Applies,
    pub apply: fn(&RouterInput) -> Option<ResponseDescriptor>,
}

/// The dispatch table, in match order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "followup_response",
        applies: Applies::Any,
        apply: followup_response,
    },
    Rule {
        name: "greeting_reset",
        applies: Applies::Any,
        apply: greeting_reset,
    },
    Rule {
        name: "choose_property_type",
        applies: Applies::At(Stage::AskedBuyOrRent),
        apply: choose_property_type,
    },
    Rule {
        name: "capture_name",
        applies: Applies::At(Stage::AskedName),
        apply: capture_name,
    },
    Rule {
        name: "capture_budget",
        applies: Applies::At(Stage::AskedBudget),
        apply: capture_budget,
    },
    Rule {
        name: "capture_location",
        applies: Applies::At(Stage::AskedLocation),
        apply: capture_location,
    },
    Rule {
        name: "capture_bedrooms",
        applies: Applies::At(Stage::AskedSize),
        apply: capture_bedrooms,
    },
    Rule {
        name: "capture_plot_size",
        applies: Applies::At(Stage::AskedLandSize),
        apply: capture_plot_size,
    },
    Rule {
        name: "select_property",
        applies: Applies::At(Stage::Completed),
        apply: select_property,
    },
    Rule {
        name: "select_slot",
        applies: Applies::At(Stage::AwaitingTimeSlot),
        apply: select_slot,
    },
    Rule {
        name: "cancel_booking",
        applies: Applies::At(Stage::BookingConfirmed),
        apply: cancel_booking,
    },
];

/// Route one inbound message to a decision.
///
/// Pure: no I/O, no internal state. Safe to call concurrently for different
/// leads; the caller persists `update_fields` before the next call.
pub fn route(input: &RouterInput) -> ResponseDescriptor {
    match catch_unwind(AssertUnwindSafe(|| dispatch(input))) {
        Ok(descriptor) => descriptor,
        Err(_) => {
            let lead_id = input.lead.as_ref().map(|l| l.id);
            error!(?lead_id, "router rule panicked; degrading to error reply");
            ResponseDescriptor::error(prompts::generic_error())
        }
    }
}

fn dispatch(input: &RouterInput) -> ResponseDescriptor {
    let lead = match &input.lead {
        None => return create_lead(input),
        Some(lead) => lead,
    };

    for rule in RULES {
        let applicable = match rule.applies {
            Applies::Any => true,
            Applies::At(stage) => stage == lead.stage,
        };
        if !applicable {
            continue;
        }
        if let Some(descriptor) = (rule.apply)(input) {
            debug!(rule = rule.name, stage = %lead.stage, action = ?descriptor.action, "rule matched");
            return descriptor;
        }
    }

    ResponseDescriptor::invalid(prompts::help_text(lead.stage, &input.tenant))
}

/// First contact: create the lead, optionally auto-detecting the interest.
fn create_lead(input: &RouterInput) -> ResponseDescriptor {
    let catalog = input.tenant.catalog();
    let detected = extract::detect_interest(input.trimmed(), &catalog);

    let mut patch = LeadPatch::default();
    let reply = match &detected {
        Some(interest) => {
            patch.stage = Some(Stage::AskedName);
            patch.interest = Some(interest.clone());
            prompts::welcome_ask_name(&input.tenant, interest)
        }
        None => {
            patch.stage = Some(Stage::AskedBuyOrRent);
            prompts::welcome_ask_type(&input.tenant)
        }
    };

    let mut descriptor = ResponseDescriptor::new(Action::Create, patch, reply);
    descriptor.create_lead = true;
    descriptor.detected_interest = detected;
    descriptor
}

/// "1"/"2" answer to the post-viewing follow-up. Only fires while the
/// awaiting-followup flag is set; other input falls through to the normal
/// stage handling.
fn followup_response(input: &RouterInput) -> Option<ResponseDescriptor> {
    let lead = input.lead.as_ref()?;
    if !lead.awaiting_followup {
        return None;
    }
    let choice = extract::followup_choice(input.trimmed())?;

    let mut patch = LeadPatch {
        awaiting_followup: Some(false),
        ..Default::default()
    };

    if choice == 1 {
        patch.status = Some(LeadStatus::HotLead);
        patch.stage = Some(Stage::InterestedAfterViewing);
        let mut descriptor = ResponseDescriptor::new(
            Action::FollowupInterested,
            patch,
            prompts::followup_interested(&input.tenant.company_name),
        );
        descriptor.agent_notification = Some(AgentNotification {
            message: prompts::agent_notification_text(
                lead.name.as_deref(),
                &input.phone,
                lead.last_viewed_property.as_deref(),
            ),
            destination: input.tenant.whatsapp_number.clone(),
            lead_name: lead.name.clone(),
            lead_phone: input.phone.clone(),
            property_name: lead.last_viewed_property.clone(),
        });
        Some(descriptor)
    } else {
        patch.status = Some(LeadStatus::NotInterested);
        patch.stage = Some(Stage::NotInterestedAfterViewing);
        Some(ResponseDescriptor::new(
            Action::FollowupNotInterested,
            patch,
            prompts::followup_not_interested(),
        ))
    }
}

/// A greeting resets the dialogue to the property-type question and touches
/// nothing else.
fn greeting_reset(input: &RouterInput) -> Option<ResponseDescriptor> {
    if !extract::is_greeting(input.trimmed()) {
        return None;
    }
    Some(ResponseDescriptor::new(
        Action::Update,
        LeadPatch::stage(Stage::AskedBuyOrRent),
        prompts::restart_ask_type(&input.tenant),
    ))
}

fn choose_property_type(input: &RouterInput) -> Option<ResponseDescriptor> {
    let catalog = input.tenant.catalog();
    let interest = extract::choose_property_type(input.trimmed(), &catalog)?;

    let patch = LeadPatch {
        interest: Some(interest.clone()),
        stage: Some(Stage::AskedName),
        ..Default::default()
    };
    let mut descriptor =
        ResponseDescriptor::new(Action::Update, patch, prompts::ask_name(&interest));
    descriptor.detected_interest = Some(interest);
    Some(descriptor)
}

fn capture_name(input: &RouterInput) -> Option<ResponseDescriptor> {
    let name = extract::extract_name(input.trimmed())?;
    let patch = LeadPatch {
        name: Some(name.clone()),
        stage: Some(Stage::AskedBudget),
        ..Default::default()
    };
    Some(ResponseDescriptor::new(
        Action::Update,
        patch,
        prompts::ask_budget(&name),
    ))
}

fn capture_budget(input: &RouterInput) -> Option<ResponseDescriptor> {
    let budget = extract::parse_budget(input.trimmed())?;
    let patch = LeadPatch {
        budget: Some(budget),
        stage: Some(Stage::FetchingLocations),
        ..Default::default()
    };
    Some(ResponseDescriptor::new(
        Action::FetchLocations,
        patch,
        prompts::budget_captured(),
    ))
}

fn capture_location(input: &RouterInput) -> Option<ResponseDescriptor> {
    let location = extract::extract_location(input.trimmed())?;
    let patch = LeadPatch {
        location: Some(location.clone()),
        stage: Some(Stage::FetchingSizes),
        ..Default::default()
    };
    let mut descriptor = ResponseDescriptor::new(
        Action::FetchSizes,
        patch,
        prompts::location_captured(&location),
    );
    descriptor.location = Some(location);
    Some(descriptor)
}

fn capture_bedrooms(input: &RouterInput) -> Option<ResponseDescriptor> {
    let bedrooms = extract::extract_bedrooms(input.trimmed())?;
    if !(1..=20).contains(&bedrooms) {
        return None;
    }
    let patch = LeadPatch {
        size: Some(bedrooms.to_string()),
        stage: Some(Stage::Completed),
        ..Default::default()
    };
    let mut descriptor = ResponseDescriptor::new(Action::Update, patch, prompts::size_captured());
    descriptor.search_properties = true;
    descriptor.bedrooms = Some(bedrooms as u8);
    Some(descriptor)
}

fn capture_plot_size(input: &RouterInput) -> Option<ResponseDescriptor> {
    let plot = extract::extract_plot_size(input.trimmed())?;
    let patch = LeadPatch {
        size: Some(plot.clone()),
        stage: Some(Stage::Completed),
        ..Default::default()
    };
    let mut descriptor = ResponseDescriptor::new(Action::Update, patch, prompts::size_captured());
    descriptor.search_properties = true;
    descriptor.plot_size = Some(plot);
    Some(descriptor)
}

fn select_property(input: &RouterInput) -> Option<ResponseDescriptor> {
    let number = extract::extract_property_selection(input.trimmed())?;
    let mut descriptor = ResponseDescriptor::new(
        Action::Booking,
        LeadPatch::stage(Stage::AwaitingTimeSlot),
        prompts::property_selected(),
    );
    descriptor.property_number = Some(number);
    Some(descriptor)
}

fn select_slot(input: &RouterInput) -> Option<ResponseDescriptor> {
    let number = extract::extract_slot_selection(input.trimmed())?;
    let mut descriptor = ResponseDescriptor::new(
        Action::CreateBooking,
        LeadPatch::stage(Stage::BookingConfirmed),
        // the dispatcher replaces this with the slot confirmation
        "Locking in your viewing...",
    );
    descriptor.slot_number = Some(number);
    descriptor.booking_request = true;
    Some(descriptor)
}

fn cancel_booking(input: &RouterInput) -> Option<ResponseDescriptor> {
    if !extract::is_cancel(input.trimmed()) {
        return None;
    }
    let patch = LeadPatch {
        stage: Some(Stage::BookingCancelled),
        status: Some(LeadStatus::Cancelled),
        ..Default::default()
    };
    Some(ResponseDescriptor::new(
        Action::CancelBooking,
        patch,
        prompts::booking_cancelled(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::input::{LeadSnapshot, TenantProfile};
    use uuid::Uuid;

    fn tenant() -> TenantProfile {
        TenantProfile {
            id: Uuid::new_v4(),
            bot_name: "Kezia".to_string(),
            company_name: "Acme Homes".to_string(),
            property_types: vec!["Buy".to_string(), "Rent".to_string(), "Land".to_string()],
            whatsapp_number: Some("+254711000000".to_string()),
        }
    }

    fn input_at(stage: Stage, message: &str) -> RouterInput {
        RouterInput {
            message: message.to_string(),
            phone: "+254700000001".to_string(),
            lead: Some(LeadSnapshot::at_stage(Uuid::new_v4(), stage)),
            tenant: tenant(),
        }
    }

    #[test]
    fn test_first_contact_without_interest() {
        let input = RouterInput {
            message: "hello?".to_string(),
            phone: "+254700000001".to_string(),
            lead: None,
            tenant: tenant(),
        };
        let desc = route(&input);
        assert_eq!(desc.action, Action::Create);
        assert!(desc.create_lead);
        assert_eq!(desc.update_fields.stage, Some(Stage::AskedBuyOrRent));
        assert!(desc.detected_interest.is_none());
        assert!(desc.reply.contains("1. Buy"));
    }

    #[test]
    fn test_first_contact_detects_interest() {
        let input = RouterInput {
            message: "Hi, I want to rent a 2 bedroom".to_string(),
            phone: "+254700000001".to_string(),
            lead: None,
            tenant: tenant(),
        };
        let desc = route(&input);
        assert_eq!(desc.action, Action::Create);
        assert_eq!(desc.detected_interest.as_deref(), Some("Rent"));
        assert_eq!(desc.update_fields.stage, Some(Stage::AskedName));
        assert_eq!(desc.update_fields.interest.as_deref(), Some("Rent"));
    }

    #[test]
    fn test_greeting_resets_from_any_stage() {
        for stage in Stage::all() {
            let desc = route(&input_at(*stage, "hi"));
            assert_eq!(desc.action, Action::Update, "stage {stage}");
            assert_eq!(desc.update_fields.stage, Some(Stage::AskedBuyOrRent));
            // stage reset only, nothing else touched
            assert!(desc.update_fields.name.is_none());
            assert!(desc.update_fields.interest.is_none());
            assert!(desc.update_fields.budget.is_none());
            assert!(desc.update_fields.status.is_none());
        }
    }

    #[test]
    fn test_followup_interested() {
        let mut lead = LeadSnapshot::at_stage(Uuid::new_v4(), Stage::BookingConfirmed);
        lead.awaiting_followup = true;
        lead.name = Some("Jane".to_string());
        lead.last_viewed_property = Some("Sunset Villa".to_string());
        let input = RouterInput {
            message: "1".to_string(),
            phone: "+254700000001".to_string(),
            lead: Some(lead),
            tenant: tenant(),
        };

        let desc = route(&input);
        assert_eq!(desc.action, Action::FollowupInterested);
        assert_eq!(desc.update_fields.status, Some(LeadStatus::HotLead));
        assert_eq!(desc.update_fields.stage, Some(Stage::InterestedAfterViewing));
        assert_eq!(desc.update_fields.awaiting_followup, Some(false));

        let note = desc.agent_notification.expect("notification expected");
        assert!(!note.message.is_empty());
        assert!(note.message.contains("Sunset Villa"));
        assert_eq!(note.destination.as_deref(), Some("+254711000000"));
        assert_eq!(note.lead_name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_followup_not_interested() {
        let mut lead = LeadSnapshot::at_stage(Uuid::new_v4(), Stage::BookingConfirmed);
        lead.awaiting_followup = true;
        let input = RouterInput {
            message: "2".to_string(),
            phone: "+254700000001".to_string(),
            lead: Some(lead),
            tenant: tenant(),
        };

        let desc = route(&input);
        assert_eq!(desc.action, Action::FollowupNotInterested);
        assert_eq!(desc.update_fields.status, Some(LeadStatus::NotInterested));
        assert_eq!(
            desc.update_fields.stage,
            Some(Stage::NotInterestedAfterViewing)
        );
        assert!(desc.agent_notification.is_none());
    }

    #[test]
    fn test_followup_other_input_falls_through() {
        let mut lead = LeadSnapshot::at_stage(Uuid::new_v4(), Stage::AskedBudget);
        lead.awaiting_followup = true;
        let input = RouterInput {
            message: "500K".to_string(),
            phone: "+254700000001".to_string(),
            lead: Some(lead),
            tenant: tenant(),
        };

        // not "1"/"2": the budget rule should still fire
        let desc = route(&input);
        assert_eq!(desc.action, Action::FetchLocations);
        assert_eq!(desc.update_fields.budget, Some(500_000));
    }

    #[test]
    fn test_choose_property_type_number_and_name() {
        let desc = route(&input_at(Stage::AskedBuyOrRent, "2"));
        assert_eq!(desc.action, Action::Update);
        assert_eq!(desc.update_fields.interest.as_deref(), Some("Rent"));
        assert_eq!(desc.update_fields.stage, Some(Stage::AskedName));

        let desc = route(&input_at(Stage::AskedBuyOrRent, "land"));
        assert_eq!(desc.update_fields.interest.as_deref(), Some("Land"));
    }

    #[test]
    fn test_choose_property_type_invalid_reprompts_options() {
        let desc = route(&input_at(Stage::AskedBuyOrRent, "???"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.update_fields.is_empty());
        assert!(desc.reply.contains("1. Buy"));
    }

    #[test]
    fn test_capture_name_normalizes() {
        let desc = route(&input_at(Stage::AskedName, "john smith"));
        assert_eq!(desc.action, Action::Update);
        assert_eq!(desc.update_fields.name.as_deref(), Some("John Smith"));
        assert_eq!(desc.update_fields.stage, Some(Stage::AskedBudget));
    }

    #[test]
    fn test_capture_budget_advances_to_fetching() {
        let desc = route(&input_at(Stage::AskedBudget, "5M"));
        assert_eq!(desc.action, Action::FetchLocations);
        assert_eq!(desc.update_fields.budget, Some(5_000_000));
        assert_eq!(desc.update_fields.stage, Some(Stage::FetchingLocations));
    }

    #[test]
    fn test_capture_budget_invalid() {
        let desc = route(&input_at(Stage::AskedBudget, "abc"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.update_fields.is_empty());
        assert!(desc.reply.contains("500K"));
    }

    #[test]
    fn test_capture_location() {
        let desc = route(&input_at(Stage::AskedLocation, "in westlands"));
        assert_eq!(desc.action, Action::FetchSizes);
        assert_eq!(desc.update_fields.location.as_deref(), Some("Westlands"));
        assert_eq!(desc.update_fields.stage, Some(Stage::FetchingSizes));
    }

    #[test]
    fn test_capture_bedrooms_in_range() {
        let desc = route(&input_at(Stage::AskedSize, "3 bed"));
        assert_eq!(desc.action, Action::Update);
        assert_eq!(desc.bedrooms, Some(3));
        assert_eq!(desc.update_fields.size.as_deref(), Some("3"));
        assert_eq!(desc.update_fields.stage, Some(Stage::Completed));
        assert!(desc.search_properties);
    }

    #[test]
    fn test_capture_bedrooms_out_of_range() {
        let desc = route(&input_at(Stage::AskedSize, "25"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.update_fields.is_empty());
    }

    #[test]
    fn test_capture_plot_size() {
        let desc = route(&input_at(Stage::AskedLandSize, "1/4 Acre"));
        assert_eq!(desc.action, Action::Update);
        assert_eq!(desc.plot_size.as_deref(), Some("1/4 Acre"));
        assert_eq!(desc.update_fields.size.as_deref(), Some("1/4 Acre"));
        assert!(desc.search_properties);

        let desc = route(&input_at(Stage::AskedLandSize, "no"));
        assert_eq!(desc.action, Action::Invalid);
    }

    #[test]
    fn test_select_property() {
        let desc = route(&input_at(Stage::Completed, "property 2"));
        assert_eq!(desc.action, Action::Booking);
        assert_eq!(desc.property_number, Some(2));
        assert_eq!(desc.update_fields.stage, Some(Stage::AwaitingTimeSlot));
    }

    #[test]
    fn test_select_slot() {
        let desc = route(&input_at(Stage::AwaitingTimeSlot, "slot 1"));
        assert_eq!(desc.action, Action::CreateBooking);
        assert_eq!(desc.slot_number, Some(1));
        assert!(desc.booking_request);
        assert_eq!(desc.update_fields.stage, Some(Stage::BookingConfirmed));
    }

    #[test]
    fn test_cancel_confirmed_booking() {
        let desc = route(&input_at(Stage::BookingConfirmed, "please cancel it"));
        assert_eq!(desc.action, Action::CancelBooking);
        assert_eq!(desc.update_fields.stage, Some(Stage::BookingCancelled));
        assert_eq!(desc.update_fields.status, Some(LeadStatus::Cancelled));
    }

    #[test]
    fn test_non_cancel_at_confirmed_is_invalid_noop() {
        let desc = route(&input_at(Stage::BookingConfirmed, "thanks!"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.update_fields.is_empty());
    }

    #[test]
    fn test_unmatched_input_gets_stage_help() {
        let desc = route(&input_at(Stage::AskedBudget, "not sure yet"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.update_fields.is_empty());

        let desc = route(&input_at(Stage::BookingCancelled, "anything"));
        assert_eq!(desc.action, Action::Invalid);
        assert!(desc.reply.contains("HI"));
    }

    #[test]
    fn test_every_stage_rule_is_in_table() {
        // every stage that accepts input has exactly one stage-specific rule
        let staged: Vec<Stage> = RULES
            .iter()
            .filter_map(|r| match r.applies {
                Applies::At(stage) => Some(stage),
                Applies::Any => None,
            })
            .collect();
        for stage in [
            Stage::AskedBuyOrRent,
            Stage::AskedName,
            Stage::AskedBudget,
            Stage::AskedLocation,
            Stage::AskedSize,
            Stage::AskedLandSize,
            Stage::Completed,
            Stage::AwaitingTimeSlot,
            Stage::BookingConfirmed,
        ] {
            assert_eq!(
                staged.iter().filter(|s| **s == stage).count(),
                1,
                "stage {stage} should have one rule"
            );
        }
    }
}
