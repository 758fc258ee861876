//! User-facing reply text
//!
//! All conversational copy lives here so the rule table stays about control
//! flow. Replies interpolate the tenant's bot and company names; nothing
//! else about them is dynamic.

use crate::router::input::TenantProfile;
use crate::router::stage::Stage;

/// Numbered list of the tenant's property types, e.g. "1. Buy\n2. Rent".
pub fn type_options(catalog: &[String]) -> String {
    catalog
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First-contact greeting plus the property-type question.
pub fn welcome_ask_type(tenant: &TenantProfile) -> String {
    format!(
        "Hello! I'm {}, the virtual assistant for {}. I can help you find a \
         property and book a viewing.\n\nWhat are you interested in? Reply \
         with a number or name:\n{}",
        tenant.bot_name,
        tenant.company_name,
        type_options(&tenant.catalog())
    )
}

/// First-contact greeting when the interest was detected from the message.
pub fn welcome_ask_name(tenant: &TenantProfile, interest: &str) -> String {
    format!(
        "Hello! I'm {}, the virtual assistant for {}. Great, you're looking \
         at {} options.\n\nTo get started, what's your name?",
        tenant.bot_name, tenant.company_name, interest
    )
}

/// Re-ask the property-type question after a greeting reset.
pub fn restart_ask_type(tenant: &TenantProfile) -> String {
    format!(
        "Welcome back! What are you interested in? Reply with a number or \
         name:\n{}",
        type_options(&tenant.catalog())
    )
}

pub fn ask_name(interest: &str) -> String {
    format!("{interest} it is. What's your name?")
}

pub fn ask_budget(name: &str) -> String {
    format!("Nice to meet you, {name}! What's your budget?")
}

pub fn budget_captured() -> String {
    "Got it. Let me check which locations we cover...".to_string()
}

pub fn location_captured(location: &str) -> String {
    format!("{location}, good choice. One moment while I check what's available...")
}

pub fn size_captured() -> String {
    "Perfect, searching for matching properties...".to_string()
}

pub fn property_selected() -> String {
    "Good pick! Here are the available viewing times. Reply with a slot \
     number to book."
        .to_string()
}

pub fn booking_confirmed(slot_label: &str) -> String {
    format!(
        "Your viewing is booked for {slot_label}. We'll send a reminder \
         before the visit. Reply CANCEL if you need to call it off."
    )
}

pub fn booking_cancelled() -> String {
    "Your viewing has been cancelled. Say HI any time to start a new search.".to_string()
}

pub fn followup_interested(company: &str) -> String {
    format!(
        "Wonderful! An agent from {company} will contact you shortly to \
         discuss the next steps."
    )
}

pub fn followup_not_interested() -> String {
    "No problem, thanks for letting us know. Say HI any time to look at \
     other options."
        .to_string()
}

/// Agent-side notification for a hot lead.
pub fn agent_notification_text(
    lead_name: Option<&str>,
    lead_phone: &str,
    property_name: Option<&str>,
) -> String {
    format!(
        "Hot lead: {} ({}) is interested after viewing {}. Please follow up.",
        lead_name.unwrap_or("Unknown"),
        lead_phone,
        property_name.unwrap_or("a property"),
    )
}

/// Generic apology used at the router's error boundary.
pub fn generic_error() -> String {
    "Sorry, something went wrong on our side. Please try again in a moment.".to_string()
}

/// Stage-specific help shown when input fails that stage's validation.
pub fn help_text(stage: Stage, tenant: &TenantProfile) -> String {
    match stage {
        Stage::AskedBuyOrRent => format!(
            "Sorry, I didn't catch that. Reply with a number or name:\n{}",
            type_options(&tenant.catalog())
        ),
        Stage::AskedName => {
            "I didn't get your name. You can reply like \"Jane\" or \"my name is Jane\"."
                .to_string()
        }
        Stage::AskedBudget => "Please send your budget as a number, e.g. 40000, 500K or 1.2M."
            .to_string(),
        Stage::FetchingLocations | Stage::AskedLocation => {
            "Which area are you interested in? e.g. \"Westlands\" or \"in Karen\".".to_string()
        }
        Stage::FetchingSizes | Stage::AskedSize => {
            "How many bedrooms do you need? Reply with a number from 1 to 20, e.g. \"3 bed\"."
                .to_string()
        }
        Stage::AskedLandSize => {
            "What plot size are you after? e.g. \"50x100\" or \"1/4 Acre\".".to_string()
        }
        Stage::Completed => {
            "Reply with the property number you'd like to view, e.g. \"property 2\" or just \"2\"."
                .to_string()
        }
        Stage::AwaitingTimeSlot => {
            "Reply with the slot number that works for you, e.g. \"slot 1\" or just \"1\"."
                .to_string()
        }
        Stage::BookingConfirmed => {
            "Your viewing is confirmed. Reply CANCEL to cancel it, or HI to start a new search."
                .to_string()
        }
        Stage::BookingCancelled
        | Stage::InterestedAfterViewing
        | Stage::NotInterestedAfterViewing => default_fallback(),
    }
}

/// Fallback for conversations with nowhere to go.
pub fn default_fallback() -> String {
    "I'm not sure how to help with that. Reply HI to start a new property search.".to_string()
}
