//! Conversation stage for a lead
//!
//! The stage is the single piece of state driving dispatch. It is persisted
//! as a snake_case string in the record store; inside the crate it is a
//! closed enum so every dispatch site is checked for exhaustiveness.

use serde::{Deserialize, Serialize};

/// Where a lead currently sits in the qualification dialogue.
///
/// Transitions move strictly forward through the sequence, with two
/// exceptions: a greeting resets to `AskedBuyOrRent`, and "cancel" moves a
/// confirmed booking to `BookingCancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for the lead to pick a property type.
    AskedBuyOrRent,
    /// Waiting for the lead's name.
    AskedName,
    /// Waiting for a budget figure.
    AskedBudget,
    /// Transitional: the dispatcher is fetching available locations.
    FetchingLocations,
    /// Waiting for a preferred location.
    AskedLocation,
    /// Transitional: the dispatcher is fetching available sizes.
    FetchingSizes,
    /// Waiting for a bedroom count (house-type interests).
    AskedSize,
    /// Waiting for a plot size (land-type interests).
    AskedLandSize,
    /// Qualification finished; property list sent, waiting for a selection.
    Completed,
    /// Property chosen; waiting for a viewing slot selection.
    AwaitingTimeSlot,
    /// Viewing booked.
    BookingConfirmed,
    /// Viewing cancelled by the lead.
    BookingCancelled,
    /// Post-viewing follow-up answered "interested".
    InterestedAfterViewing,
    /// Post-viewing follow-up answered "not interested".
    NotInterestedAfterViewing,
}

impl Stage {
    /// The string form stored in the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AskedBuyOrRent => "asked_buy_or_rent",
            Stage::AskedName => "asked_name",
            Stage::AskedBudget => "asked_budget",
            Stage::FetchingLocations => "fetching_locations",
            Stage::AskedLocation => "asked_location",
            Stage::FetchingSizes => "fetching_sizes",
            Stage::AskedSize => "asked_size",
            Stage::AskedLandSize => "asked_land_size",
            Stage::Completed => "completed",
            Stage::AwaitingTimeSlot => "awaiting_time_slot",
            Stage::BookingConfirmed => "booking_confirmed",
            Stage::BookingCancelled => "booking_cancelled",
            Stage::InterestedAfterViewing => "interested_after_viewing",
            Stage::NotInterestedAfterViewing => "not_interested_after_viewing",
        }
    }

    /// Parse the record-store string form. Unknown strings map to `None`
    /// rather than an error: a row written by a newer deployment must not
    /// wedge the conversation.
    pub fn parse(s: &str) -> Option<Self> {
        let stage = match s.trim() {
            "asked_buy_or_rent" => Stage::AskedBuyOrRent,
            "asked_name" => Stage::AskedName,
            "asked_budget" => Stage::AskedBudget,
            "fetching_locations" => Stage::FetchingLocations,
            "asked_location" => Stage::AskedLocation,
            "fetching_sizes" => Stage::FetchingSizes,
            "asked_size" => Stage::AskedSize,
            "asked_land_size" => Stage::AskedLandSize,
            "completed" => Stage::Completed,
            "awaiting_time_slot" => Stage::AwaitingTimeSlot,
            "booking_confirmed" => Stage::BookingConfirmed,
            "booking_cancelled" => Stage::BookingCancelled,
            "interested_after_viewing" => Stage::InterestedAfterViewing,
            "not_interested_after_viewing" => Stage::NotInterestedAfterViewing,
            _ => return None,
        };
        Some(stage)
    }

    /// All stages, in dialogue order. Used by the help table to guarantee
    /// every stage has a fallback prompt.
    pub fn all() -> &'static [Stage] {
        &[
            Stage::AskedBuyOrRent,
            Stage::AskedName,
            Stage::AskedBudget,
            Stage::FetchingLocations,
            Stage::AskedLocation,
            Stage::FetchingSizes,
            Stage::AskedSize,
            Stage::AskedLandSize,
            Stage::Completed,
            Stage::AwaitingTimeSlot,
            Stage::BookingConfirmed,
            Stage::BookingCancelled,
            Stage::InterestedAfterViewing,
            Stage::NotInterestedAfterViewing,
        ]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
