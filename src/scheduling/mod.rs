//! Viewing-slot generation and the calendar seam
//!
//! Slots are generated by linear iteration: each day in the configured
//! window, each `slot_minutes` step between the opening and closing hour,
//! in the tenant-local fixed UTC offset. The external calendar is reached
//! through [`CalendarProvider`].
//!
//! Conflict handling is best-effort check-then-act: the calendar and the
//! booking table are consulted before an event is created, and the window
//! between check and create is accepted. A lost race surfaces as a
//! "slot was just taken" reply, never as a double booking going unnoticed
//! silently on our side alone.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SchedulingConfig;

/// One bookable viewing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ViewingSlot {
    /// Human label in the given local offset, e.g. "Tue 04 Aug, 10:00".
    pub fn label(&self, offset: FixedOffset) -> String {
        self.start
            .with_timezone(&offset)
            .format("%a %d %b, %H:%M")
            .to_string()
    }
}

/// Calendar failures.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar unavailable: {0}")]
    Unavailable(String),
    #[error("calendar backend error: {0}")]
    Backend(String),
}

/// Event payload for a viewing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub property_name: String,
    pub lead_phone: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The external calendar service, as seen by the dispatcher.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Is the window free of events for this property? Best-effort: the
    /// answer may be stale by the time an event is created.
    async fn is_window_free(
        &self,
        property_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CalendarError>;

    /// Create the event and return its provider-side id.
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError>;

    /// Delete an event. Cancellation treats failure as non-fatal.
    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}

/// Generates viewing slots from the scheduling configuration.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    config: SchedulingConfig,
    offset: FixedOffset,
}

impl SlotGenerator {
    pub fn new(config: SchedulingConfig) -> Self {
        // the config validator bounds the offset to a representable value
        let offset = FixedOffset::east_opt(config.utc_offset_hours as i32 * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self { config, offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// All slots in the window from `now`, oldest first. Slots that start
    /// at or before `now` are skipped; weekends are skipped when
    /// configured.
    pub fn generate(&self, now: DateTime<Utc>) -> Vec<ViewingSlot> {
        let local_now = now.with_timezone(&self.offset);
        let open_minutes = u32::from(self.config.day_start_hour) * 60;
        let close_minutes = u32::from(self.config.day_end_hour) * 60;

        let mut slots = Vec::new();
        for day in 0..self.config.days_ahead {
            let date = local_now.date_naive() + Duration::days(i64::from(day));
            if self.config.skip_weekends
                && matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            {
                continue;
            }

            let mut minute = open_minutes;
            while minute + self.config.slot_minutes <= close_minutes {
                let start_naive = match date.and_hms_opt(minute / 60, minute % 60, 0) {
                    Some(dt) => dt,
                    None => break,
                };
                let start_local = match self.offset.from_local_datetime(&start_naive).single() {
                    Some(dt) => dt,
                    None => break,
                };
                if start_local > local_now {
                    let start = start_local.with_timezone(&Utc);
                    slots.push(ViewingSlot {
                        start,
                        end: start + Duration::minutes(i64::from(self.config.slot_minutes)),
                    });
                }
                minute += self.config.slot_minutes;
            }
        }
        slots
    }

    /// Slots the calendar reports free for this property. The answer is a
    /// snapshot, not a hold.
    pub async fn available_slots(
        &self,
        calendar: &dyn CalendarProvider,
        property_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ViewingSlot>, CalendarError> {
        let mut available = Vec::new();
        for slot in self.generate(now) {
            if calendar
                .is_window_free(property_name, slot.start, slot.end)
                .await?
            {
                available.push(slot);
            }
        }
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockCalendar;
    use chrono::Timelike;

    fn config() -> SchedulingConfig {
        SchedulingConfig {
            days_ahead: 3,
            day_start_hour: 9,
            day_end_hour: 17,
            slot_minutes: 60,
            utc_offset_hours: 3,
            skip_weekends: true,
        }
    }

    // Monday 2026-08-03, 06:00 UTC = 09:00 local (+03:00)
    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, 6, 0, 0).single().unwrap()
    }

    #[test]
    fn test_generates_full_window_for_future_days() {
        let generator = SlotGenerator::new(config());
        let slots = generator.generate(monday_morning());

        // Mon: 7 slots left (10..16 local, 09:00 excluded as not strictly
        // future), Tue + Wed: 8 each
        assert_eq!(slots.len(), 7 + 8 + 8);
        assert!(slots.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_slots_respect_local_hours() {
        let generator = SlotGenerator::new(config());
        let offset = generator.offset();
        for slot in generator.generate(monday_morning()) {
            let local = slot.start.with_timezone(&offset);
            assert!(local.hour() >= 9 && local.hour() < 17, "slot at {local}");
            let local_end = slot.end.with_timezone(&offset);
            assert!(local_end.hour() <= 17);
        }
    }

    #[test]
    fn test_skips_weekends() {
        let generator = SlotGenerator::new(SchedulingConfig {
            days_ahead: 7,
            ..config()
        });
        let offset = generator.offset();
        for slot in generator.generate(monday_morning()) {
            let weekday = slot.start.with_timezone(&offset).weekday();
            assert!(
                !matches!(weekday, Weekday::Sat | Weekday::Sun),
                "weekend slot at {}",
                slot.start
            );
        }
    }

    #[test]
    fn test_includes_weekends_when_configured() {
        let generator = SlotGenerator::new(SchedulingConfig {
            days_ahead: 7,
            skip_weekends: false,
            ..config()
        });
        let offset = generator.offset();
        let weekend = generator
            .generate(monday_morning())
            .iter()
            .filter(|s| {
                matches!(
                    s.start.with_timezone(&offset).weekday(),
                    Weekday::Sat | Weekday::Sun
                )
            })
            .count();
        assert_eq!(weekend, 2 * 8);
    }

    #[test]
    fn test_past_slots_excluded() {
        let generator = SlotGenerator::new(config());
        // 16:30 local on Monday: only the day's final slot would start at
        // 16:00, already past
        let late = Utc.with_ymd_and_hms(2026, 8, 3, 13, 30, 0).single().unwrap();
        let slots = generator.generate(late);
        assert!(slots.iter().all(|s| s.start > late));
        // Mon contributes nothing, Tue + Wed full
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn test_label_renders_local_time() {
        let generator = SlotGenerator::new(config());
        let slot = generator.generate(monday_morning())[0];
        let label = slot.label(generator.offset());
        assert_eq!(label, "Mon 03 Aug, 10:00");
    }

    #[tokio::test]
    async fn test_available_slots_filters_busy_windows() {
        let generator = SlotGenerator::new(config());
        let all = generator.generate(monday_morning());
        let calendar = MockCalendar::new();
        calendar.mark_busy(all[0].start, all[0].end).await;

        let available = generator
            .available_slots(&calendar, "Sunset Villa", monday_morning())
            .await
            .unwrap();
        assert_eq!(available.len(), all.len() - 1);
        assert!(!available.contains(&all[0]));
    }
}
