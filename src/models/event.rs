// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness events and registrations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Status of events that are listed and open for registration.
pub const STATUS_UPCOMING: &str = "upcoming";
/// Status given to new registrations.
pub const REGISTRATION_CONFIRMED: &str = "registered";

/// Organizer-created, location- and date-bound fitness gathering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Competition, Workshop, Meetup, Challenge, ...
    pub event_type: String,
    pub location_name: String,
    pub location_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: NaiveDate,
    /// Free-form start time ("18:30")
    pub event_time: Option<String>,
    pub registration_deadline: Option<NaiveDate>,
    /// Capacity; `None` means unlimited
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub current_participants: u32,
    #[serde(default)]
    pub entry_fee: u32,
    pub prize_pool: Option<u32>,
    pub image_url: Option<String>,
    pub organizer_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event has no free places left.
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.current_participants >= max)
    }

    /// Places still available, `None` when unlimited.
    pub fn spots_left(&self) -> Option<u32> {
        self.max_participants
            .map(|max| max.saturating_sub(self.current_participants))
    }
}

/// A user's registration for an event.
///
/// At most one record exists per (user, event).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventRegistration {
    pub user_id: String,
    pub event_id: String,
    pub status: String,
    pub registration_date: DateTime<Utc>,
}

impl EventRegistration {
    pub fn new(user_id: &str, event_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            status: REGISTRATION_CONFIRMED.to_string(),
            registration_date: now,
        }
    }

    pub fn doc_id(&self) -> String {
        super::challenge::membership_doc_id(&self.user_id, &self.event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(max: Option<u32>, current: u32) -> Event {
        let now = Utc::now();
        Event {
            id: "e1".to_string(),
            title: "Sunrise 5K".to_string(),
            description: None,
            event_type: "Competition".to_string(),
            location_name: "Cubbon Park".to_string(),
            location_address: "Bengaluru".to_string(),
            latitude: None,
            longitude: None,
            event_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            event_time: None,
            registration_deadline: None,
            max_participants: max,
            current_participants: current,
            entry_fee: 0,
            prize_pool: None,
            image_url: None,
            organizer_id: "org".to_string(),
            status: STATUS_UPCOMING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_full_at_capacity() {
        assert!(event(Some(10), 10).is_full());
        assert!(!event(Some(10), 9).is_full());
        assert_eq!(event(Some(10), 9).spots_left(), Some(1));
    }

    #[test]
    fn test_unlimited_event_never_full() {
        let e = event(None, 10_000);
        assert!(!e.is_full());
        assert_eq!(e.spots_left(), None);
    }
}
