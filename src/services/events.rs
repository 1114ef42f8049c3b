// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event listing, creation and registration.

use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::event::STATUS_UPCOMING;
use crate::models::{Event, EventRegistration};
use crate::services::accounts::profile_names;
use crate::services::map::event_type_style;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_TITLE_LEN: usize = 200;

/// Event with the data the listing needs.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventCard {
    #[serde(flatten)]
    pub event: Event,
    pub organizer_name: Option<String>,
    pub spots_left: Option<u32>,
    pub is_full: bool,
    pub registered: bool,
    pub color: String,
    pub icon: String,
    /// DOM anchor the map scrolls to
    pub anchor: String,
}

/// Organizer input for a new event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    pub location_name: String,
    pub location_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub registration_deadline: Option<NaiveDate>,
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub entry_fee: u32,
    pub prize_pool: Option<u32>,
    pub image_url: Option<String>,
}

fn default_event_type() -> String {
    "Competition".to_string()
}

impl CreateEventRequest {
    fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if self.location_name.trim().is_empty() || self.location_address.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Location name and address are required".to_string(),
            ));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::BadRequest(
                    "Latitude must be between -90 and 90".to_string(),
                ));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::BadRequest(
                    "Longitude must be between -180 and 180".to_string(),
                ));
            }
        }
        if self.max_participants == Some(0) {
            return Err(AppError::BadRequest(
                "Maximum participants must be at least 1".to_string(),
            ));
        }
        if let Some(deadline) = self.registration_deadline {
            if deadline > self.event_date {
                return Err(AppError::BadRequest(
                    "Registration deadline must not be after the event date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct EventService {
    db: Arc<dyn Store>,
}

impl EventService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Register a user for an event.
    ///
    /// A full event is rejected before anything is written; the store then
    /// re-checks capacity and uniqueness as part of the registration write.
    pub async fn register(&self, user_id: &str, event_id: &str) -> Result<Event> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        if event.is_full() {
            tracing::warn!(user_id, event_id, "Registration rejected: event full");
            return Err(AppError::EventFull);
        }

        let registration = EventRegistration::new(user_id, event_id, Utc::now());
        match self.db.register_for_event(&registration).await {
            Ok(event) => {
                tracing::info!(
                    user_id,
                    event_id,
                    participants = event.current_participants,
                    "Registered for event"
                );
                Ok(event)
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::warn!(user_id, event_id, "Duplicate event registration");
                Err(AppError::AlreadyRegistered)
            }
            Err(StoreError::CapacityReached) => {
                tracing::warn!(user_id, event_id, "Registration rejected: filled concurrently");
                Err(AppError::EventFull)
            }
            Err(e) => {
                tracing::error!(user_id, event_id, error = %e, "Failed to register for event");
                Err(e.into())
            }
        }
    }

    /// Publish a new event. Only verified organizers may create events.
    pub async fn create(&self, user_id: &str, request: CreateEventRequest) -> Result<Event> {
        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        if !profile.verified {
            tracing::warn!(user_id, "Event creation rejected: organizer not verified");
            return Err(AppError::Forbidden(
                "Only verified users can create events.".to_string(),
            ));
        }

        request.validate()?;

        let now = Utc::now();
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            description: request.description.filter(|d| !d.trim().is_empty()),
            event_type: request.event_type,
            location_name: request.location_name.trim().to_string(),
            location_address: request.location_address.trim().to_string(),
            latitude: request.latitude,
            longitude: request.longitude,
            event_date: request.event_date,
            event_time: request.event_time.filter(|t| !t.is_empty()),
            registration_deadline: request.registration_deadline,
            max_participants: request.max_participants,
            current_participants: 0,
            entry_fee: request.entry_fee,
            prize_pool: request.prize_pool,
            image_url: request.image_url.filter(|u| !u.is_empty()),
            organizer_id: user_id.to_string(),
            status: STATUS_UPCOMING.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_event(&event).await?;
        tracing::info!(user_id, event_id = %event.id, "Event created");
        Ok(event)
    }

    /// Upcoming events from `today`, soonest first.
    pub async fn list_upcoming(&self, today: NaiveDate) -> Result<Vec<Event>> {
        Ok(self.db.list_upcoming_events(today).await?)
    }

    /// Upcoming events with organizer names and the user's registrations.
    pub async fn list_cards(&self, user_id: &str, today: NaiveDate) -> Result<Vec<EventCard>> {
        let events = self.list_upcoming(today).await?;

        let registered: HashSet<String> = self
            .db
            .list_event_registrations(user_id)
            .await?
            .into_iter()
            .map(|r| r.event_id)
            .collect();

        let organizer_ids: HashSet<String> =
            events.iter().map(|e| e.organizer_id.clone()).collect();
        let names = profile_names(&self.db, organizer_ids).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let style = event_type_style(&event.event_type);
                EventCard {
                    organizer_name: names.get(&event.organizer_id).cloned(),
                    spots_left: event.spots_left(),
                    is_full: event.is_full(),
                    registered: registered.contains(&event.id),
                    color: style.color.to_string(),
                    icon: style.icon.to_string(),
                    anchor: format!("event-{}", event.id),
                    event,
                }
            })
            .collect())
    }
}
