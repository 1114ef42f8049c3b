// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Append-only user activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Activity type recorded by the workout timer.
pub const ACTIVITY_WORKOUT: &str = "Workout";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityLogEntry {
    pub id: String,
    pub user_id: String,
    pub activity_type: String,
    pub details: Option<String>,
    pub calories: u32,
    pub created_at: DateTime<Utc>,
}
