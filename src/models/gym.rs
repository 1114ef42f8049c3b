// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Gym {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// "$", "$$" or "$$$"
    pub price_range: Option<String>,
    /// 0.0 - 5.0
    #[serde(default)]
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}
