// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog and per-user join records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Status given to a freshly joined challenge.
pub const STATUS_IN_PROGRESS: &str = "In Progress";

/// Catalog fitness goal with a duration and a FitCoin reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub goal: String,
    pub duration_days: u32,
    pub fitcoins_reward: u64,
    pub created_at: DateTime<Utc>,
}

/// A user's membership in a challenge.
///
/// At most one record exists per (user, challenge).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserChallenge {
    pub user_id: String,
    pub challenge_id: String,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub status: String,
    pub joined_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserChallenge {
    /// Fresh join record: no progress, in progress.
    pub fn joined(user_id: &str, challenge_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            challenge_id: challenge_id.to_string(),
            progress: 0,
            status: STATUS_IN_PROGRESS.to_string(),
            joined_at: now,
            completed_at: None,
        }
    }

    /// Document ID enforcing one record per (user, challenge).
    pub fn doc_id(&self) -> String {
        membership_doc_id(&self.user_id, &self.challenge_id)
    }
}

/// A join record together with its catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserChallengeWithChallenge {
    #[serde(flatten)]
    pub membership: UserChallenge,
    pub challenge: Option<Challenge>,
}

/// Deterministic `{user}_{entity}` document ID for membership-style records.
pub fn membership_doc_id(user_id: &str, entity_id: &str) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        urlencoding::encode(entity_id)
    )
}
