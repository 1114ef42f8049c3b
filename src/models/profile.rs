// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and account credential models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Fitness goals offered during onboarding.
pub const FITNESS_GOALS: [&str; 5] = [
    "Weight Loss",
    "Muscle Gain",
    "Stay Active",
    "Improve Flexibility",
    "Build Endurance",
];

/// User profile stored in the `profiles` collection (keyed by user ID).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// User ID (also used as document ID)
    pub id: String,
    pub email: String,
    pub name: String,
    pub age: Option<u32>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in centimeters
    pub height: Option<f64>,
    pub fitness_goal: Option<String>,
    pub profile_picture: Option<String>,
    /// FitCoin balance
    #[serde(default)]
    pub fitcoin_balance: u64,
    /// Consecutive credited workouts
    #[serde(default)]
    pub workout_streak: u32,
    /// Calendar date of the last credited workout
    #[serde(default)]
    pub last_workout_date: Option<NaiveDate>,
    /// Verified organizers may create events
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// New, unverified profile with an empty wallet.
    pub fn new(id: String, email: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email,
            name,
            age: None,
            weight: None,
            height: None,
            fitness_goal: None,
            profile_picture: None,
            fitcoin_balance: 0,
            workout_streak: 0,
            last_workout_date: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether all onboarding fields have been filled in.
    pub fn is_onboarded(&self) -> bool {
        self.age.is_some()
            && self.weight.is_some()
            && self.height.is_some()
            && self.fitness_goal.is_some()
    }

    /// Apply onboarding answers.
    pub fn apply_onboarding(&mut self, update: &OnboardingUpdate, now: DateTime<Utc>) {
        self.age = Some(update.age);
        self.weight = Some(update.weight);
        self.height = Some(update.height);
        self.fitness_goal = Some(update.fitness_goal.clone());
        self.updated_at = now;
    }
}

/// Onboarding answers (age, body measurements, goal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingUpdate {
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub fitness_goal: String,
}

/// Login credentials stored in the `credentials` collection (keyed by email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Normalized (lowercase, trimmed) email
    pub email: String,
    pub user_id: String,
    /// PBKDF2 salt (base64)
    pub salt: String,
    /// PBKDF2-HMAC-SHA256 hash (base64)
    pub password_hash: String,
    /// PBKDF2 iteration count used for `password_hash`
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    pub created_at: DateTime<Utc>,
}

fn default_iterations() -> u32 {
    crate::config::DEFAULT_PBKDF2_ITERATIONS
}
