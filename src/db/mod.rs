// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer.
//!
//! [`Store`] is the typed table interface the service layer talks to.
//! Writes that must respect a precondition (uniqueness, capacity, balance,
//! once-per-day credit) are single store operations so the check and the
//! mutation cannot be separated by a concurrent writer.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::models::{
    ActivityLogEntry, Challenge, Credentials, Event, EventRegistration, Gym, OnboardingUpdate,
    Profile, Reel, Reward, RewardRedemption, UserChallenge, UserChallengeWithChallenge,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Collection names as constants.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const CREDENTIALS: &str = "credentials";
    pub const CHALLENGES: &str = "challenges";
    pub const USER_CHALLENGES: &str = "user_challenges";
    pub const EVENTS: &str = "events";
    pub const EVENT_REGISTRATIONS: &str = "event_registrations";
    pub const REWARDS: &str = "reward_marketplace";
    pub const REWARD_REDEMPTIONS: &str = "reward_redemptions";
    pub const ACTIVITY_LOG: &str = "user_activity_log";
    pub const GYMS: &str = "gyms";
    pub const REELS: &str = "social_reels";
}

/// Named failure kinds returned by the store.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// A uniqueness precondition failed (duplicate join, registration, email).
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Insufficient balance: have {balance}, need {cost}")]
    InsufficientBalance { balance: u64, cost: u64 },

    #[error("Event is at capacity")]
    CapacityReached,

    #[error("Workout already credited on {0}")]
    AlreadyCredited(NaiveDate),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Profile mutation applied when a workout is saved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutCredit {
    /// FitCoins to add to the balance
    pub coins: u64,
    /// Date recorded as `last_workout_date`
    pub date: NaiveDate,
    /// Reject when `last_workout_date` already equals `date`
    pub once_per_day: bool,
}

impl WorkoutCredit {
    /// Apply the credit to a profile, enforcing the once-per-day guard.
    ///
    /// Shared by every [`Store`] implementation so the rule is identical.
    pub fn apply(&self, profile: &mut Profile) -> StoreResult<()> {
        if self.once_per_day && profile.last_workout_date == Some(self.date) {
            return Err(StoreError::AlreadyCredited(self.date));
        }
        profile.fitcoin_balance = profile.fitcoin_balance.saturating_add(self.coins);
        profile.workout_streak = profile.workout_streak.saturating_add(1);
        profile.last_workout_date = Some(self.date);
        Ok(())
    }
}

/// Debit a profile balance iff it covers `cost`.
pub(crate) fn debit_balance(profile: &mut Profile, cost: u64) -> StoreResult<u64> {
    if profile.fitcoin_balance < cost {
        return Err(StoreError::InsufficientBalance {
            balance: profile.fitcoin_balance,
            cost,
        });
    }
    profile.fitcoin_balance -= cost;
    Ok(profile.fitcoin_balance)
}

/// Take one place in an event iff capacity allows.
pub(crate) fn take_event_spot(event: &mut Event) -> StoreResult<()> {
    if event.is_full() {
        return Err(StoreError::CapacityReached);
    }
    event.current_participants = event.current_participants.saturating_add(1);
    Ok(())
}

/// Typed access to all application tables.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Accounts & Profiles ─────────────────────────────────────

    /// Create credentials and profile together. Duplicate email →
    /// [`StoreError::AlreadyExists`].
    async fn create_account(&self, credentials: &Credentials, profile: &Profile)
        -> StoreResult<()>;

    async fn get_credentials(&self, email: &str) -> StoreResult<Option<Credentials>>;

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    /// Store onboarding answers, returning the updated profile.
    async fn update_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> StoreResult<Profile>;

    /// Mark a profile as a verified event organizer.
    async fn set_verified(&self, user_id: &str, verified: bool) -> StoreResult<()>;

    // ─── Challenges ──────────────────────────────────────────────

    /// All challenges, newest first.
    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>>;

    async fn get_challenge(&self, challenge_id: &str) -> StoreResult<Option<Challenge>>;

    async fn put_challenge(&self, challenge: &Challenge) -> StoreResult<()>;

    /// Insert a join record. Duplicate (user, challenge) →
    /// [`StoreError::AlreadyExists`].
    async fn insert_user_challenge(&self, membership: &UserChallenge) -> StoreResult<()>;

    /// A user's join records with their catalog entries, newest first.
    async fn list_user_challenges(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<UserChallengeWithChallenge>>;

    // ─── Events ──────────────────────────────────────────────────

    /// Upcoming events on or after `from`, soonest first.
    async fn list_upcoming_events(&self, from: NaiveDate) -> StoreResult<Vec<Event>>;

    async fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>>;

    async fn insert_event(&self, event: &Event) -> StoreResult<()>;

    /// Register for an event and take a place in one step.
    ///
    /// Fails with `NotFound`, `AlreadyExists` or `CapacityReached`; on
    /// success returns the event with its updated participant count.
    async fn register_for_event(&self, registration: &EventRegistration) -> StoreResult<Event>;

    async fn list_event_registrations(&self, user_id: &str)
        -> StoreResult<Vec<EventRegistration>>;

    // ─── Rewards ─────────────────────────────────────────────────

    /// All rewards, cheapest first.
    async fn list_rewards(&self) -> StoreResult<Vec<Reward>>;

    async fn get_reward(&self, reward_id: &str) -> StoreResult<Option<Reward>>;

    async fn put_reward(&self, reward: &Reward) -> StoreResult<()>;

    /// Debit `redemption.fitcoin_cost` iff the balance covers it and persist
    /// the redemption in the same step. Returns the new balance.
    async fn redeem_reward(&self, redemption: &RewardRedemption) -> StoreResult<u64>;

    /// A user's redemptions, newest first.
    async fn list_redemptions(&self, user_id: &str) -> StoreResult<Vec<RewardRedemption>>;

    // ─── Workouts / Activity Log ─────────────────────────────────

    /// Append the log entry and apply the credit in one step.
    async fn credit_workout(
        &self,
        entry: &ActivityLogEntry,
        credit: &WorkoutCredit,
    ) -> StoreResult<Profile>;

    /// A user's activity log, newest first.
    async fn list_activity(&self, user_id: &str, limit: usize)
        -> StoreResult<Vec<ActivityLogEntry>>;

    // ─── Gyms ────────────────────────────────────────────────────

    /// All gyms, best rated first.
    async fn list_gyms(&self) -> StoreResult<Vec<Gym>>;

    async fn put_gym(&self, gym: &Gym) -> StoreResult<()>;

    // ─── Reels ───────────────────────────────────────────────────

    /// All reels, newest first.
    async fn list_reels(&self) -> StoreResult<Vec<Reel>>;

    async fn insert_reel(&self, reel: &Reel) -> StoreResult<()>;

    /// Add one like, returning the new count.
    async fn increment_reel_likes(&self, reel_id: &str) -> StoreResult<u32>;
}
