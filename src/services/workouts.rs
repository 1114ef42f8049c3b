// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout timer and FitCoin credit.
//!
//! Each user has one timer. While it runs, a background task adds one second
//! per tick; pausing, resetting or saving stops that task. Saving a workout
//! appends an activity log entry and credits the profile in a single store
//! operation.

use crate::db::{Store, StoreError, WorkoutCredit};
use crate::error::{AppError, Result};
use crate::models::activity_log::ACTIVITY_WORKOUT;
use crate::models::ActivityLogEntry;
use crate::time_utils::{format_mm_ss, today_utc};
use chrono::Utc;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// FitCoins credited per saved workout.
pub const WORKOUT_COINS: u64 = 10;
/// Calories credited per full minute.
pub const CALORIES_PER_MINUTE: u64 = 8;

const TICK: Duration = Duration::from_secs(1);

/// Coaching tips shown on the dashboard.
pub const TIPS: [&str; 5] = [
    "Start your day with a glass of water to boost metabolism",
    "Take short walking breaks every hour to stay active",
    "Consistency is key - aim for 30 minutes of exercise daily",
    "Mix cardio and strength training for best results",
    "Rest days are important for muscle recovery",
];

/// Elapsed-seconds counter with a running flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutTimer {
    elapsed: u64,
    running: bool,
}

impl WorkoutTimer {
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop counting; elapsed time is kept.
    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One second passes. No effect while paused.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed += 1;
        }
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn display(&self) -> String {
        format_mm_ss(self.elapsed)
    }

    /// Calories for the elapsed time: 8 per full minute.
    pub fn calories(&self) -> u64 {
        (self.elapsed / 60) * CALORIES_PER_MINUTE
    }
}

/// Timer snapshot returned by the workout endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimerState {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub elapsed_seconds: u64,
    pub running: bool,
    pub display: String,
    pub can_save: bool,
}

impl From<&WorkoutTimer> for TimerState {
    fn from(timer: &WorkoutTimer) -> Self {
        Self {
            elapsed_seconds: timer.elapsed(),
            running: timer.is_running(),
            display: timer.display(),
            can_save: timer.elapsed() > 0 && !timer.is_running(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveWorkoutResponse {
    pub calories: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub coins_earned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub fitcoin_balance: u64,
    pub workout_streak: u32,
    pub message: String,
    pub timer: TimerState,
}

#[derive(Default)]
struct Session {
    timer: WorkoutTimer,
    ticker: Option<JoinHandle<()>>,
}

impl Session {
    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct WorkoutService {
    db: Arc<dyn Store>,
    sessions: Arc<DashMap<String, Session>>,
    once_per_day: bool,
    rng: SystemRandom,
}

impl WorkoutService {
    pub fn new(db: Arc<dyn Store>, once_per_day: bool) -> Self {
        Self {
            db,
            sessions: Arc::new(DashMap::new()),
            once_per_day,
            rng: SystemRandom::new(),
        }
    }

    pub fn state(&self, user_id: &str) -> TimerState {
        self.sessions
            .get(user_id)
            .map(|s| TimerState::from(&s.timer))
            .unwrap_or_else(|| TimerState::from(&WorkoutTimer::default()))
    }

    /// Start (or resume) the user's timer.
    pub fn start(&self, user_id: &str) -> TimerState {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if !session.timer.is_running() {
            session.timer.start();
            session.ticker = Some(self.spawn_ticker(user_id.to_string()));
            tracing::debug!(user_id, elapsed = session.timer.elapsed(), "Workout timer started");
        }
        TimerState::from(&session.timer)
    }

    pub fn pause(&self, user_id: &str) -> TimerState {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        session.stop_ticker();
        session.timer.pause();
        TimerState::from(&session.timer)
    }

    /// Start when paused, pause when running.
    pub fn toggle(&self, user_id: &str) -> TimerState {
        let running = self
            .sessions
            .get(user_id)
            .is_some_and(|s| s.timer.is_running());
        if running {
            self.pause(user_id)
        } else {
            self.start(user_id)
        }
    }

    pub fn reset(&self, user_id: &str) -> TimerState {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        session.stop_ticker();
        session.timer.reset();
        TimerState::from(&session.timer)
    }

    /// Save the paused workout and credit the user.
    ///
    /// The timer is taken out of the session before the store call, so a
    /// second save of the same workout finds nothing to save. On success the
    /// user is left with a fresh timer; on failure the workout is put back.
    pub async fn save(&self, user_id: &str) -> Result<SaveWorkoutResponse> {
        let timer = self.claim_paused(user_id)?;

        let calories = u32::try_from(timer.calories()).unwrap_or(u32::MAX);
        let entry = ActivityLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity_type: ACTIVITY_WORKOUT.to_string(),
            details: Some(format!("Quick workout - {}", timer.display())),
            calories,
            created_at: Utc::now(),
        };
        let credit = WorkoutCredit {
            coins: WORKOUT_COINS,
            date: today_utc(),
            once_per_day: self.once_per_day,
        };

        let profile = match self.db.credit_workout(&entry, &credit).await {
            Ok(profile) => profile,
            Err(StoreError::AlreadyCredited(date)) => {
                self.restore(user_id, timer);
                tracing::warn!(user_id, %date, "Workout credit rejected: already credited today");
                return Err(AppError::WorkoutAlreadyCredited);
            }
            Err(e) => {
                self.restore(user_id, timer);
                tracing::error!(user_id, error = %e, "Failed to save workout");
                return Err(e.into());
            }
        };

        tracing::info!(
            user_id,
            elapsed = timer.elapsed(),
            calories,
            balance = profile.fitcoin_balance,
            streak = profile.workout_streak,
            "Workout saved"
        );

        Ok(SaveWorkoutResponse {
            calories,
            coins_earned: WORKOUT_COINS,
            fitcoin_balance: profile.fitcoin_balance,
            workout_streak: profile.workout_streak,
            message: format!("You earned {} FitCoins! 🎉", WORKOUT_COINS),
            timer: self.state(user_id),
        })
    }

    /// Take a saveable timer out of the user's session, leaving a fresh one.
    fn claim_paused(&self, user_id: &str) -> Result<WorkoutTimer> {
        let mut session = match self.sessions.get_mut(user_id) {
            Some(session) if session.timer.elapsed() > 0 => session,
            _ => return Err(AppError::BadRequest("No workout to save".to_string())),
        };
        if session.timer.is_running() {
            return Err(AppError::BadRequest(
                "Pause the workout before saving".to_string(),
            ));
        }
        session.stop_ticker();
        Ok(std::mem::take(&mut session.timer))
    }

    /// Put back a claimed timer after a failed save, unless the user has
    /// started timing again since.
    fn restore(&self, user_id: &str, timer: WorkoutTimer) {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if session.timer == WorkoutTimer::default() {
            session.timer = timer;
        }
    }

    /// Calories logged today.
    pub async fn calories_today(&self, user_id: &str) -> Result<u64> {
        let today = today_utc();
        Ok(self
            .db
            .list_activity(user_id, 100)
            .await?
            .iter()
            .filter(|e| e.created_at.date_naive() == today)
            .map(|e| u64::from(e.calories))
            .sum())
    }

    pub async fn recent_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        Ok(self.db.list_activity(user_id, limit).await?)
    }

    /// A random entry from [`TIPS`].
    pub fn tip_of_the_day(&self) -> &'static str {
        let mut buf = [0u8; 4];
        match self.rng.fill(&mut buf) {
            Ok(()) => TIPS[u32::from_le_bytes(buf) as usize % TIPS.len()],
            Err(_) => TIPS[0],
        }
    }

    fn spawn_ticker(&self, user_id: String) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                match sessions.get_mut(&user_id) {
                    Some(mut session) if session.timer.is_running() => session.timer.tick(),
                    _ => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryDb, StoreResult};
    use crate::models::{
        Challenge, Credentials, Event, EventRegistration, Gym, OnboardingUpdate, Profile, Reel,
        Reward, RewardRedemption, UserChallenge, UserChallengeWithChallenge,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// Store whose workout credit takes a while, so saves can overlap.
    struct SlowCredit {
        inner: Arc<MemoryDb>,
        delay: Duration,
    }

    #[async_trait]
    impl Store for SlowCredit {
        async fn create_account(&self, c: &Credentials, p: &Profile) -> StoreResult<()> {
            self.inner.create_account(c, p).await
        }
        async fn get_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
            self.inner.get_credentials(email).await
        }
        async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
            self.inner.get_profile(user_id).await
        }
        async fn update_onboarding(
            &self,
            user_id: &str,
            update: &OnboardingUpdate,
        ) -> StoreResult<Profile> {
            self.inner.update_onboarding(user_id, update).await
        }
        async fn set_verified(&self, user_id: &str, verified: bool) -> StoreResult<()> {
            self.inner.set_verified(user_id, verified).await
        }
        async fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
            self.inner.list_challenges().await
        }
        async fn get_challenge(&self, id: &str) -> StoreResult<Option<Challenge>> {
            self.inner.get_challenge(id).await
        }
        async fn put_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
            self.inner.put_challenge(challenge).await
        }
        async fn insert_user_challenge(&self, m: &UserChallenge) -> StoreResult<()> {
            self.inner.insert_user_challenge(m).await
        }
        async fn list_user_challenges(
            &self,
            user_id: &str,
        ) -> StoreResult<Vec<UserChallengeWithChallenge>> {
            self.inner.list_user_challenges(user_id).await
        }
        async fn list_upcoming_events(&self, from: NaiveDate) -> StoreResult<Vec<Event>> {
            self.inner.list_upcoming_events(from).await
        }
        async fn get_event(&self, id: &str) -> StoreResult<Option<Event>> {
            self.inner.get_event(id).await
        }
        async fn insert_event(&self, event: &Event) -> StoreResult<()> {
            self.inner.insert_event(event).await
        }
        async fn register_for_event(&self, r: &EventRegistration) -> StoreResult<Event> {
            self.inner.register_for_event(r).await
        }
        async fn list_event_registrations(
            &self,
            user_id: &str,
        ) -> StoreResult<Vec<EventRegistration>> {
            self.inner.list_event_registrations(user_id).await
        }
        async fn list_rewards(&self) -> StoreResult<Vec<Reward>> {
            self.inner.list_rewards().await
        }
        async fn get_reward(&self, id: &str) -> StoreResult<Option<Reward>> {
            self.inner.get_reward(id).await
        }
        async fn put_reward(&self, reward: &Reward) -> StoreResult<()> {
            self.inner.put_reward(reward).await
        }
        async fn redeem_reward(&self, r: &RewardRedemption) -> StoreResult<u64> {
            self.inner.redeem_reward(r).await
        }
        async fn list_redemptions(&self, user_id: &str) -> StoreResult<Vec<RewardRedemption>> {
            self.inner.list_redemptions(user_id).await
        }
        async fn credit_workout(
            &self,
            entry: &ActivityLogEntry,
            credit: &WorkoutCredit,
        ) -> StoreResult<Profile> {
            tokio::time::sleep(self.delay).await;
            self.inner.credit_workout(entry, credit).await
        }
        async fn list_activity(
            &self,
            user_id: &str,
            limit: usize,
        ) -> StoreResult<Vec<ActivityLogEntry>> {
            self.inner.list_activity(user_id, limit).await
        }
        async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
            self.inner.list_gyms().await
        }
        async fn put_gym(&self, gym: &Gym) -> StoreResult<()> {
            self.inner.put_gym(gym).await
        }
        async fn list_reels(&self) -> StoreResult<Vec<Reel>> {
            self.inner.list_reels().await
        }
        async fn insert_reel(&self, reel: &Reel) -> StoreResult<()> {
            self.inner.insert_reel(reel).await
        }
        async fn increment_reel_likes(&self, reel_id: &str) -> StoreResult<u32> {
            self.inner.increment_reel_likes(reel_id).await
        }
    }

    async fn service_with_user() -> (Arc<MemoryDb>, WorkoutService) {
        let db = Arc::new(MemoryDb::new());
        let now = Utc::now();
        db.create_account(
            &Credentials {
                email: "a@example.com".to_string(),
                user_id: "u1".to_string(),
                salt: String::new(),
                password_hash: String::new(),
                iterations: 1,
                created_at: now,
            },
            &Profile::new(
                "u1".to_string(),
                "a@example.com".to_string(),
                "Asha".to_string(),
                now,
            ),
        )
        .await
        .unwrap();
        (db.clone(), WorkoutService::new(db, false))
    }

    #[test]
    fn test_timer_transitions() {
        let mut timer = WorkoutTimer::default();
        timer.tick();
        assert_eq!(timer.elapsed(), 0);

        timer.start();
        timer.tick();
        timer.tick();
        timer.pause();
        timer.tick();
        assert_eq!(timer.elapsed(), 2);
        assert!(!timer.is_running());

        timer.toggle();
        assert!(timer.is_running());
        timer.reset();
        assert_eq!(timer, WorkoutTimer::default());
    }

    #[test]
    fn test_calories_per_full_minute() {
        let mut timer = WorkoutTimer::default();
        timer.start();
        for _ in 0..179 {
            timer.tick();
        }
        assert_eq!(timer.calories(), 16);
        assert_eq!(timer.display(), "02:59");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_counts_while_running() {
        let (_db, service) = service_with_user().await;
        service.start("u1");
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let state = service.pause("u1");
        assert_eq!(state.elapsed_seconds, 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(service.state("u1").elapsed_seconds, 3);
        assert!(service.state("u1").can_save);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_credits_and_resets() {
        let (db, service) = service_with_user().await;
        service.start("u1");
        tokio::time::sleep(Duration::from_millis(125_500)).await;
        service.pause("u1");

        let response = service.save("u1").await.unwrap();
        assert_eq!(response.calories, 16);
        assert_eq!(response.coins_earned, 10);
        assert_eq!(response.fitcoin_balance, 10);
        assert_eq!(response.workout_streak, 1);
        assert_eq!(response.timer.elapsed_seconds, 0);
        assert!(!response.timer.running);

        let log = db.list_activity("u1", 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].details.as_deref(), Some("Quick workout - 02:05"));
        assert_eq!(log[0].activity_type, "Workout");
    }

    #[tokio::test]
    async fn test_save_without_elapsed_time() {
        let (db, service) = service_with_user().await;
        let writes = db.write_count();
        match service.save("u1").await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "No workout to save"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.message)),
        }
        assert_eq!(db.write_count(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_per_day_keeps_timer_on_rejection() {
        let (db, _) = service_with_user().await;
        let service = WorkoutService::new(db, true);

        service.start("u1");
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        service.pause("u1");
        service.save("u1").await.unwrap();

        service.start("u1");
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        service.pause("u1");
        assert!(matches!(
            service.save("u1").await,
            Err(AppError::WorkoutAlreadyCredited)
        ));
        assert_eq!(service.state("u1").elapsed_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_saves_credit_once() {
        let (db, _) = service_with_user().await;
        let slow = SlowCredit {
            inner: db.clone(),
            delay: Duration::from_millis(200),
        };
        let service = WorkoutService::new(Arc::new(slow), false);

        service.start("u1");
        tokio::time::sleep(Duration::from_millis(90_500)).await;
        service.pause("u1");

        let (first, second) = tokio::join!(service.save("u1"), service.save("u1"));
        let (saved, rejected) = match (first, second) {
            (Ok(saved), Err(rejected)) | (Err(rejected), Ok(saved)) => (saved, rejected),
            (first, second) => panic!(
                "expected exactly one save, got {:?} and {:?}",
                first.map(|r| r.message),
                second.map(|r| r.message)
            ),
        };
        assert_eq!(saved.fitcoin_balance, 10);
        assert_eq!(saved.workout_streak, 1);
        match rejected {
            AppError::BadRequest(msg) => assert_eq!(msg, "No workout to save"),
            other => panic!("unexpected error: {:?}", other),
        }

        let profile = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.fitcoin_balance, 10);
        assert_eq!(profile.workout_streak, 1);
        assert_eq!(db.list_activity("u1", 10).await.unwrap().len(), 1);
        assert_eq!(service.state("u1").elapsed_seconds, 0);
    }

    #[test]
    fn test_tip_is_from_list() {
        let service = WorkoutService::new(Arc::new(MemoryDb::new()), false);
        assert!(TIPS.contains(&service.tip_of_the_day()));
    }
}
