// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! All tables live behind one async mutex, so every guarded write runs its
//! check and its mutation under the same lock.

use crate::db::{
    debit_balance, take_event_spot, Store, StoreError, StoreResult, WorkoutCredit,
};
use crate::models::event::STATUS_UPCOMING;
use crate::models::{
    ActivityLogEntry, Challenge, Credentials, Event, EventRegistration, Gym, OnboardingUpdate,
    Profile, Reel, Reward, RewardRedemption, UserChallenge, UserChallengeWithChallenge,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, Profile>,
    credentials: HashMap<String, Credentials>,
    challenges: HashMap<String, Challenge>,
    user_challenges: HashMap<String, UserChallenge>,
    events: HashMap<String, Event>,
    registrations: HashMap<String, EventRegistration>,
    rewards: HashMap<String, Reward>,
    redemptions: Vec<RewardRedemption>,
    activity_log: Vec<ActivityLogEntry>,
    gyms: HashMap<String, Gym>,
    reels: HashMap<String, Reel>,
}

/// In-memory implementation of [`Store`].
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    /// Number of committed mutations
    writes: AtomicU64,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed mutations since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn create_account(
        &self,
        credentials: &Credentials,
        profile: &Profile,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.credentials.contains_key(&credentials.email) {
            return Err(StoreError::AlreadyExists("account"));
        }
        tables
            .credentials
            .insert(credentials.email.clone(), credentials.clone());
        tables.profiles.insert(profile.id.clone(), profile.clone());
        self.record_write();
        Ok(())
    }

    async fn get_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        Ok(self.tables.lock().await.credentials.get(email).cloned())
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.tables.lock().await.profiles.get(user_id).cloned())
    }

    async fn update_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> StoreResult<Profile> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or(StoreError::NotFound("profile"))?;
        profile.apply_onboarding(update, Utc::now());
        let updated = profile.clone();
        self.record_write();
        Ok(updated)
    }

    async fn set_verified(&self, user_id: &str, verified: bool) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or(StoreError::NotFound("profile"))?;
        profile.verified = verified;
        profile.updated_at = Utc::now();
        self.record_write();
        Ok(())
    }

    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
        let tables = self.tables.lock().await;
        let mut challenges: Vec<Challenge> = tables.challenges.values().cloned().collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(challenges)
    }

    async fn get_challenge(&self, challenge_id: &str) -> StoreResult<Option<Challenge>> {
        Ok(self.tables.lock().await.challenges.get(challenge_id).cloned())
    }

    async fn put_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .challenges
            .insert(challenge.id.clone(), challenge.clone());
        self.record_write();
        Ok(())
    }

    async fn insert_user_challenge(&self, membership: &UserChallenge) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let doc_id = membership.doc_id();
        if tables.user_challenges.contains_key(&doc_id) {
            return Err(StoreError::AlreadyExists("challenge membership"));
        }
        tables.user_challenges.insert(doc_id, membership.clone());
        self.record_write();
        Ok(())
    }

    async fn list_user_challenges(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<UserChallengeWithChallenge>> {
        let tables = self.tables.lock().await;
        let mut memberships: Vec<UserChallengeWithChallenge> = tables
            .user_challenges
            .values()
            .filter(|m| m.user_id == user_id)
            .map(|m| UserChallengeWithChallenge {
                membership: m.clone(),
                challenge: tables.challenges.get(&m.challenge_id).cloned(),
            })
            .collect();
        memberships.sort_by(|a, b| b.membership.joined_at.cmp(&a.membership.joined_at));
        Ok(memberships)
    }

    async fn list_upcoming_events(&self, from: NaiveDate) -> StoreResult<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.status == STATUS_UPCOMING && e.event_date >= from)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>> {
        Ok(self.tables.lock().await.events.get(event_id).cloned())
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::AlreadyExists("event"));
        }
        tables.events.insert(event.id.clone(), event.clone());
        self.record_write();
        Ok(())
    }

    async fn register_for_event(&self, registration: &EventRegistration) -> StoreResult<Event> {
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;
        let doc_id = registration.doc_id();
        let event = tables
            .events
            .get_mut(&registration.event_id)
            .ok_or(StoreError::NotFound("event"))?;
        if tables.registrations.contains_key(&doc_id) {
            return Err(StoreError::AlreadyExists("event registration"));
        }
        take_event_spot(event)?;
        event.updated_at = Utc::now();
        let updated = event.clone();
        tables.registrations.insert(doc_id, registration.clone());
        self.record_write();
        Ok(updated)
    }

    async fn list_event_registrations(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<EventRegistration>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_rewards(&self) -> StoreResult<Vec<Reward>> {
        let tables = self.tables.lock().await;
        let mut rewards: Vec<Reward> = tables.rewards.values().cloned().collect();
        rewards.sort_by(|a, b| {
            a.fitcoin_cost
                .cmp(&b.fitcoin_cost)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        Ok(rewards)
    }

    async fn get_reward(&self, reward_id: &str) -> StoreResult<Option<Reward>> {
        Ok(self.tables.lock().await.rewards.get(reward_id).cloned())
    }

    async fn put_reward(&self, reward: &Reward) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .rewards
            .insert(reward.id.clone(), reward.clone());
        self.record_write();
        Ok(())
    }

    async fn redeem_reward(&self, redemption: &RewardRedemption) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .get_mut(&redemption.user_id)
            .ok_or(StoreError::NotFound("profile"))?;
        let new_balance = debit_balance(profile, redemption.fitcoin_cost)?;
        profile.updated_at = Utc::now();
        tables.redemptions.push(redemption.clone());
        self.record_write();
        Ok(new_balance)
    }

    async fn list_redemptions(&self, user_id: &str) -> StoreResult<Vec<RewardRedemption>> {
        let tables = self.tables.lock().await;
        let mut redemptions: Vec<RewardRedemption> = tables
            .redemptions
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        redemptions.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        Ok(redemptions)
    }

    async fn credit_workout(
        &self,
        entry: &ActivityLogEntry,
        credit: &WorkoutCredit,
    ) -> StoreResult<Profile> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .get_mut(&entry.user_id)
            .ok_or(StoreError::NotFound("profile"))?;
        credit.apply(profile)?;
        profile.updated_at = Utc::now();
        let updated = profile.clone();
        tables.activity_log.push(entry.clone());
        self.record_write();
        Ok(updated)
    }

    async fn list_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<ActivityLogEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<ActivityLogEntry> = tables
            .activity_log
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        let tables = self.tables.lock().await;
        let mut gyms: Vec<Gym> = tables.gyms.values().cloned().collect();
        gyms.sort_by(|a, b| b.rating.total_cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
        Ok(gyms)
    }

    async fn put_gym(&self, gym: &Gym) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .gyms
            .insert(gym.id.clone(), gym.clone());
        self.record_write();
        Ok(())
    }

    async fn list_reels(&self) -> StoreResult<Vec<Reel>> {
        let tables = self.tables.lock().await;
        let mut reels: Vec<Reel> = tables.reels.values().cloned().collect();
        reels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reels)
    }

    async fn insert_reel(&self, reel: &Reel) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .reels
            .insert(reel.id.clone(), reel.clone());
        self.record_write();
        Ok(())
    }

    async fn increment_reel_likes(&self, reel_id: &str) -> StoreResult<u32> {
        let mut tables = self.tables.lock().await;
        let reel = tables
            .reels
            .get_mut(reel_id)
            .ok_or(StoreError::NotFound("reel"))?;
        reel.likes = reel.likes.saturating_add(1);
        let likes = reel.likes;
        self.record_write();
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_event(id: &str, max: Option<u32>) -> Event {
        let now = Utc::now();
        Event {
            id: id.to_string(),
            title: "Beach Bootcamp".to_string(),
            description: None,
            event_type: "Meetup".to_string(),
            location_name: "Juhu Beach".to_string(),
            location_address: "Mumbai".to_string(),
            latitude: Some(19.1),
            longitude: Some(72.8),
            event_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            event_time: None,
            registration_deadline: None,
            max_participants: max,
            current_participants: 0,
            entry_fee: 0,
            prize_pool: None,
            image_url: None,
            organizer_id: "org".to_string(),
            status: STATUS_UPCOMING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let db = MemoryDb::new();
        let membership = UserChallenge::joined("u1", "c1", Utc::now());

        db.insert_user_challenge(&membership).await.unwrap();
        let second = db.insert_user_challenge(&membership).await;

        assert_eq!(
            second,
            Err(StoreError::AlreadyExists("challenge membership"))
        );
        assert_eq!(db.list_user_challenges("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_respect_capacity() {
        let db = Arc::new(MemoryDb::new());
        db.insert_event(&test_event("e1", Some(3))).await.unwrap();

        let mut handles = vec![];
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let registration = EventRegistration::new(&format!("u{}", i), "e1", Utc::now());
                db.register_for_event(&registration).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert_eq!(e, StoreError::CapacityReached),
            }
        }

        assert_eq!(accepted, 3);
        let event = db.get_event("e1").await.unwrap().unwrap();
        assert_eq!(event.current_participants, 3);
    }

    #[tokio::test]
    async fn test_register_missing_event() {
        let db = MemoryDb::new();
        let registration = EventRegistration::new("u1", "nope", Utc::now());
        assert_eq!(
            db.register_for_event(&registration).await,
            Err(StoreError::NotFound("event"))
        );
        assert_eq!(db.write_count(), 0);
    }

    #[tokio::test]
    async fn test_registration_checks_existence_then_duplicate_then_capacity() {
        let db = MemoryDb::new();
        db.insert_event(&test_event("e1", Some(1))).await.unwrap();
        let registration = EventRegistration::new("u1", "e1", Utc::now());
        db.register_for_event(&registration).await.unwrap();

        // Full event, same user again: reported as a duplicate
        assert_eq!(
            db.register_for_event(&registration).await,
            Err(StoreError::AlreadyExists("event registration"))
        );

        // A leftover registration for an event that no longer exists
        let stale = EventRegistration::new("u1", "gone", Utc::now());
        db.tables
            .lock()
            .await
            .registrations
            .insert(stale.doc_id(), stale.clone());
        assert_eq!(
            db.register_for_event(&stale).await,
            Err(StoreError::NotFound("event"))
        );
    }

    #[tokio::test]
    async fn test_like_increments() {
        let db = MemoryDb::new();
        let reel = Reel {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            video_url: "https://videos.example.com/1.mp4".to_string(),
            caption: None,
            likes: 4,
            created_at: Utc::now(),
        };
        db.insert_reel(&reel).await.unwrap();
        assert_eq!(db.increment_reel_likes("r1").await, Ok(5));
        assert_eq!(
            db.increment_reel_likes("missing").await,
            Err(StoreError::NotFound("reel"))
        );
    }
}
