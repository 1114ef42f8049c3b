// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`Store`].
//!
//! Provides typed operations for:
//! - Profiles and credentials
//! - Challenges and per-user memberships
//! - Events and registrations
//! - Rewards and redemptions
//! - Activity log, gyms, reels
//!
//! Membership-style records use a deterministic `{user}_{entity}` document ID
//! so a second join or registration collides with the first.

use crate::db::{
    collections, debit_balance, take_event_spot, Store, StoreError, StoreResult, WorkoutCredit,
};
use crate::models::event::STATUS_UPCOMING;
use crate::models::{
    ActivityLogEntry, Challenge, Credentials, Event, EventRegistration, Gym, OnboardingUpdate,
    Profile, Reel, Reward, RewardRedemption, UserChallenge, UserChallengeWithChallenge,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{
    FirestoreQueryDirection, FirestoreResult, FirestoreTransaction, FirestoreWritePrecondition,
};
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Body of a guarded write. The outer error aborts (and for transient
/// failures retries) the transaction; the inner one is a rejection that
/// commits nothing.
type GuardedWrite<'b, T> = BoxFuture<'b, Result<StoreResult<T>, BackoffError<FirestoreError>>>;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Map a Firestore error to a backend failure.
fn backend(e: FirestoreError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Map a Firestore error from a create or commit, treating a conflict as a
/// duplicate of `what`.
fn conflict_as(what: &'static str) -> impl Fn(FirestoreError) -> StoreError {
    move |e| match e {
        FirestoreError::DataConflictError(_) => StoreError::AlreadyExists(what),
        other => backend(other),
    }
}

/// Read one document through `db`, which inside a transaction is bound to it.
async fn read_doc<T>(
    db: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> FirestoreResult<Option<T>>
where
    T: serde::de::DeserializeOwned + Send,
{
    db.fluent().select().by_id_in(collection).obj().one(id).await
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        // Emulator connections skip credential discovery.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> StoreResult<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Backend("Database not connected (offline mode)".to_string()))
    }

    /// Fetch one document by ID.
    async fn get_doc<T>(&self, collection: &str, id: &str) -> StoreResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        read_doc(self.get_client()?, collection, id)
            .await
            .map_err(backend)
    }

    /// Create or overwrite one document.
    async fn put_doc<T>(&self, collection: &str, id: &str, object: &T) -> StoreResult<()>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    /// Run a guarded write in a Firestore transaction.
    ///
    /// `func` gets a client bound to the transaction, so every read it makes
    /// is part of the transaction and a concurrent commit to one of those
    /// documents aborts and retries it. A write precondition that fails at
    /// commit is reported as a duplicate of `what`.
    async fn run_guarded<T, FN>(&self, what: &'static str, func: FN) -> StoreResult<T>
    where
        for<'b> FN: Fn(firestore::FirestoreDb, &'b mut FirestoreTransaction) -> GuardedWrite<'b, T>,
    {
        self.get_client()?
            .run_transaction(func)
            .await
            .map_err(conflict_as(what))?
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── Accounts & Profiles ─────────────────────────────────────

    async fn create_account(
        &self,
        credentials: &Credentials,
        profile: &Profile,
    ) -> StoreResult<()> {
        // The credentials document claims the email; the profile is only
        // written alongside it.
        self.run_guarded("account", move |db, transaction| {
            let credentials = credentials.clone();
            let profile = profile.clone();
            async move {
                let email_id = urlencoding::encode(&credentials.email).into_owned();
                let existing: Option<Credentials> =
                    read_doc(&db, collections::CREDENTIALS, &email_id).await?;
                if existing.is_some() {
                    return Ok(Err(StoreError::AlreadyExists("account")));
                }

                db.fluent()
                    .update()
                    .in_col(collections::CREDENTIALS)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&email_id)
                    .object(&credentials)
                    .add_to_transaction(transaction)?;

                db.fluent()
                    .update()
                    .in_col(collections::PROFILES)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&profile.id)
                    .object(&profile)
                    .add_to_transaction(transaction)?;

                Ok::<_, BackoffError<FirestoreError>>(Ok(()))
            }
            .boxed()
        })
        .await
    }

    async fn get_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        self.get_doc(collections::CREDENTIALS, urlencoding::encode(email).as_ref())
            .await
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        self.get_doc(collections::PROFILES, user_id).await
    }

    async fn update_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> StoreResult<Profile> {
        let mut profile: Profile = self
            .get_profile(user_id)
            .await?
            .ok_or(StoreError::NotFound("profile"))?;
        profile.apply_onboarding(update, Utc::now());
        self.put_doc(collections::PROFILES, user_id, &profile)
            .await?;
        Ok(profile)
    }

    async fn set_verified(&self, user_id: &str, verified: bool) -> StoreResult<()> {
        let mut profile: Profile = self
            .get_profile(user_id)
            .await?
            .ok_or(StoreError::NotFound("profile"))?;
        profile.verified = verified;
        profile.updated_at = Utc::now();
        self.put_doc(collections::PROFILES, user_id, &profile).await
    }

    // ─── Challenges ──────────────────────────────────────────────

    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn get_challenge(&self, challenge_id: &str) -> StoreResult<Option<Challenge>> {
        self.get_doc(collections::CHALLENGES, challenge_id).await
    }

    async fn put_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        self.put_doc(collections::CHALLENGES, &challenge.id, challenge)
            .await
    }

    async fn insert_user_challenge(&self, membership: &UserChallenge) -> StoreResult<()> {
        let _: UserChallenge = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USER_CHALLENGES)
            .document_id(&membership.doc_id())
            .object(membership)
            .execute()
            .await
            .map_err(conflict_as("challenge membership"))?;
        Ok(())
    }

    async fn list_user_challenges(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<UserChallengeWithChallenge>> {
        let user_id = user_id.to_string();
        let memberships: Vec<UserChallenge> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_CHALLENGES)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("joined_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(backend)?;

        // Resolve catalog entries concurrently, keeping membership order.
        stream::iter(memberships)
            .map(|membership| async move {
                let challenge = self.get_challenge(&membership.challenge_id).await?;
                Ok::<_, StoreError>(UserChallengeWithChallenge {
                    membership,
                    challenge,
                })
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<StoreResult<UserChallengeWithChallenge>>>()
            .await
            .into_iter()
            .collect()
    }

    // ─── Events ──────────────────────────────────────────────────

    async fn list_upcoming_events(&self, from: NaiveDate) -> StoreResult<Vec<Event>> {
        let from = from.format("%Y-%m-%d").to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("status").eq(STATUS_UPCOMING),
                    q.field("event_date").greater_than_or_equal(from.clone()),
                ])
            })
            .order_by([("event_date", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>> {
        self.get_doc(collections::EVENTS, event_id).await
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        let _: Event = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::EVENTS)
            .document_id(&event.id)
            .object(event)
            .execute()
            .await
            .map_err(conflict_as("event"))?;
        Ok(())
    }

    async fn register_for_event(&self, registration: &EventRegistration) -> StoreResult<Event> {
        let event = self
            .run_guarded("event registration", move |db, transaction| {
                let registration = registration.clone();
                async move {
                    let doc_id = registration.doc_id();

                    let event: Option<Event> =
                        read_doc(&db, collections::EVENTS, &registration.event_id).await?;
                    let Some(mut event) = event else {
                        return Ok(Err(StoreError::NotFound("event")));
                    };

                    let existing: Option<EventRegistration> =
                        read_doc(&db, collections::EVENT_REGISTRATIONS, &doc_id).await?;
                    if existing.is_some() {
                        return Ok(Err(StoreError::AlreadyExists("event registration")));
                    }

                    // Capacity check against the counter read in this transaction
                    if let Err(e) = take_event_spot(&mut event) {
                        return Ok(Err(e));
                    }
                    event.updated_at = Utc::now();

                    db.fluent()
                        .update()
                        .in_col(collections::EVENT_REGISTRATIONS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&doc_id)
                        .object(&registration)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::EVENTS)
                        .document_id(&event.id)
                        .object(&event)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(event))
                }
                .boxed()
            })
            .await?;

        tracing::info!(
            user_id = %registration.user_id,
            event_id = %event.id,
            participants = event.current_participants,
            "Registration committed"
        );

        Ok(event)
    }

    async fn list_event_registrations(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<EventRegistration>> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENT_REGISTRATIONS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    // ─── Rewards ─────────────────────────────────────────────────

    async fn list_rewards(&self) -> StoreResult<Vec<Reward>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REWARDS)
            .order_by([("fitcoin_cost", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn get_reward(&self, reward_id: &str) -> StoreResult<Option<Reward>> {
        self.get_doc(collections::REWARDS, reward_id).await
    }

    async fn put_reward(&self, reward: &Reward) -> StoreResult<()> {
        self.put_doc(collections::REWARDS, &reward.id, reward).await
    }

    async fn redeem_reward(&self, redemption: &RewardRedemption) -> StoreResult<u64> {
        self.run_guarded("reward redemption", move |db, transaction| {
            let redemption = redemption.clone();
            async move {
                let profile: Option<Profile> =
                    read_doc(&db, collections::PROFILES, &redemption.user_id).await?;
                let Some(mut profile) = profile else {
                    return Ok(Err(StoreError::NotFound("profile")));
                };

                let new_balance = match debit_balance(&mut profile, redemption.fitcoin_cost) {
                    Ok(balance) => balance,
                    Err(e) => return Ok(Err(e)),
                };
                profile.updated_at = Utc::now();

                db.fluent()
                    .update()
                    .in_col(collections::PROFILES)
                    .document_id(&profile.id)
                    .object(&profile)
                    .add_to_transaction(transaction)?;

                db.fluent()
                    .update()
                    .in_col(collections::REWARD_REDEMPTIONS)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&redemption.id)
                    .object(&redemption)
                    .add_to_transaction(transaction)?;

                Ok::<_, BackoffError<FirestoreError>>(Ok(new_balance))
            }
            .boxed()
        })
        .await
    }

    async fn list_redemptions(&self, user_id: &str) -> StoreResult<Vec<RewardRedemption>> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REWARD_REDEMPTIONS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("redeemed_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    // ─── Workouts / Activity Log ─────────────────────────────────

    async fn credit_workout(
        &self,
        entry: &ActivityLogEntry,
        credit: &WorkoutCredit,
    ) -> StoreResult<Profile> {
        let credit = *credit;
        self.run_guarded("activity log entry", move |db, transaction| {
            let entry = entry.clone();
            async move {
                let profile: Option<Profile> =
                    read_doc(&db, collections::PROFILES, &entry.user_id).await?;
                let Some(mut profile) = profile else {
                    return Ok(Err(StoreError::NotFound("profile")));
                };

                if let Err(e) = credit.apply(&mut profile) {
                    return Ok(Err(e));
                }
                profile.updated_at = Utc::now();

                db.fluent()
                    .update()
                    .in_col(collections::ACTIVITY_LOG)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&entry.id)
                    .object(&entry)
                    .add_to_transaction(transaction)?;

                db.fluent()
                    .update()
                    .in_col(collections::PROFILES)
                    .document_id(&profile.id)
                    .object(&profile)
                    .add_to_transaction(transaction)?;

                Ok::<_, BackoffError<FirestoreError>>(Ok(profile))
            }
            .boxed()
        })
        .await
    }

    async fn list_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<ActivityLogEntry>> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_LOG)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .limit(limit as u32)
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    // ─── Gyms ────────────────────────────────────────────────────

    async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::GYMS)
            .order_by([("rating", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn put_gym(&self, gym: &Gym) -> StoreResult<()> {
        self.put_doc(collections::GYMS, &gym.id, gym).await
    }

    // ─── Reels ───────────────────────────────────────────────────

    async fn list_reels(&self) -> StoreResult<Vec<Reel>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REELS)
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn insert_reel(&self, reel: &Reel) -> StoreResult<()> {
        self.put_doc(collections::REELS, &reel.id, reel).await
    }

    async fn increment_reel_likes(&self, reel_id: &str) -> StoreResult<u32> {
        self.run_guarded("reel", move |db, transaction| {
            let reel_id = reel_id.to_string();
            async move {
                let reel: Option<Reel> = read_doc(&db, collections::REELS, &reel_id).await?;
                let Some(mut reel) = reel else {
                    return Ok(Err(StoreError::NotFound("reel")));
                };
                reel.likes = reel.likes.saturating_add(1);

                db.fluent()
                    .update()
                    .in_col(collections::REELS)
                    .document_id(&reel_id)
                    .object(&reel)
                    .add_to_transaction(transaction)?;

                Ok::<_, BackoffError<FirestoreError>>(Ok(reel.likes))
            }
            .boxed()
        })
        .await
    }
}
