// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    ActivityLogEntry, Event, OnboardingUpdate, Profile, Reel, RewardRedemption, UserChallenge,
    UserChallengeWithChallenge,
};
use crate::services::challenges::ChallengeCard;
use crate::services::events::{CreateEventRequest, EventCard};
use crate::services::gyms::{GymCard, GymSort};
use crate::services::map::{to_feature_collection, MapView};
use crate::services::reels::{CreateReelRequest, ReelCard};
use crate::services::rewards::{RedeemResponse, RewardCard};
use crate::services::workouts::{SaveWorkoutResponse, TimerState};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_ACTIVITY_LIMIT: usize = 20;
const MAX_ACTIVITY_LIMIT: usize = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/onboarding", put(complete_onboarding))
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/mine", get(list_my_challenges))
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}/register", post(register_for_event))
        .route("/api/events/map", get(events_map))
        .route("/api/events/map.geojson", get(events_geojson))
        .route("/api/rewards", get(list_rewards))
        .route("/api/rewards/redemptions", get(list_redemptions))
        .route("/api/rewards/{id}/redeem", post(redeem_reward))
        .route("/api/workout", get(workout_state))
        .route("/api/workout/start", post(workout_start))
        .route("/api/workout/pause", post(workout_pause))
        .route("/api/workout/toggle", post(workout_toggle))
        .route("/api/workout/reset", post(workout_reset))
        .route("/api/workout/save", post(workout_save))
        .route("/api/activity", get(list_activity))
        .route("/api/gyms", get(list_gyms))
        .route("/api/gyms/map", get(gyms_map))
        .route("/api/gyms/map.geojson", get(gyms_geojson))
        .route("/api/reels", get(list_reels).post(create_reel))
        .route("/api/reels/{id}/like", post(like_reel))
}

/// Generic success acknowledgement with a user-facing message.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ActionResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}

/// Map wrapper; `map` is null when nothing has coordinates.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapResponse {
    pub map: Option<MapView>,
}

fn geojson_or_empty(view: Option<MapView>) -> Json<FeatureCollection> {
    Json(match view {
        Some(view) => to_feature_collection(&view),
        None => FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        },
    })
}

// ─── User Profile ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub needs_onboarding: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            needs_onboarding: !profile.is_onboarded(),
            profile,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state.accounts.profile(&user.user_id).await?;
    Ok(Json(profile.into()))
}

async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<OnboardingUpdate>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .accounts
        .complete_onboarding(&user.user_id, update)
        .await?;
    Ok(Json(profile.into()))
}

// ─── Challenges ──────────────────────────────────────────────

async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChallengeCard>>> {
    Ok(Json(
        state.challenges.list_with_membership(&user.user_id).await?,
    ))
}

async fn list_my_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserChallengeWithChallenge>>> {
    Ok(Json(state.challenges.list_mine(&user.user_id).await?))
}

async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ActionResponse<UserChallenge>>> {
    let membership = state.challenges.join(&user.user_id, &challenge_id).await?;
    Ok(ActionResponse::ok(
        "Challenge joined! Good luck on your fitness journey!",
        membership,
    ))
}

// ─── Events ──────────────────────────────────────────────────

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<EventCard>>> {
    Ok(Json(
        state.events.list_cards(&user.user_id, today_utc()).await?,
    ))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<ActionResponse<Event>>)> {
    let event = state.events.create(&user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::ok("Your event has been published successfully.", event),
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegistrationSummary {
    pub event_id: String,
    pub current_participants: u32,
    pub spots_left: Option<u32>,
}

async fn register_for_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<ActionResponse<RegistrationSummary>>> {
    let event = state.events.register(&user.user_id, &event_id).await?;
    Ok(ActionResponse::ok(
        format!("You're registered for {}!", event.title),
        RegistrationSummary {
            current_participants: event.current_participants,
            spots_left: event.spots_left(),
            event_id: event.id,
        },
    ))
}

async fn events_map(State(state): State<Arc<AppState>>) -> Result<Json<MapResponse>> {
    let events = state.events.list_upcoming(today_utc()).await?;
    Ok(Json(MapResponse {
        map: state.maps.build_view(&events),
    }))
}

async fn events_geojson(State(state): State<Arc<AppState>>) -> Result<Json<FeatureCollection>> {
    let events = state.events.list_upcoming(today_utc()).await?;
    Ok(geojson_or_empty(state.maps.build_view(&events)))
}

// ─── Rewards ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardsResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub fitcoin_balance: u64,
    pub rewards: Vec<RewardCard>,
}

async fn list_rewards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RewardsResponse>> {
    let (fitcoin_balance, rewards) = state.rewards.list(&user.user_id).await?;
    Ok(Json(RewardsResponse {
        fitcoin_balance,
        rewards,
    }))
}

async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(reward_id): Path<String>,
) -> Result<Json<RedeemResponse>> {
    Ok(Json(state.rewards.redeem(&user.user_id, &reward_id).await?))
}

async fn list_redemptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RewardRedemption>>> {
    Ok(Json(state.rewards.list_redemptions(&user.user_id).await?))
}

// ─── Workouts ────────────────────────────────────────────────

async fn workout_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerState> {
    Json(state.workouts.state(&user.user_id))
}

async fn workout_start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerState> {
    Json(state.workouts.start(&user.user_id))
}

async fn workout_pause(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerState> {
    Json(state.workouts.pause(&user.user_id))
}

async fn workout_toggle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerState> {
    Json(state.workouts.toggle(&user.user_id))
}

async fn workout_reset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerState> {
    Json(state.workouts.reset(&user.user_id))
}

async fn workout_save(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SaveWorkoutResponse>> {
    Ok(Json(state.workouts.save(&user.user_id).await?))
}

#[derive(Deserialize)]
struct ActivityQuery {
    limit: Option<usize>,
}

async fn list_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityLogEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    if limit == 0 || limit > MAX_ACTIVITY_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_ACTIVITY_LIMIT
        )));
    }
    Ok(Json(
        state
            .workouts
            .recent_activity(&user.user_id, limit)
            .await?,
    ))
}

// ─── Gyms ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct GymsQuery {
    pub(crate) sort: Option<String>,
}

impl GymsQuery {
    pub(crate) fn sort(&self) -> Result<GymSort> {
        self.sort
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

async fn list_gyms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GymsQuery>,
) -> Result<Json<Vec<GymCard>>> {
    Ok(Json(state.gyms.list_cards(params.sort()?).await?))
}

async fn gyms_map(State(state): State<Arc<AppState>>) -> Result<Json<MapResponse>> {
    let gyms = state.gyms.list(GymSort::Rating).await?;
    Ok(Json(MapResponse {
        map: state.maps.build_view(&gyms),
    }))
}

async fn gyms_geojson(State(state): State<Arc<AppState>>) -> Result<Json<FeatureCollection>> {
    let gyms = state.gyms.list(GymSort::Rating).await?;
    Ok(geojson_or_empty(state.maps.build_view(&gyms)))
}

// ─── Reels ───────────────────────────────────────────────────

async fn list_reels(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ReelCard>>> {
    Ok(Json(state.reels.list().await?))
}

async fn create_reel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateReelRequest>,
) -> Result<(StatusCode, Json<Reel>)> {
    let reel = state.reels.create(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(reel)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeResponse {
    pub reel_id: String,
    pub likes: u32,
}

async fn like_reel(
    State(state): State<Arc<AppState>>,
    Path(reel_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let likes = state.reels.like(&reel_id).await?;
    Ok(Json(LikeResponse { reel_id, likes }))
}
