// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page routes.
//!
//! Each gated page returns the JSON view model its screen renders.
//! Unauthenticated requests are redirected to `/auth` by
//! [`require_page_auth`](crate::middleware::require_page_auth).

use crate::error::Result;
use crate::middleware::auth::{current_user, AuthUser};
use crate::models::profile::FITNESS_GOALS;
use crate::models::{Event, Gym, Profile, RewardRedemption, UserChallengeWithChallenge};
use crate::routes::api::GymsQuery;
use crate::services::accounts::MIN_PASSWORD_LEN;
use crate::services::challenges::ChallengeCard;
use crate::services::events::EventCard;
use crate::services::gyms::GymCard;
use crate::services::map::MapView;
use crate::services::reels::ReelCard;
use crate::services::rewards::RewardCard;
use crate::services::workouts::TimerState;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Pages reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/dashboard") }))
        .route("/auth", get(auth_page))
}

/// Pages that require a session.
pub fn gated_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/onboarding", get(onboarding_page))
        .route("/dashboard", get(dashboard_page))
        .route("/challenges", get(challenges_page))
        .route("/rewards", get(rewards_page))
        .route("/reels", get(reels_page))
        .route("/gyms", get(gyms_page))
        .route("/events", get(events_page))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthPage {
    pub title: String,
    pub signup_path: String,
    pub login_path: String,
    pub min_password_length: usize,
}

async fn auth_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    if current_user(&state, &jar, &headers).is_some() {
        return Redirect::temporary("/dashboard").into_response();
    }
    Json(AuthPage {
        title: "Welcome to FitBoost".to_string(),
        signup_path: "/auth/signup".to_string(),
        login_path: "/auth/login".to_string(),
        min_password_length: MIN_PASSWORD_LEN,
    })
    .into_response()
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingPage {
    pub profile: Profile,
    pub fitness_goals: Vec<String>,
    pub completed: bool,
}

async fn onboarding_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<OnboardingPage>> {
    let profile = state.accounts.profile(&user.user_id).await?;
    Ok(Json(OnboardingPage {
        completed: profile.is_onboarded(),
        fitness_goals: FITNESS_GOALS.iter().map(|g| g.to_string()).collect(),
        profile,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Shortcut {
    pub label: String,
    pub icon: String,
    pub path: String,
}

const SHORTCUTS: [(&str, &str, &str); 4] = [
    ("Challenges", "🏆", "/challenges"),
    ("Events", "📅", "/events"),
    ("Rewards", "🎁", "/rewards"),
    ("Find Gyms", "🏋️", "/gyms"),
];

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardPage {
    pub greeting: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub fitcoin_balance: u64,
    pub workout_streak: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub calories_today: u64,
    pub timer: TimerState,
    pub tip: String,
    pub shortcuts: Vec<Shortcut>,
}

fn greeting(name: &str) -> String {
    let name = name.trim();
    format!("Hello, {}!", if name.is_empty() { "there" } else { name })
}

async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardPage>> {
    let profile = state.accounts.profile(&user.user_id).await?;
    let calories_today = state.workouts.calories_today(&user.user_id).await?;

    Ok(Json(DashboardPage {
        greeting: greeting(&profile.name),
        fitcoin_balance: profile.fitcoin_balance,
        workout_streak: profile.workout_streak,
        calories_today,
        timer: state.workouts.state(&user.user_id),
        tip: state.workouts.tip_of_the_day().to_string(),
        shortcuts: SHORTCUTS
            .iter()
            .map(|(label, icon, path)| Shortcut {
                label: label.to_string(),
                icon: icon.to_string(),
                path: path.to_string(),
            })
            .collect(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengesPage {
    pub challenges: Vec<ChallengeCard>,
    pub mine: Vec<UserChallengeWithChallenge>,
}

async fn challenges_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChallengesPage>> {
    let (challenges, mine) = tokio::try_join!(
        state.challenges.list_with_membership(&user.user_id),
        state.challenges.list_mine(&user.user_id),
    )?;
    Ok(Json(ChallengesPage { challenges, mine }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardsPage {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub fitcoin_balance: u64,
    pub rewards: Vec<RewardCard>,
    pub redemptions: Vec<RewardRedemption>,
}

async fn rewards_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RewardsPage>> {
    let ((fitcoin_balance, rewards), redemptions) = tokio::try_join!(
        state.rewards.list(&user.user_id),
        state.rewards.list_redemptions(&user.user_id),
    )?;
    Ok(Json(RewardsPage {
        fitcoin_balance,
        rewards,
        redemptions,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReelsPage {
    pub reels: Vec<ReelCard>,
}

async fn reels_page(State(state): State<Arc<AppState>>) -> Result<Json<ReelsPage>> {
    Ok(Json(ReelsPage {
        reels: state.reels.list().await?,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GymsPage {
    pub sort: String,
    pub gyms: Vec<GymCard>,
    pub map: Option<MapView>,
}

async fn gyms_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GymsQuery>,
) -> Result<Json<GymsPage>> {
    let sort = params.sort()?;
    let gyms = state.gyms.list_cards(sort).await?;
    let located: Vec<Gym> = gyms.iter().map(|card| card.gym.clone()).collect();

    Ok(Json(GymsPage {
        sort: sort.to_string(),
        map: state.maps.build_view(&located),
        gyms,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventsPage {
    /// Only verified organizers see the create form
    pub can_create: bool,
    pub events: Vec<EventCard>,
    pub map: Option<MapView>,
}

async fn events_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<EventsPage>> {
    let (profile, events) = tokio::try_join!(
        state.accounts.profile(&user.user_id),
        state.events.list_cards(&user.user_id, today_utc()),
    )?;
    let located: Vec<Event> = events.iter().map(|card| card.event.clone()).collect();

    Ok(Json(EventsPage {
        can_create: profile.verified,
        map: state.maps.build_view(&located),
        events,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotFoundPage {
    pub error: String,
    pub message: String,
    pub home: String,
}

/// Fallback for unmatched paths.
pub async fn not_found() -> (StatusCode, Json<NotFoundPage>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundPage {
            error: "not_found".to_string(),
            message: "Oops! Page not found".to_string(),
            home: "/".to_string(),
        }),
    )
}
