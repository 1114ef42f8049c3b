// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_DAYS};
use crate::models::Profile;
use crate::services::accounts::{LoginRequest, SignupRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Session issued on sign-up or sign-in.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub name: String,
    /// Where the client should go next
    pub redirect_to: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub success: bool,
    pub redirect_to: String,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let secure = !(state.config.frontend_url.starts_with("http://localhost")
        || state.config.frontend_url.starts_with("http://127.0.0.1"));
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    profile: &Profile,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(&profile.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let redirect_to = if profile.is_onboarded() {
        "/dashboard"
    } else {
        "/onboarding"
    };

    let jar = jar.add(session_cookie(state, token.clone()));
    Ok((
        jar,
        Json(SessionResponse {
            token,
            user_id: profile.id.clone(),
            name: profile.name.clone(),
            redirect_to: redirect_to.to_string(),
        }),
    ))
}

/// Create an account and sign in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let profile = state.accounts.signup(request).await?;
    start_session(&state, jar, &profile)
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let user_id = state.accounts.login(request).await?;
    let profile = state.accounts.profile(&user_id).await?;
    start_session(&state, jar, &profile)
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (
        jar,
        Json(LogoutResponse {
            success: true,
            redirect_to: "/auth".to_string(),
        }),
    )
}
