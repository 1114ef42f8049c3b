// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account sign-up, sign-in and onboarding.
//!
//! Passwords are stored as salted PBKDF2-HMAC-SHA256 hashes. The iteration
//! count is stored with each hash so it can be raised without breaking
//! existing logins.

use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::profile::FITNESS_GOALS;
use crate::models::{Credentials, OnboardingUpdate, Profile};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use futures_util::{stream, StreamExt};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::ops::RangeInclusive;
use std::sync::Arc;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 100;

const AGE_RANGE: RangeInclusive<u32> = 10..=120;
const WEIGHT_RANGE_KG: RangeInclusive<f64> = 20.0..=500.0;
const HEIGHT_RANGE_CM: RangeInclusive<f64> = 50.0..=300.0;

const MAX_CONCURRENT_DB_OPS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Check onboarding answers against the accepted ranges.
pub fn validate_onboarding(update: &OnboardingUpdate) -> Result<()> {
    if !AGE_RANGE.contains(&update.age) {
        return Err(AppError::BadRequest(format!(
            "Age must be between {} and {}",
            AGE_RANGE.start(),
            AGE_RANGE.end()
        )));
    }
    if !WEIGHT_RANGE_KG.contains(&update.weight) {
        return Err(AppError::BadRequest(format!(
            "Weight must be between {} and {} kg",
            WEIGHT_RANGE_KG.start(),
            WEIGHT_RANGE_KG.end()
        )));
    }
    if !HEIGHT_RANGE_CM.contains(&update.height) {
        return Err(AppError::BadRequest(format!(
            "Height must be between {} and {} cm",
            HEIGHT_RANGE_CM.start(),
            HEIGHT_RANGE_CM.end()
        )));
    }
    if !FITNESS_GOALS.contains(&update.fitness_goal.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown fitness goal '{}'",
            update.fitness_goal
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn Store>,
    iterations: u32,
    rng: SystemRandom,
}

impl AccountService {
    pub fn new(db: Arc<dyn Store>, iterations: u32) -> Self {
        Self {
            db,
            iterations,
            rng: SystemRandom::new(),
        }
    }

    /// Create an account with an empty wallet.
    pub async fn signup(&self, request: SignupRequest) -> Result<Profile> {
        let email = normalize_email(&request.email);
        if !valid_email(&email) {
            return Err(AppError::BadRequest("A valid email is required".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be between 1 and {} characters",
                MAX_NAME_LEN
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Random generation failed")))?;
        let hash = derive(&salt, &request.password, self.iterations)?;

        let now = Utc::now();
        let user_id = uuid::Uuid::new_v4().to_string();
        let credentials = Credentials {
            email: email.clone(),
            user_id: user_id.clone(),
            salt: STANDARD.encode(salt),
            password_hash: STANDARD.encode(hash),
            iterations: self.iterations,
            created_at: now,
        };
        let profile = Profile::new(user_id, email, name.to_string(), now);

        match self.db.create_account(&credentials, &profile).await {
            Ok(()) => {
                tracing::info!(user_id = %profile.id, "Account created");
                Ok(profile)
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::warn!("Sign-up rejected: email already registered");
                Err(AppError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify email and password, returning the user ID.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        let email = normalize_email(&request.email);
        let Some(credentials) = self.db.get_credentials(&email).await? else {
            tracing::warn!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let salt = STANDARD
            .decode(&credentials.salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt salt: {}", e)))?;
        let expected = STANDARD
            .decode(&credentials.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt password hash: {}", e)))?;
        let iterations = NonZeroU32::new(credentials.iterations)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid iteration count")))?;

        pbkdf2::verify(
            PBKDF2_ALG,
            iterations,
            &salt,
            request.password.as_bytes(),
            &expected,
        )
        .map_err(|_| {
            tracing::warn!(user_id = %credentials.user_id, "Login failed: wrong password");
            AppError::InvalidCredentials
        })?;

        tracing::info!(user_id = %credentials.user_id, "User logged in");
        Ok(credentials.user_id)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Store validated onboarding answers.
    pub async fn complete_onboarding(
        &self,
        user_id: &str,
        update: OnboardingUpdate,
    ) -> Result<Profile> {
        validate_onboarding(&update)?;
        let profile = self.db.update_onboarding(user_id, &update).await?;
        tracing::info!(user_id, goal = %update.fitness_goal, "Onboarding completed");
        Ok(profile)
    }
}

/// Look up display names for a set of user IDs.
///
/// Users without a profile are left out of the map.
pub(crate) async fn profile_names(
    db: &Arc<dyn Store>,
    user_ids: HashSet<String>,
) -> Result<HashMap<String, String>> {
    let results: Vec<Result<Option<(String, String)>>> = stream::iter(user_ids)
        .map(|id| {
            let db = Arc::clone(db);
            async move {
                let profile = db.get_profile(&id).await?;
                Ok(profile.map(|p| (id, p.name)))
            }
        })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .collect()
        .await;

    let mut names = HashMap::new();
    for result in results {
        if let Some((id, name)) = result? {
            names.insert(id, name);
        }
    }
    Ok(names)
}

fn derive(salt: &[u8], password: &str, iterations: u32) -> Result<[u8; CREDENTIAL_LEN]> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid iteration count")))?;
    let mut out = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations, salt, password.as_bytes(), &mut out);
    Ok(out)
}
