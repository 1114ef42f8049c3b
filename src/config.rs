// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. A `.env` file is honored for local development.

use std::env;

/// Default OpenStreetMap tile template used for map backgrounds.
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
/// Attribution required by the OpenStreetMap tile usage policy.
pub const DEFAULT_TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// PBKDF2-HMAC-SHA256 iterations for password hashes.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Which [`crate::db::Store`] implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Store implementation
    pub store_backend: StoreBackend,
    /// Optional catalog JSON used to seed the store at startup
    pub catalog_path: Option<String>,
    /// Only credit one workout per calendar day
    pub workout_credit_once_per_day: bool,
    /// Map tile URL template
    pub tile_url: String,
    /// Map tile attribution text
    pub tile_attribution: String,
    /// PBKDF2 iterations for new password hashes
    pub pbkdf2_iterations: u32,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            catalog_path: None,
            workout_credit_once_per_day: false,
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
            pbkdf2_iterations: 1_000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let workout_credit_once_per_day = match env::var("WORKOUT_CREDIT_ONCE_PER_DAY") {
            Ok(v) => parse_bool("WORKOUT_CREDIT_ONCE_PER_DAY", &v)?,
            Err(_) => false,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            catalog_path: env::var("CATALOG_PATH").ok().filter(|p| !p.is_empty()),
            workout_credit_once_per_day,
            tile_url: env::var("TILE_URL").unwrap_or_else(|_| DEFAULT_TILE_URL.to_string()),
            tile_attribution: env::var("TILE_ATTRIBUTION")
                .unwrap_or_else(|_| DEFAULT_TILE_ATTRIBUTION.to_string()),
            pbkdf2_iterations: match env::var("PBKDF2_ITERATIONS") {
                Ok(v) => v
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::Invalid("PBKDF2_ITERATIONS", v))?,
                Err(_) => DEFAULT_PBKDF2_ITERATIONS,
            },

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Host part of the tile URL, used to scope the image CSP.
    pub fn tile_host(&self) -> &str {
        let without_scheme = self
            .tile_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.tile_url);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid(name, value.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
