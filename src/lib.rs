// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitBoost: workouts, challenges, events and rewards
//!
//! This crate provides the backend API for the FitBoost fitness app:
//! accounts and onboarding, a workout timer that earns FitCoins, challenge
//! and event sign-ups, reward redemption, and map views of gyms and events.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    AccountService, ChallengeService, EventService, GymService, MapService, ReelService,
    RewardService, WorkoutService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub accounts: AccountService,
    pub challenges: ChallengeService,
    pub events: EventService,
    pub rewards: RewardService,
    pub workouts: WorkoutService,
    pub gyms: GymService,
    pub reels: ReelService,
    pub maps: MapService,
}

impl AppState {
    /// Wire every service to the same store.
    pub fn new(config: Config, db: Arc<dyn Store>) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), config.pbkdf2_iterations),
            challenges: ChallengeService::new(db.clone()),
            events: EventService::new(db.clone()),
            rewards: RewardService::new(db.clone()),
            workouts: WorkoutService::new(db.clone(), config.workout_credit_once_per_day),
            gyms: GymService::new(db.clone()),
            reels: ReelService::new(db.clone()),
            maps: MapService::from_config(&config),
            config,
            db,
        }
    }
}
