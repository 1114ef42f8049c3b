// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod catalog;
pub mod challenges;
pub mod events;
pub mod gyms;
pub mod map;
pub mod reels;
pub mod rewards;
pub mod workouts;

pub use accounts::AccountService;
pub use catalog::{Catalog, CatalogError};
pub use challenges::ChallengeService;
pub use events::EventService;
pub use gyms::{GymService, GymSort};
pub use map::MapService;
pub use reels::ReelService;
pub use rewards::RewardService;
pub use workouts::WorkoutService;
