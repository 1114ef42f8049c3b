// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity_log;
pub mod challenge;
pub mod event;
pub mod gym;
pub mod profile;
pub mod reel;
pub mod reward;

pub use activity_log::ActivityLogEntry;
pub use challenge::{Challenge, UserChallenge, UserChallengeWithChallenge};
pub use event::{Event, EventRegistration};
pub use gym::Gym;
pub use profile::{Credentials, OnboardingUpdate, Profile};
pub use reel::Reel;
pub use reward::{Reward, RewardRedemption};
