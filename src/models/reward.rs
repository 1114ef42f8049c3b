// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward marketplace and redemptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog item redeemable for FitCoins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Reward {
    pub id: String,
    pub brand: String,
    pub product_name: String,
    pub description: Option<String>,
    pub product_image: Option<String>,
    pub fitcoin_cost: u64,
    pub created_at: DateTime<Utc>,
}

/// A completed redemption. The coupon is issued and stored together with
/// the balance debit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardRedemption {
    pub id: String,
    pub user_id: String,
    pub reward_id: String,
    pub coupon_code: String,
    pub fitcoin_cost: u64,
    pub redeemed_at: DateTime<Utc>,
}
