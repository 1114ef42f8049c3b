// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward marketplace and redemption.

use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::{Reward, RewardRedemption};
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const COUPON_PREFIX: &str = "FB";
const COUPON_BODY_LEN: usize = 8;
const COUPON_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Reward with affordability for the current balance.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardCard {
    #[serde(flatten)]
    pub reward: Reward,
    pub can_afford: bool,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedeemResponse {
    pub redemption_id: String,
    pub coupon_code: String,
    pub new_balance: u64,
    pub message: String,
}

#[derive(Clone)]
pub struct RewardService {
    db: Arc<dyn Store>,
    rng: SystemRandom,
}

impl RewardService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self {
            db,
            rng: SystemRandom::new(),
        }
    }

    /// Rewards (cheapest first) with the user's balance and affordability.
    pub async fn list(&self, user_id: &str) -> Result<(u64, Vec<RewardCard>)> {
        let balance = self
            .db
            .get_profile(user_id)
            .await?
            .map(|p| p.fitcoin_balance)
            .unwrap_or(0);

        let cards = self
            .db
            .list_rewards()
            .await?
            .into_iter()
            .map(|reward| RewardCard {
                can_afford: balance >= reward.fitcoin_cost,
                reward,
            })
            .collect();

        Ok((balance, cards))
    }

    /// Redeem a reward for the user.
    ///
    /// An insufficient balance is rejected before anything is written. The
    /// coupon is generated here and stored with the debit.
    pub async fn redeem(&self, user_id: &str, reward_id: &str) -> Result<RedeemResponse> {
        let reward = self
            .db
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reward {} not found", reward_id)))?;

        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        if profile.fitcoin_balance < reward.fitcoin_cost {
            let shortfall = reward.fitcoin_cost - profile.fitcoin_balance;
            tracing::warn!(user_id, reward_id, shortfall, "Redemption rejected: insufficient FitCoins");
            return Err(AppError::InsufficientFitCoins { shortfall });
        }

        let redemption = RewardRedemption {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            reward_id: reward.id.clone(),
            coupon_code: self.generate_coupon()?,
            fitcoin_cost: reward.fitcoin_cost,
            redeemed_at: Utc::now(),
        };

        let new_balance = match self.db.redeem_reward(&redemption).await {
            Ok(balance) => balance,
            Err(StoreError::InsufficientBalance { balance, cost }) => {
                // Balance changed between the read and the debit.
                let shortfall = cost.saturating_sub(balance);
                tracing::warn!(user_id, reward_id, shortfall, "Redemption rejected at debit");
                return Err(AppError::InsufficientFitCoins { shortfall });
            }
            Err(e) => {
                tracing::error!(user_id, reward_id, error = %e, "Failed to redeem reward");
                return Err(e.into());
            }
        };

        tracing::info!(
            user_id,
            reward_id,
            cost = reward.fitcoin_cost,
            new_balance,
            "Reward redeemed"
        );

        Ok(RedeemResponse {
            redemption_id: redemption.id,
            message: format!(
                "You redeemed {} from {}. Your coupon code: {}",
                reward.product_name, reward.brand, redemption.coupon_code
            ),
            coupon_code: redemption.coupon_code,
            new_balance,
        })
    }

    pub async fn list_redemptions(&self, user_id: &str) -> Result<Vec<RewardRedemption>> {
        Ok(self.db.list_redemptions(user_id).await?)
    }

    /// `FB` followed by 8 uppercase alphanumerics.
    fn generate_coupon(&self) -> Result<String> {
        let mut code = String::with_capacity(COUPON_PREFIX.len() + COUPON_BODY_LEN);
        code.push_str(COUPON_PREFIX);

        // Rejection sampling keeps every symbol equally likely.
        let limit = (u8::MAX as usize + 1) / COUPON_ALPHABET.len() * COUPON_ALPHABET.len();
        let mut buf = [0u8; 16];
        while code.len() < COUPON_PREFIX.len() + COUPON_BODY_LEN {
            self.rng
                .fill(&mut buf)
                .map_err(|_| AppError::Internal(anyhow::anyhow!("Random generation failed")))?;
            for &b in &buf {
                if (b as usize) < limit && code.len() < COUPON_PREFIX.len() + COUPON_BODY_LEN {
                    code.push(COUPON_ALPHABET[b as usize % COUPON_ALPHABET.len()] as char);
                }
            }
        }
        Ok(code)
    }
}
