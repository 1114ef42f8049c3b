// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog and join flow.

use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::{Challenge, UserChallenge, UserChallengeWithChallenge};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog entry annotated with the caller's membership.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeCard {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub joined: bool,
}

#[derive(Clone)]
pub struct ChallengeService {
    db: Arc<dyn Store>,
}

impl ChallengeService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Join a challenge. A second join by the same user is rejected with
    /// [`AppError::AlreadyJoined`] and leaves the first record untouched.
    pub async fn join(&self, user_id: &str, challenge_id: &str) -> Result<UserChallenge> {
        if self.db.get_challenge(challenge_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge_id
            )));
        }

        let membership = UserChallenge::joined(user_id, challenge_id, Utc::now());
        match self.db.insert_user_challenge(&membership).await {
            Ok(()) => {
                tracing::info!(user_id, challenge_id, "Joined challenge");
                Ok(membership)
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::warn!(user_id, challenge_id, "Duplicate challenge join");
                Err(AppError::AlreadyJoined)
            }
            Err(e) => {
                tracing::error!(user_id, challenge_id, error = %e, "Failed to join challenge");
                Err(e.into())
            }
        }
    }

    /// Full catalog with a `joined` flag for the user.
    pub async fn list_with_membership(&self, user_id: &str) -> Result<Vec<ChallengeCard>> {
        let challenges = self.db.list_challenges().await?;
        let joined: HashSet<String> = self
            .db
            .list_user_challenges(user_id)
            .await?
            .into_iter()
            .map(|m| m.membership.challenge_id)
            .collect();

        Ok(challenges
            .into_iter()
            .map(|challenge| {
                let joined = joined.contains(&challenge.id);
                ChallengeCard { challenge, joined }
            })
            .collect())
    }

    pub async fn list_mine(&self, user_id: &str) -> Result<Vec<UserChallengeWithChallenge>> {
        Ok(self.db.list_user_challenges(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    async fn seeded() -> (Arc<MemoryDb>, ChallengeService) {
        let db = Arc::new(MemoryDb::new());
        db.put_challenge(&Challenge {
            id: "c1".to_string(),
            title: "10k steps".to_string(),
            description: None,
            goal: "Walk 10,000 steps a day".to_string(),
            duration_days: 7,
            fitcoins_reward: 50,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        let service = ChallengeService::new(db.clone());
        (db, service)
    }

    #[tokio::test]
    async fn test_second_join_is_duplicate() {
        let (db, service) = seeded().await;

        let first = service.join("u1", "c1").await.unwrap();
        assert_eq!(first.progress, 0);
        assert_eq!(first.status, "In Progress");

        let second = service.join("u1", "c1").await;
        assert!(matches!(second, Err(AppError::AlreadyJoined)));
        assert_eq!(
            second.unwrap_err().to_string(),
            "You have already joined this challenge!"
        );

        assert_eq!(db.list_user_challenges("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_join_unknown_challenge() {
        let (_db, service) = seeded().await;
        assert!(matches!(
            service.join("u1", "nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_marks_joined() {
        let (_db, service) = seeded().await;
        assert!(!service.list_with_membership("u1").await.unwrap()[0].joined);
        service.join("u1", "c1").await.unwrap();
        assert!(service.list_with_membership("u1").await.unwrap()[0].joined);
        assert!(!service.list_with_membership("u2").await.unwrap()[0].joined);
    }
}
