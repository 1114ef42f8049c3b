// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social video reels.

use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::Reel;
use crate::services::accounts::profile_names;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_CAPTION_LEN: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReelCard {
    #[serde(flatten)]
    pub reel: Reel,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReelRequest {
    pub video_url: String,
    pub caption: Option<String>,
}

#[derive(Clone)]
pub struct ReelService {
    db: Arc<dyn Store>,
}

impl ReelService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Reels, newest first, with author names.
    pub async fn list(&self) -> Result<Vec<ReelCard>> {
        let reels = self.db.list_reels().await?;

        let author_ids: HashSet<String> = reels.iter().map(|r| r.user_id.clone()).collect();
        let names = profile_names(&self.db, author_ids).await?;

        Ok(reels
            .into_iter()
            .map(|reel| ReelCard {
                author_name: names.get(&reel.user_id).cloned(),
                reel,
            })
            .collect())
    }

    pub async fn create(&self, user_id: &str, request: CreateReelRequest) -> Result<Reel> {
        let video_url = request.video_url.trim();
        if !(video_url.starts_with("https://") || video_url.starts_with("http://")) {
            return Err(AppError::BadRequest(
                "A valid video URL is required".to_string(),
            ));
        }
        let caption = request
            .caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if caption.as_ref().is_some_and(|c| c.len() > MAX_CAPTION_LEN) {
            return Err(AppError::BadRequest(format!(
                "Caption must be at most {} characters",
                MAX_CAPTION_LEN
            )));
        }

        let reel = Reel {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            video_url: video_url.to_string(),
            caption,
            likes: 0,
            created_at: Utc::now(),
        };
        self.db.insert_reel(&reel).await?;
        tracing::info!(user_id, reel_id = %reel.id, "Reel posted");
        Ok(reel)
    }

    /// Add a like, returning the new count.
    pub async fn like(&self, reel_id: &str) -> Result<u32> {
        match self.db.increment_reel_likes(reel_id).await {
            Ok(likes) => Ok(likes),
            Err(StoreError::NotFound(_)) => {
                Err(AppError::NotFound(format!("Reel {} not found", reel_id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
