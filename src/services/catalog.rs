// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog seeding from a JSON file.

use crate::db::{Store, StoreError};
use crate::models::{Challenge, Event, Gym, Reward};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Seed data for the catalog collections.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub gyms: Vec<Gym>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Counts of seeded records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub challenges: usize,
    pub rewards: usize,
    pub gyms: usize,
    pub events: usize,
}

impl Catalog {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        Self::load_from_json(&json)
    }

    pub fn load_from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Write the catalog into the store.
    ///
    /// Challenges, rewards and gyms are upserted. Events that already exist
    /// are left alone so live participant counts survive a restart.
    pub async fn seed(&self, db: &dyn Store) -> Result<SeedSummary, CatalogError> {
        let mut summary = SeedSummary::default();

        for challenge in &self.challenges {
            db.put_challenge(challenge).await?;
            summary.challenges += 1;
        }
        for reward in &self.rewards {
            db.put_reward(reward).await?;
            summary.rewards += 1;
        }
        for gym in &self.gyms {
            db.put_gym(gym).await?;
            summary.gyms += 1;
        }
        for event in &self.events {
            match db.insert_event(event).await {
                Ok(()) => summary.events += 1,
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::debug!(event_id = %event.id, "Event already seeded");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            challenges = summary.challenges,
            rewards = summary.rewards,
            gyms = summary.gyms,
            events = summary.events,
            "Catalog seeded"
        );
        Ok(summary)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = Catalog::load_from_file("data/catalog.json").unwrap();
        assert!(!catalog.challenges.is_empty());
        assert!(!catalog.rewards.is_empty());
        assert!(catalog.gyms.iter().all(|g| (0.0..=5.0).contains(&g.rating)));
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let catalog = Catalog::load_from_file("data/catalog.json").unwrap();
        let db = MemoryDb::new();
        let first = catalog.seed(&db).await.unwrap();
        assert_eq!(first.events, catalog.events.len());

        let second = catalog.seed(&db).await.unwrap();
        assert_eq!(second.events, 0);
        assert_eq!(second.gyms, catalog.gyms.len());
        assert_eq!(db.list_gyms().await.unwrap().len(), catalog.gyms.len());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let catalog = Catalog::load_from_json("{}").unwrap();
        assert!(catalog.events.is_empty());
        assert!(matches!(
            Catalog::load_from_json("[").unwrap_err(),
            CatalogError::Parse(_)
        ));
    }
}
