// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::Gym;
use crate::services::map::RatingTier;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Amenities shown on a card before collapsing into "+N more".
pub const AMENITIES_SHOWN: usize = 4;

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GymSort {
    #[default]
    Rating,
    PriceLow,
    PriceHigh,
}

impl FromStr for GymSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rating" => Ok(GymSort::Rating),
            "price-low" => Ok(GymSort::PriceLow),
            "price-high" => Ok(GymSort::PriceHigh),
            other => Err(AppError::BadRequest(format!(
                "Unknown sort '{}'; expected rating, price-low or price-high",
                other
            ))),
        }
    }
}

impl std::fmt::Display for GymSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GymSort::Rating => "rating",
            GymSort::PriceLow => "price-low",
            GymSort::PriceHigh => "price-high",
        })
    }
}

/// Rank of a price range: `$` < `$$` < `$$$`.
fn price_rank(price_range: Option<&str>) -> Option<u8> {
    match price_range {
        Some("$") => Some(1),
        Some("$$") => Some(2),
        Some("$$$") => Some(3),
        _ => None,
    }
}

/// Compare price ranks, always putting unknown prices last.
fn cmp_price(a: Option<u8>, b: Option<u8>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort gyms in place. The sort is stable.
pub fn sort_gyms(gyms: &mut [Gym], sort: GymSort) {
    match sort {
        GymSort::Rating => gyms.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        GymSort::PriceLow => gyms.sort_by(|a, b| {
            cmp_price(
                price_rank(a.price_range.as_deref()),
                price_rank(b.price_range.as_deref()),
                false,
            )
        }),
        GymSort::PriceHigh => gyms.sort_by(|a, b| {
            cmp_price(
                price_rank(a.price_range.as_deref()),
                price_rank(b.price_range.as_deref()),
                true,
            )
        }),
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GymCard {
    #[serde(flatten)]
    pub gym: Gym,
    pub rating_tier: RatingTier,
    pub rating_label: String,
    pub rating_color: String,
    /// First few amenities
    pub amenities_shown: Vec<String>,
    /// Amenities not shown
    pub amenities_more: usize,
    pub anchor: String,
}

impl From<Gym> for GymCard {
    fn from(gym: Gym) -> Self {
        let tier = RatingTier::from_rating(gym.rating);
        let amenities_shown: Vec<String> =
            gym.amenities.iter().take(AMENITIES_SHOWN).cloned().collect();
        let amenities_more = gym.amenities.len().saturating_sub(AMENITIES_SHOWN);
        Self {
            rating_tier: tier,
            rating_label: tier.label().to_string(),
            rating_color: tier.color().to_string(),
            amenities_shown,
            amenities_more,
            anchor: format!("gym-{}", gym.id),
            gym,
        }
    }
}

#[derive(Clone)]
pub struct GymService {
    db: Arc<dyn Store>,
}

impl GymService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn list(&self, sort: GymSort) -> Result<Vec<Gym>> {
        let mut gyms = self.db.list_gyms().await?;
        sort_gyms(&mut gyms, sort);
        Ok(gyms)
    }

    pub async fn list_cards(&self, sort: GymSort) -> Result<Vec<GymCard>> {
        Ok(self.list(sort).await?.into_iter().map(GymCard::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gym(id: &str, rating: f64, price: Option<&str>) -> Gym {
        Gym {
            id: id.to_string(),
            name: id.to_string(),
            address: String::new(),
            description: None,
            amenities: vec![],
            latitude: None,
            longitude: None,
            price_range: price.map(str::to_string),
            rating,
            created_at: Utc::now(),
        }
    }

    fn ids(gyms: &[Gym]) -> Vec<&str> {
        gyms.iter().map(|g| g.id.as_str()).collect()
    }

    #[test]
    fn test_sort_orders() {
        let mut gyms = vec![
            gym("mid", 4.0, Some("$$")),
            gym("unknown", 5.0, None),
            gym("cheap", 3.0, Some("$")),
            gym("pricey", 4.8, Some("$$$")),
        ];

        sort_gyms(&mut gyms, GymSort::Rating);
        assert_eq!(ids(&gyms), ["unknown", "pricey", "mid", "cheap"]);

        sort_gyms(&mut gyms, GymSort::PriceLow);
        assert_eq!(ids(&gyms), ["cheap", "mid", "pricey", "unknown"]);

        sort_gyms(&mut gyms, GymSort::PriceHigh);
        assert_eq!(ids(&gyms), ["pricey", "mid", "cheap", "unknown"]);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price-low".parse::<GymSort>().unwrap(), GymSort::PriceLow);
        assert!("cheapest".parse::<GymSort>().is_err());
    }

    #[test]
    fn test_card_collapses_amenities() {
        let mut g = gym("g1", 4.6, Some("$$"));
        g.amenities = ["Pool", "Sauna", "Yoga", "Parking", "Cafe", "Spa"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let card = GymCard::from(g);
        assert_eq!(card.amenities_shown.len(), 4);
        assert_eq!(card.amenities_more, 2);
        assert_eq!(card.rating_label, "Excellent");
        assert_eq!(card.anchor, "gym-g1");
    }
}
