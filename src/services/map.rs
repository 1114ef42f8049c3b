// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map view construction for events and gyms.
//!
//! A [`MapView`] carries everything a client map needs: the initial center
//! (arithmetic mean of the located entities), the bounding box to fit with
//! padding, the tile source, and one marker per located entity. Entities
//! without coordinates are left off the map entirely.

use crate::config::Config;
use crate::models::{Event, Gym};
use crate::time_utils::format_display_date;
use geo::{BoundingRect, Centroid, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Initial zoom for the events map.
pub const EVENT_MAP_ZOOM: u8 = 12;
/// Initial zoom for the gyms map.
pub const GYM_MAP_ZOOM: u8 = 13;
/// Padding (px) applied when fitting the viewport to the bounds.
pub const FIT_PADDING_PX: u32 = 50;

/// Marker color and glyph for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

/// Style for an event type. Unknown types get the neutral pin.
pub fn event_type_style(event_type: &str) -> MarkerStyle {
    let (color, icon) = match event_type {
        "Competition" => ("#EF4444", "🏆"),
        "Workshop" => ("#3B82F6", "📚"),
        "Meetup" => ("#10B981", "👥"),
        "Challenge" => ("#F59E0B", "💪"),
        _ => ("#6B7280", "📍"),
    };
    MarkerStyle { color, icon }
}

/// Rating band shown on gym markers and cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RatingTier {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl RatingTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.5 {
            RatingTier::Excellent
        } else if rating >= 4.0 {
            RatingTier::VeryGood
        } else if rating >= 3.5 {
            RatingTier::Good
        } else if rating >= 3.0 {
            RatingTier::Fair
        } else {
            RatingTier::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatingTier::Excellent => "Excellent",
            RatingTier::VeryGood => "Very Good",
            RatingTier::Good => "Good",
            RatingTier::Fair => "Fair",
            RatingTier::Poor => "Poor",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RatingTier::Excellent => "#10B981",
            RatingTier::VeryGood => "#3B82F6",
            RatingTier::Good => "#F59E0B",
            RatingTier::Fair => "#EF4444",
            RatingTier::Poor => "#6B7280",
        }
    }
}

/// Something that can be placed on a map.
pub trait MapEntity {
    /// Prefix of the list-item anchor the host view scrolls to.
    const ANCHOR_PREFIX: &'static str;
    /// Initial zoom for a map of this entity kind.
    const ZOOM: u8;
    /// Marker icon size in pixels.
    const ICON_SIZE: u32;

    fn entity_id(&self) -> &str;

    /// `(latitude, longitude)` when the entity is located.
    fn position(&self) -> Option<(f64, f64)>;

    fn style(&self) -> MarkerStyle;

    fn popup(&self) -> MarkerPopup;
}

impl MapEntity for Event {
    const ANCHOR_PREFIX: &'static str = "event";
    const ZOOM: u8 = EVENT_MAP_ZOOM;
    const ICON_SIZE: u32 = 36;

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Option<(f64, f64)> {
        located(self.latitude, self.longitude)
    }

    fn style(&self) -> MarkerStyle {
        event_type_style(&self.event_type)
    }

    fn popup(&self) -> MarkerPopup {
        MarkerPopup {
            title: self.title.clone(),
            badge: Some(self.event_type.clone()),
            lines: vec![
                format!("📍 {}", self.location_name),
                self.location_address.clone(),
                format!("📅 {}", format_display_date(self.event_date)),
            ],
        }
    }
}

impl MapEntity for Gym {
    const ANCHOR_PREFIX: &'static str = "gym";
    const ZOOM: u8 = GYM_MAP_ZOOM;
    const ICON_SIZE: u32 = 32;

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Option<(f64, f64)> {
        located(self.latitude, self.longitude)
    }

    fn style(&self) -> MarkerStyle {
        MarkerStyle {
            color: RatingTier::from_rating(self.rating).color(),
            icon: "📍",
        }
    }

    fn popup(&self) -> MarkerPopup {
        let mut lines = vec![self.address.clone()];
        if let Some(price) = &self.price_range {
            lines.push(price.clone());
        }
        MarkerPopup {
            title: self.name.clone(),
            badge: Some(format!("⭐ {}", self.rating)),
            lines,
        }
    }
}

/// Both coordinates present and finite.
fn located(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        _ => None,
    }
}

/// Geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Bounding box to fit the viewport to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl MapBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Formatted marker popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MarkerPopup {
    pub title: String,
    pub badge: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapMarker {
    /// Entity ID reported back when the marker is clicked
    pub id: String,
    /// DOM anchor of the matching list item (`event-{id}`, `gym-{id}`)
    pub anchor: String,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub icon: String,
    pub icon_size: u32,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub bounds: MapBounds,
    pub padding: u32,
    pub tile_url: String,
    pub attribution: String,
    pub markers: Vec<MapMarker>,
}

/// Tile source shared by every map.
#[derive(Debug, Clone)]
pub struct MapService {
    tile_url: String,
    attribution: String,
}

impl MapService {
    pub fn new(tile_url: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            tile_url: tile_url.into(),
            attribution: attribution.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tile_url.clone(), config.tile_attribution.clone())
    }

    /// Build a map of the located entities, or `None` when none are located.
    pub fn build_view<T: MapEntity>(&self, entities: &[T]) -> Option<MapView> {
        let located: Vec<(&T, f64, f64)> = entities
            .iter()
            .filter_map(|e| e.position().map(|(lat, lon)| (e, lat, lon)))
            .collect();

        // geo points are (x = lon, y = lat)
        let points: MultiPoint<f64> = located
            .iter()
            .map(|(_, lat, lon)| Point::new(*lon, *lat))
            .collect::<Vec<_>>()
            .into();

        let center = points.centroid()?;
        let rect = points.bounding_rect()?;

        let markers = located
            .iter()
            .map(|(entity, lat, lon)| {
                let style = entity.style();
                MapMarker {
                    id: entity.entity_id().to_string(),
                    anchor: format!("{}-{}", T::ANCHOR_PREFIX, entity.entity_id()),
                    lat: *lat,
                    lon: *lon,
                    color: style.color.to_string(),
                    icon: style.icon.to_string(),
                    icon_size: T::ICON_SIZE,
                    popup: entity.popup(),
                }
            })
            .collect();

        Some(MapView {
            center: LatLon {
                lat: center.y(),
                lon: center.x(),
            },
            zoom: T::ZOOM,
            bounds: MapBounds {
                south: rect.min().y,
                west: rect.min().x,
                north: rect.max().y,
                east: rect.max().x,
            },
            padding: FIT_PADDING_PX,
            tile_url: self.tile_url.clone(),
            attribution: self.attribution.clone(),
            markers,
        })
    }
}

/// Export a map view as a GeoJSON FeatureCollection of Point features.
pub fn to_feature_collection(view: &MapView) -> FeatureCollection {
    let features = view
        .markers
        .iter()
        .map(|marker| {
            let mut properties = JsonObject::new();
            properties.insert("anchor".to_string(), JsonValue::from(marker.anchor.clone()));
            properties.insert("color".to_string(), JsonValue::from(marker.color.clone()));
            properties.insert("icon".to_string(), JsonValue::from(marker.icon.clone()));
            properties.insert("title".to_string(), JsonValue::from(marker.popup.title.clone()));
            if let Some(badge) = &marker.popup.badge {
                properties.insert("badge".to_string(), JsonValue::from(badge.clone()));
            }
            properties.insert("lines".to_string(), JsonValue::from(marker.popup.lines.clone()));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![marker.lon, marker.lat]))),
                id: Some(geojson::feature::Id::String(marker.id.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: Some(vec![
            view.bounds.west,
            view.bounds.south,
            view.bounds.east,
            view.bounds.north,
        ]),
        features,
        foreign_members: None,
    }
}
