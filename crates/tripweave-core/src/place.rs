//! Reverse-geocode candidate model and place-name selection.
//!
//! A [`PlaceLookup`] returns a list of [`GeocodeFeature`]s for one
//! coordinate. [`pick_place`] then chooses the shortest recognisable name
//! using a fixed type priority:
//!
//! | Tier | Type | `name` | `place` |
//! |------|------|--------|---------|
//! | 1 | `poi` | label, else `properties.name` | `place.` or `locality.` ancestor |
//! | 2 | `neighborhood` | label | `place.` or `locality.` ancestor |
//! | 3 | `locality` | label | `place.` ancestor, else its own name |
//! | 4 | `place` | label | its own name |
//! | 5 | `region` | label | empty (`region` = its own name) |
//! | 6 | `address` | label | `place.` or `locality.` ancestor |
//!
//! For every tier `address` is the feature's full formatted label, and
//! `region`/`country` come from the `region.`/`country.` ancestors unless
//! stated otherwise. The first feature (in provider order) carrying the
//! winning type is used.
//!
//! Network access, timeouts and degradation to sentinels live in the
//! application crate; this module is pure.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::geo::GeoPoint;
use crate::lexicon::Locale;
use crate::models::PlaceResolution;

/// Provider feature types the selection chain understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    Poi,
    Neighborhood,
    Locality,
    Place,
    Region,
    Address,
    Postcode,
    District,
    Country,
    #[serde(other)]
    Other,
}

impl PlaceType {
    /// Selection order, highest priority first.
    pub const PRIORITY: [PlaceType; 6] = [
        PlaceType::Poi,
        PlaceType::Neighborhood,
        PlaceType::Locality,
        PlaceType::Place,
        PlaceType::Region,
        PlaceType::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceType::Poi => "poi",
            PlaceType::Neighborhood => "neighborhood",
            PlaceType::Locality => "locality",
            PlaceType::Place => "place",
            PlaceType::Region => "region",
            PlaceType::Address => "address",
            PlaceType::Postcode => "postcode",
            PlaceType::District => "district",
            PlaceType::Country => "country",
            PlaceType::Other => "other",
        }
    }

    /// Comma-separated `types` query value for the priority tiers.
    pub fn query_types() -> String {
        Self::PRIORITY
            .iter()
            .map(PlaceType::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// An ancestor of a feature, e.g. `{ id: "region.123", text: "京都府" }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: String,
    pub text: String,
}

/// One candidate returned by a place lookup, validated at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeFeature {
    /// Short primary label.
    pub label: String,
    /// Full formatted address.
    pub full_address: String,
    pub place_types: Vec<PlaceType>,
    /// Fallback name some providers put in feature properties (POIs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_name: Option<String>,
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

impl GeocodeFeature {
    pub fn has_type(&self, kind: PlaceType) -> bool {
        self.place_types.contains(&kind)
    }

    /// Text of the first ancestor whose id starts with `prefix`, or `""`.
    pub fn context_text(&self, prefix: &str) -> &str {
        self.context
            .iter()
            .find(|c| c.id.starts_with(prefix))
            .map(|c| c.text.as_str())
            .unwrap_or_default()
    }

    fn city_context(&self) -> &str {
        first_non_empty(self.context_text("place."), self.context_text("locality."))
    }
}

/// External reverse-geocoding dependency.
///
/// Implementations return every candidate the provider offers for `point`,
/// in provider order. An empty list is a valid answer; `Err` covers
/// transport, status and parse failures.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn lookup(&self, point: GeoPoint, locale: Locale) -> Result<Vec<GeocodeFeature>>;
}

/// Choose a place from `features` following the tier table above.
///
/// Returns `None` when no feature carries any of the tier types. A matched
/// tier with an empty label still yields the unknown-spot sentinel as its
/// name. `address` may be empty; callers substitute the coordinate string.
pub fn pick_place(features: &[GeocodeFeature], locale: Locale) -> Option<PlaceResolution> {
    let feature_types: Vec<String> = features
        .iter()
        .flat_map(|f| f.place_types.iter().map(|t| t.as_str().to_string()))
        .collect();

    let (tier, feature) = PlaceType::PRIORITY.iter().find_map(|tier| {
        features
            .iter()
            .find(|f| f.has_type(*tier))
            .map(|f| (*tier, f))
    })?;

    let label = feature.label.trim();
    let name = match tier {
        PlaceType::Poi => first_non_empty(
            label,
            feature.properties_name.as_deref().unwrap_or_default().trim(),
        ),
        _ => label,
    };
    let name = if name.is_empty() {
        locale.unknown_spot().to_string()
    } else {
        name.to_string()
    };

    let (place, region) = match tier {
        PlaceType::Locality => (
            first_non_empty(feature.context_text("place."), &name).to_string(),
            feature.context_text("region.").to_string(),
        ),
        PlaceType::Place => (name.clone(), feature.context_text("region.").to_string()),
        PlaceType::Region => (String::new(), name.clone()),
        _ => (
            feature.city_context().to_string(),
            feature.context_text("region.").to_string(),
        ),
    };

    Some(PlaceResolution {
        name,
        address: feature.full_address.trim().to_string(),
        place,
        region,
        country: feature.context_text("country.").to_string(),
        feature_types,
    })
}

fn first_non_empty<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a.is_empty() {
        b
    } else {
        a
    }
}

// ============ Japanese address tokens ============

const PREFECTURE: &str = r"(?:東京都|北海道|(?:京都|大阪)府|.{2,3}県)";

static PREFECTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", PREFECTURE)).expect("valid regex"));

static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{}(.+?[市区町村])", PREFECTURE)).expect("valid regex"));

/// First Japanese prefecture token in `address`, or `""`.
///
/// ```rust
/// use tripweave_core::place::extract_prefecture;
///
/// assert_eq!(extract_prefecture("日本、京都府京都市東山区清水1丁目"), "京都府");
/// assert_eq!(extract_prefecture("1600 Amphitheatre Pkwy"), "");
/// ```
pub fn extract_prefecture(address: &str) -> &str {
    PREFECTURE_RE
        .captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// The municipality following the prefecture in `address`, or `""`.
pub fn extract_city(address: &str) -> &str {
    CITY_RE
        .captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default()
}
