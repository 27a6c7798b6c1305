//! Core data models shared by every stage of trip generation.
//!
//! These types flow through the pipeline in order:
//! [`PhotoRecord`] → [`Cluster`] → [`ResolvedSpot`] → [`Trip`], with
//! [`Tag`] and [`TitleSuggestion`] derived from the assembled trip.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::GeoPoint;

/// One input photo's normalized metadata.
///
/// `captured_at` is always present: extraction falls back to the file's
/// modification time when no embedded timestamp parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub location: Option<GeoPoint>,
    pub captured_at: DateTime<FixedOffset>,
}

/// A maximal run of temporally and spatially close photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// `cluster-1`, `cluster-2`, … in time order.
    pub id: String,
    /// Mean of all member coordinates.
    pub centroid: GeoPoint,
    pub arrival_time: DateTime<FixedOffset>,
    pub departure_time: DateTime<FixedOffset>,
    /// Member photo ids in capture order. Never empty.
    pub members: Vec<String>,
}

impl Cluster {
    /// The photo standing in for the whole cluster (its first member).
    pub fn representative_photo_id(&self) -> Option<&str> {
        self.members.first().map(String::as_str)
    }
}

/// Human-readable place information for one coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceResolution {
    pub name: String,
    pub address: String,
    /// City-level context (`place.` or `locality.` ancestor).
    pub place: String,
    pub region: String,
    pub country: String,
    /// Place types of every candidate the provider returned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_types: Vec<String>,
}

/// A [`Cluster`] with its place resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpot {
    pub id: String,
    pub name: String,
    pub address: String,
    pub place: String,
    pub region: String,
    pub country: String,
    pub centroid: GeoPoint,
    pub arrival_time: DateTime<FixedOffset>,
    pub departure_time: DateTime<FixedOffset>,
    pub photo_ids: Vec<String>,
    pub representative_photo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_types: Vec<String>,
}

impl ResolvedSpot {
    pub fn from_cluster(cluster: Cluster, resolution: PlaceResolution) -> Self {
        let representative_photo_id = cluster.representative_photo_id().map(str::to_string);
        Self {
            id: cluster.id,
            name: resolution.name,
            address: resolution.address,
            place: resolution.place,
            region: resolution.region,
            country: resolution.country,
            centroid: cluster.centroid,
            arrival_time: cluster.arrival_time,
            departure_time: cluster.departure_time,
            photo_ids: cluster.members,
            representative_photo_id,
            feature_types: resolution.feature_types,
        }
    }
}

/// The closed set of tag categories. A final tag set holds exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Place,
    Season,
    Time,
    Motion,
    Mood,
}

impl TagCategory {
    /// All categories in selection order.
    pub const ALL: [TagCategory; 5] = [
        TagCategory::Place,
        TagCategory::Season,
        TagCategory::Time,
        TagCategory::Motion,
        TagCategory::Mood,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Place => "place",
            TagCategory::Season => "season",
            TagCategory::Time => "time",
            TagCategory::Motion => "motion",
            TagCategory::Mood => "mood",
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "place" => Ok(TagCategory::Place),
            "season" => Ok(TagCategory::Season),
            "time" => Ok(TagCategory::Time),
            "motion" => Ok(TagCategory::Motion),
            "mood" => Ok(TagCategory::Mood),
            other => anyhow::bail!(
                "Unknown tag category: '{}'. Must be place, season, time, motion, or mood.",
                other
            ),
        }
    }
}

/// A scored descriptive label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// `"{category}:{label}"`.
    pub id: String,
    pub category: TagCategory,
    pub label: String,
    /// Always within `[0, 1]`.
    pub score: f64,
    /// Where the tag came from. Informational only.
    pub reason: String,
}

impl Tag {
    /// Build a tag with a derived id and a clamped score.
    pub fn new(category: TagCategory, label: impl Into<String>, score: f64, reason: &str) -> Self {
        let label = label.into();
        Self {
            id: format!("{}:{}", category, label),
            category,
            label,
            score: clamp01(score),
            reason: reason.to_string(),
        }
    }
}

/// Clamp to `[0, 1]`, mapping NaN to `0`.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// One title candidate built from three tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSuggestion {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub used_tag_ids: Vec<String>,
}

/// The aggregate produced by one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub title: String,
    /// Coarse place string (region, prefecture, or city).
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Chronological.
    pub spots: Vec<ResolvedSpot>,
    pub photo_count: usize,
    pub cover_photo_id: Option<String>,
    pub tags: Vec<Tag>,
    pub title_suggestions: Vec<TitleSuggestion>,
}

impl Trip {
    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_id_is_category_and_label() {
        let tag = Tag::new(TagCategory::Season, "Autumn trip", 0.9, "month");
        assert_eq!(tag.id, "season:Autumn trip");
    }

    #[test]
    fn tag_score_is_clamped() {
        assert_eq!(Tag::new(TagCategory::Mood, "x", 1.7, "").score, 1.0);
        assert_eq!(Tag::new(TagCategory::Mood, "x", -0.2, "").score, 0.0);
        assert_eq!(Tag::new(TagCategory::Mood, "x", f64::NAN, "").score, 0.0);
    }

    #[test]
    fn category_parse_round_trips_names() {
        for cat in TagCategory::ALL {
            assert_eq!(cat.as_str().parse::<TagCategory>().unwrap(), cat);
        }
        assert!("weather".parse::<TagCategory>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&TagCategory::Motion).unwrap();
        assert_eq!(json, "\"motion\"");
    }
}
