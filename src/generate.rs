//! Trip assembly.
//!
//! [`TripGenerator::generate`] runs the whole pipeline for one request:
//!
//! ```text
//! photos ─▶ extract ─▶ cluster ─▶ resolve (batched) ─▶ assemble ─▶ tags
//! ```
//!
//! Everything after input validation degrades instead of failing.
//! Degradations are collected as human-readable warnings in the request's
//! locale and returned next to the trip. Cancelling the token during
//! resolution returns the trip built from whatever spots were resolved.
//!
//! # Trip fields
//!
//! - **dates** — min/max `captured_at` over every photo, as calendar dates.
//! - **location** — first spot's region, else the prefecture in its address,
//!   else its city-level place, else the unknown-location sentinel.
//! - **title** — `{location}・{month}月の旅` / `{location} in {Month}`, or the
//!   unknown-trip title.
//! - **tags** — five tags from trip-level signals; the top three seed
//!   `title_suggestions`.

use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripweave_core::cluster::{cluster_photos, ClusterParams};
use tripweave_core::geo::path_length_km;
use tripweave_core::lexicon::{self, Locale};
use tripweave_core::metadata::{normalize, RawMetadata};
use tripweave_core::models::{PhotoRecord, ResolvedSpot, Tag, Trip, TitleSuggestion};
use tripweave_core::place::extract_prefecture;
use tripweave_core::tags::{synthesize_tags, TagSignals, TAG_COUNT};
use tripweave_core::titles::{synthesize_titles, TITLE_TAG_COUNT};

use crate::config::Config;
use crate::exif;
use crate::progress::{GenerationEvent, ProgressReporter};
use crate::resolver::PlaceResolver;

/// Below this share of geotagged photos a sparse-GPS warning is emitted.
const SPARSE_GPS_RATIO: f64 = 0.3;

/// Where a photo's metadata comes from.
#[derive(Debug, Clone)]
pub enum PhotoSource {
    /// Raw image bytes; EXIF is parsed here.
    Bytes(Vec<u8>),
    /// Metadata already extracted upstream.
    Metadata(RawMetadata),
}

/// One photo in a generation request.
#[derive(Debug, Clone)]
pub struct PhotoInput {
    pub id: String,
    pub source: PhotoSource,
    /// Used when no embedded timestamp parses.
    pub file_modified_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub locale: Locale,
    pub cluster: ClusterParams,
    pub max_photos: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            cluster: ClusterParams::default(),
            max_photos: 500,
        }
    }
}

impl GenerationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            locale: config.generation.locale(),
            cluster: config.clustering.params(),
            max_photos: config.generation.max_photos,
        }
    }
}

/// Output of one generation request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TripGeneration {
    pub trip: Trip,
    pub warnings: Vec<String>,
    pub tags: Vec<Tag>,
    /// Set when the run was cancelled and `trip` is partial.
    pub cancelled: bool,
}

pub struct TripGenerator {
    resolver: PlaceResolver,
    options: GenerationOptions,
}

impl TripGenerator {
    pub fn new(resolver: PlaceResolver, options: GenerationOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Build a trip from `photos`.
    ///
    /// # Errors
    ///
    /// Only malformed input is an error: no photos, more than
    /// `max_photos`, and empty or duplicate photo ids.
    pub async fn generate(
        &self,
        photos: Vec<PhotoInput>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<TripGeneration> {
        validate_input(&photos, self.options.max_photos)?;

        let locale = self.options.locale;
        let total = photos.len();
        let mut warnings = Vec::new();

        // Extraction
        let mut records = Vec::with_capacity(total);
        for (i, photo) in photos.into_iter().enumerate() {
            records.push(extract_record(photo));
            progress.report(GenerationEvent::Extracting {
                n: (i + 1) as u64,
                total: total as u64,
            });
        }

        let geotagged = records.iter().filter(|r| r.location.is_some()).count();
        let gps_ratio = geotagged as f64 / total as f64;
        if geotagged == 0 {
            warnings.push(lexicon::warn_no_gps(locale));
        } else if gps_ratio < SPARSE_GPS_RATIO {
            warnings.push(lexicon::warn_sparse_gps(geotagged, total, locale));
        }
        debug!(total, geotagged, "metadata extracted");

        // Clustering
        progress.report(GenerationEvent::Clustering {
            geotagged: geotagged as u64,
        });
        let clusters = cluster_photos(&records, &self.options.cluster);
        let cluster_count = clusters.len();
        if clusters.is_empty() {
            warn!("no geotagged photos, no spots formed");
            warnings.push(lexicon::warn_no_clusters(locale));
        }
        info!(clusters = cluster_count, "photos clustered");

        // Resolution
        let outcome = self
            .resolver
            .resolve_many(clusters, locale, progress, cancel)
            .await;
        for failure in &outcome.failures {
            warnings.push(lexicon::warn_spot_failed(failure.index, locale));
        }
        if outcome.cancelled {
            warnings.push(lexicon::warn_cancelled(
                outcome.spots.len(),
                cluster_count,
                locale,
            ));
        }
        let spots = outcome.spots;
        if spots.is_empty() {
            warnings.push(lexicon::warn_no_spots(locale));
        }

        // Assembly
        progress.report(GenerationEvent::Assembling);
        let (start_date, end_date) = date_range(&records);
        let location = trip_location(spots.first(), locale);
        let title = if lexicon::is_unknown_location(&location) {
            locale.unknown_trip_title().to_string()
        } else {
            lexicon::trip_title(&location, start_date.month(), locale)
        };

        let signals = TagSignals {
            location: Some(location.clone()),
            first_spot_name: spots.first().map(|s| s.name.clone()),
            first_spot_address: spots.first().map(|s| s.address.clone()),
            first_spot_region: spots.first().map(|s| s.region.clone()),
            start_month: Some(start_date.month()),
            photo_timestamps: Some(records.iter().map(|r| r.captured_at).collect()),
            gps_ratio: Some(gps_ratio),
            distance_km: (spots.len() >= 2).then(|| travel_distance_km(&spots)),
            is_likely_bright: None,
            locale,
        };
        let tags = synthesize_tags(&signals);
        let title_suggestions = suggest_titles(&tags, locale);

        let trip = Trip {
            id: format!("trip-{}", uuid::Uuid::new_v4()),
            title,
            location,
            start_date,
            end_date,
            cover_photo_id: spots.first().and_then(|s| s.representative_photo_id.clone()),
            spots,
            photo_count: total,
            tags: tags.clone(),
            title_suggestions,
        };

        progress.report(GenerationEvent::Complete {
            spots: trip.spot_count() as u64,
            warnings: warnings.len() as u64,
        });
        info!(
            trip = %trip.id,
            spots = trip.spot_count(),
            warnings = warnings.len(),
            cancelled = outcome.cancelled,
            "trip generated"
        );

        Ok(TripGeneration {
            trip,
            warnings,
            tags,
            cancelled: outcome.cancelled,
        })
    }
}

fn validate_input(photos: &[PhotoInput], max_photos: usize) -> Result<()> {
    if photos.is_empty() {
        bail!("No photos supplied");
    }
    if photos.len() > max_photos {
        bail!(
            "Too many photos: {} supplied, at most {} allowed",
            photos.len(),
            max_photos
        );
    }
    let mut seen = HashSet::with_capacity(photos.len());
    for photo in photos {
        if photo.id.trim().is_empty() {
            bail!("Photo id must not be empty");
        }
        if !seen.insert(photo.id.as_str()) {
            bail!("Duplicate photo id: '{}'", photo.id);
        }
    }
    Ok(())
}

fn extract_record(photo: PhotoInput) -> PhotoRecord {
    match &photo.source {
        PhotoSource::Bytes(bytes) => exif::extract(&photo.id, bytes, photo.file_modified_at),
        PhotoSource::Metadata(raw) => normalize(&photo.id, Some(raw), photo.file_modified_at),
    }
}

/// Earliest and latest capture dates. Input is never empty after validation.
fn date_range(records: &[PhotoRecord]) -> (NaiveDate, NaiveDate) {
    // Calendar date as recorded by each photo, in its own offset.
    let dates = || records.iter().map(|r| r.captured_at.date_naive());
    let start = dates().min().unwrap_or_else(|| Utc::now().date_naive());
    let end = dates().max().unwrap_or(start);
    (start, end)
}

/// Coarse trip location from the first spot.
fn trip_location(first: Option<&ResolvedSpot>, locale: Locale) -> String {
    let Some(spot) = first else {
        return locale.unknown_location().to_string();
    };

    let candidates = [
        spot.region.trim(),
        extract_prefecture(&spot.address),
        spot.place.trim(),
    ];
    candidates
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or(locale.unknown_location())
        .to_string()
}

/// Sum of great-circle legs between consecutive spot centroids.
fn travel_distance_km(spots: &[ResolvedSpot]) -> f64 {
    let points: Vec<_> = spots.iter().map(|s| s.centroid).collect();
    path_length_km(&points)
}

fn suggest_titles(tags: &[Tag], locale: Locale) -> Vec<TitleSuggestion> {
    if tags.len() < TAG_COUNT {
        return Vec::new();
    }
    // Tags arrive sorted best first.
    synthesize_titles(&tags[..TITLE_TAG_COUNT], locale).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripweave_core::geo::GeoPoint;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn spot(region: &str, address: &str, place: &str) -> ResolvedSpot {
        ResolvedSpot {
            id: "cluster-1".into(),
            name: "x".into(),
            address: address.into(),
            place: place.into(),
            region: region.into(),
            country: String::new(),
            centroid: GeoPoint::new(35.0, 135.0),
            arrival_time: at("2024-01-01T10:00:00+09:00"),
            departure_time: at("2024-01-01T10:00:00+09:00"),
            photo_ids: vec!["a".into()],
            representative_photo_id: Some("a".into()),
            feature_types: vec![],
        }
    }

    fn input(id: &str) -> PhotoInput {
        PhotoInput {
            id: id.into(),
            source: PhotoSource::Metadata(RawMetadata::default()),
            file_modified_at: at("2024-01-01T00:00:00+00:00"),
        }
    }

    #[test]
    fn location_prefers_region_then_prefecture_then_place() {
        assert_eq!(
            trip_location(Some(&spot("京都府", "大阪府大阪市", "京都市")), Locale::Ja),
            "京都府"
        );
        assert_eq!(
            trip_location(Some(&spot("", "日本、大阪府大阪市北区", "大阪市")), Locale::Ja),
            "大阪府"
        );
        assert_eq!(
            trip_location(Some(&spot(" ", "Main St", "Portland")), Locale::En),
            "Portland"
        );
        assert_eq!(
            trip_location(Some(&spot("", "日本、東京都渋谷区神南1丁目", "")), Locale::Ja),
            "東京都"
        );
        assert_eq!(trip_location(Some(&spot("", "", "")), Locale::En), "Unknown");
        assert_eq!(trip_location(None, Locale::Ja), "不明");
    }

    #[test]
    fn input_validation() {
        assert!(validate_input(&[], 500).is_err());
        assert!(validate_input(&[input("a"), input("a")], 500).is_err());
        assert!(validate_input(&[input(" ")], 500).is_err());
        assert!(validate_input(&[input("a"), input("b"), input("c")], 2).is_err());
        assert!(validate_input(&[input("a"), input("b")], 2).is_ok());
    }

    #[test]
    fn date_range_spans_calendar_days() {
        let rec = |t: &str| PhotoRecord {
            id: t.into(),
            location: None,
            captured_at: at(t),
        };
        let (start, end) = date_range(&[
            rec("2024-03-02T09:00:00+09:00"),
            rec("2024-03-01T23:30:00+09:00"),
            rec("2024-03-04T08:00:00+09:00"),
        ]);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn title_suggestions_need_a_full_tag_set() {
        assert!(suggest_titles(&[], Locale::En).is_empty());
        let tags = synthesize_tags(&TagSignals {
            location: Some("Kyoto".into()),
            start_month: Some(11),
            locale: Locale::En,
            ..Default::default()
        });
        let titles = suggest_titles(&tags, Locale::En);
        assert!(!titles.is_empty());
        assert!(titles.len() <= 3);
        assert!(titles[0].title.contains("Kyoto"));
    }
}
