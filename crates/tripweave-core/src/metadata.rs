//! Photo metadata normalization.
//!
//! Container parsing (EXIF, HEIF, …) happens in the application crate and
//! produces a [`RawMetadata`]: loosely-typed tag values exactly as they were
//! read. [`normalize`] turns that into a [`PhotoRecord`] and never fails:
//!
//! - Coordinates arrive as a decimal value or a DMS triple plus an optional
//!   hemisphere reference. DMS is converted with
//!   [`convert_dms`](crate::geo::convert_dms). A pair that is incomplete,
//!   non-finite, or out of range yields `location = None`.
//! - Timestamps are tried in [`TimestampField`] order; the first value that
//!   parses wins. If none parse, the caller-supplied file modification time
//!   is used.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::{convert_dms, GeoPoint};
use crate::models::PhotoRecord;

/// A single coordinate component as found in the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Decimal(f64),
    Dms([f64; 3]),
}

impl RawCoordinate {
    /// Decimal degrees. The reference only applies to DMS triples; decimal
    /// values are taken to be signed already.
    pub fn to_decimal(&self, reference: Option<&str>) -> f64 {
        match self {
            RawCoordinate::Decimal(v) => *v,
            RawCoordinate::Dms(dms) => convert_dms(*dms, reference.unwrap_or_default()),
        }
    }
}

/// Candidate timestamp tags, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimestampField {
    DateTimeOriginal,
    CreateDate,
    DateTime,
    DateCreated,
    ModifyDate,
    CreationDate,
}

/// Metadata read from a photo container, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(default)]
    pub latitude_ref: Option<String>,
    #[serde(default)]
    pub longitude: Option<RawCoordinate>,
    #[serde(default)]
    pub longitude_ref: Option<String>,
    /// Raw timestamp strings keyed by tag. Iteration order is priority order.
    #[serde(default)]
    pub timestamps: BTreeMap<TimestampField, String>,
}

impl RawMetadata {
    /// The validated coordinate pair, if both halves are present and sane.
    pub fn location(&self) -> Option<GeoPoint> {
        let lat = self
            .latitude
            .as_ref()?
            .to_decimal(self.latitude_ref.as_deref());
        let lng = self
            .longitude
            .as_ref()?
            .to_decimal(self.longitude_ref.as_deref());
        let point = GeoPoint::new(lat, lng);
        point.is_valid().then_some(point)
    }

    /// The first timestamp, in priority order, that parses.
    pub fn captured_at(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamps
            .values()
            .find_map(|value| parse_timestamp(value))
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none() && self.timestamps.is_empty()
    }
}

/// Build a [`PhotoRecord`] from optional raw metadata.
///
/// `raw = None` means container parsing failed entirely; the result then has
/// no location and `captured_at = file_modified_at`.
pub fn normalize(
    id: &str,
    raw: Option<&RawMetadata>,
    file_modified_at: DateTime<FixedOffset>,
) -> PhotoRecord {
    let location = raw.and_then(RawMetadata::location);
    let captured_at = raw
        .and_then(RawMetadata::captured_at)
        .unwrap_or(file_modified_at);

    PhotoRecord {
        id: id.to_string(),
        location,
        captured_at,
    }
}

const OFFSET_FORMATS: [&str; 3] = [
    "%Y:%m:%d %H:%M:%S%:z",
    "%Y:%m:%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
];

const NAIVE_FORMATS: [&str; 5] = [
    "%Y:%m:%d %H:%M:%S",
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an EXIF-style or ISO-8601 timestamp.
///
/// Values without an offset are kept as wall-clock time at `+00:00`, so the
/// hour and calendar date read exactly as the camera recorded them.
///
/// ```rust
/// use chrono::Timelike;
/// use tripweave_core::metadata::parse_timestamp;
///
/// let t = parse_timestamp("2024:01:15 10:30:45").unwrap();
/// assert_eq!(t.hour(), 10);
/// assert!(parse_timestamp("0000:00:00 00:00:00").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let s = value.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    let utc = FixedOffset::east_opt(0)?;
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .and_then(|naive| utc.from_local_datetime(&naive).single())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn fallback() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2020-05-05T12:00:00+00:00").unwrap()
    }

    #[test]
    fn no_metadata_falls_back_to_file_time() {
        let rec = normalize("p1", None, fallback());
        assert_eq!(rec.id, "p1");
        assert!(rec.location.is_none());
        assert_eq!(rec.captured_at, fallback());
    }

    #[test]
    fn dms_pair_with_references() {
        let raw = RawMetadata {
            latitude: Some(RawCoordinate::Dms([35.0, 41.0, 22.2])),
            latitude_ref: Some("N".into()),
            longitude: Some(RawCoordinate::Dms([139.0, 42.0, 5.8])),
            longitude_ref: Some("W".into()),
            ..Default::default()
        };
        let loc = raw.location().unwrap();
        assert!((loc.lat - 35.68950).abs() < 1e-5);
        assert!((loc.lng + 139.70161).abs() < 1e-5);
    }

    #[test]
    fn decimal_pair_is_taken_as_signed() {
        let raw = RawMetadata {
            latitude: Some(RawCoordinate::Decimal(-33.8568)),
            latitude_ref: Some("S".into()),
            longitude: Some(RawCoordinate::Decimal(151.2153)),
            ..Default::default()
        };
        let loc = raw.location().unwrap();
        assert_eq!(loc.lat, -33.8568);
        assert_eq!(loc.lng, 151.2153);
    }

    #[test]
    fn half_a_pair_is_no_location() {
        let raw = RawMetadata {
            latitude: Some(RawCoordinate::Decimal(35.0)),
            ..Default::default()
        };
        assert!(raw.location().is_none());
    }

    #[test]
    fn out_of_range_is_no_location() {
        let raw = RawMetadata {
            latitude: Some(RawCoordinate::Decimal(95.0)),
            longitude: Some(RawCoordinate::Decimal(10.0)),
            ..Default::default()
        };
        assert!(raw.location().is_none());

        let raw = RawMetadata {
            latitude: Some(RawCoordinate::Decimal(f64::NAN)),
            longitude: Some(RawCoordinate::Decimal(10.0)),
            ..Default::default()
        };
        assert!(raw.location().is_none());
    }

    #[test]
    fn timestamp_priority_order() {
        let mut raw = RawMetadata::default();
        raw.timestamps
            .insert(TimestampField::ModifyDate, "2024:03:01 09:00:00".into());
        raw.timestamps
            .insert(TimestampField::DateTimeOriginal, "2024:02:01 08:00:00".into());
        let t = raw.captured_at().unwrap();
        assert_eq!(t.month(), 2);
        assert_eq!(t.hour(), 8);
    }

    #[test]
    fn unparseable_candidates_are_skipped() {
        let mut raw = RawMetadata::default();
        raw.timestamps
            .insert(TimestampField::DateTimeOriginal, "garbage".into());
        raw.timestamps
            .insert(TimestampField::CreateDate, "0000:00:00 00:00:00".into());
        raw.timestamps
            .insert(TimestampField::DateTime, "2023-07-14T18:45:00".into());
        let rec = normalize("p", Some(&raw), fallback());
        assert_eq!(rec.captured_at.day(), 14);
        assert_eq!(rec.captured_at.hour(), 18);
    }

    #[test]
    fn all_candidates_bad_uses_fallback() {
        let mut raw = RawMetadata::default();
        raw.timestamps
            .insert(TimestampField::DateTimeOriginal, "".into());
        let rec = normalize("p", Some(&raw), fallback());
        assert_eq!(rec.captured_at, fallback());
    }

    #[test]
    fn offsets_are_preserved() {
        let t = parse_timestamp("2024:01:15 10:30:45+09:00").unwrap();
        assert_eq!(t.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(t.hour(), 10);

        let t = parse_timestamp("2024-01-15T10:30:45Z").unwrap();
        assert_eq!(t.hour(), 10);
    }

    #[test]
    fn quoted_exif_value() {
        assert!(parse_timestamp("\"2024:01:15 10:30:45\"").is_some());
    }

    #[test]
    fn raw_metadata_from_json() {
        let raw: RawMetadata = serde_json::from_str(
            r#"{
                "latitude": [35, 0, 0],
                "latitude_ref": "N",
                "longitude": 135.5,
                "timestamps": {"DateTimeOriginal": "2024:01:15 10:30:45"}
            }"#,
        )
        .unwrap();
        let loc = raw.location().unwrap();
        assert_eq!(loc.lat, 35.0);
        assert_eq!(loc.lng, 135.5);
        assert!(raw.captured_at().is_some());
    }
}
