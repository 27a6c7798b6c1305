//! EXIF container parsing.
//!
//! Reads GPS and timestamp tags from an image container (JPEG, TIFF, HEIF,
//! PNG, WebP) with `kamadak-exif` and hands them to
//! [`tripweave_core::metadata::normalize`].
//!
//! Parsing is attempted twice:
//!
//! 1. **Strict** — the whole EXIF block must parse.
//! 2. **Lenient** — `continue_on_error` keeps every field that did parse and
//!    drops the broken ones.
//!
//! If both fail the photo keeps no location and falls back to the file's
//! modification time. [`extract`] never returns an error.

use std::io::Cursor;

use chrono::{DateTime, FixedOffset};
use exif::{Exif, Field, In, Reader, Tag, Value};
use tracing::debug;

use tripweave_core::metadata::{normalize, RawCoordinate, RawMetadata, TimestampField};
use tripweave_core::models::PhotoRecord;

/// Timestamp tags and the offset tag that qualifies each one.
const TIMESTAMP_TAGS: [(TimestampField, Tag, Option<Tag>); 3] = [
    (
        TimestampField::DateTimeOriginal,
        Tag::DateTimeOriginal,
        Some(Tag::OffsetTimeOriginal),
    ),
    (
        TimestampField::CreateDate,
        Tag::DateTimeDigitized,
        Some(Tag::OffsetTimeDigitized),
    ),
    (TimestampField::DateTime, Tag::DateTime, Some(Tag::OffsetTime)),
];

/// Extract a [`PhotoRecord`] from raw image bytes.
pub fn extract(id: &str, bytes: &[u8], file_modified_at: DateTime<FixedOffset>) -> PhotoRecord {
    let raw = read_metadata(id, bytes);
    normalize(id, raw.as_ref(), file_modified_at)
}

/// Read the raw GPS and timestamp tags, or `None` if no EXIF block parses.
pub fn read_metadata(id: &str, bytes: &[u8]) -> Option<RawMetadata> {
    let exif = match read_strict(bytes) {
        Ok(exif) => exif,
        Err(strict_err) => {
            debug!(photo = id, error = %strict_err, "strict EXIF read failed, retrying leniently");
            match read_lenient(bytes) {
                Ok(exif) => exif,
                Err(e) => {
                    debug!(photo = id, error = %e, "no usable EXIF, using file time");
                    return None;
                }
            }
        }
    };

    Some(to_raw_metadata(&exif))
}

fn read_strict(bytes: &[u8]) -> Result<Exif, exif::Error> {
    Reader::new().read_from_container(&mut Cursor::new(bytes))
}

fn read_lenient(bytes: &[u8]) -> Result<Exif, exif::Error> {
    let mut reader = Reader::new();
    reader.continue_on_error(true);
    match reader.read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Ok(exif),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            debug!(dropped = errors.len(), "kept partially parsed EXIF");
            Ok(exif)
        }
        Err(e) => Err(e),
    }
}

fn to_raw_metadata(exif: &Exif) -> RawMetadata {
    let mut raw = RawMetadata {
        latitude: coordinate(exif, Tag::GPSLatitude),
        latitude_ref: ascii(exif, Tag::GPSLatitudeRef),
        longitude: coordinate(exif, Tag::GPSLongitude),
        longitude_ref: ascii(exif, Tag::GPSLongitudeRef),
        ..Default::default()
    };

    for (field, tag, offset_tag) in TIMESTAMP_TAGS {
        let Some(value) = ascii(exif, tag) else {
            continue;
        };
        let offset = offset_tag.and_then(|t| ascii(exif, t));
        let value = match offset {
            Some(offset) if is_offset(&offset) => format!("{}{}", value, offset),
            _ => value,
        };
        raw.timestamps.insert(field, value);
    }

    raw
}

fn field<'a>(exif: &'a Exif, tag: Tag) -> Option<&'a Field> {
    exif.get_field(tag, In::PRIMARY)
}

/// First ASCII string of a tag, trimmed. Empty strings count as absent.
fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &field(exif, tag)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// A GPS coordinate stored as a DMS rational triple or a single value.
fn coordinate(exif: &Exif, tag: Tag) -> Option<RawCoordinate> {
    let values: Vec<f64> = match &field(exif, tag)?.value {
        Value::Rational(v) => v.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(v) => v.iter().map(|r| r.to_f64()).collect(),
        Value::Double(v) => v.clone(),
        Value::Float(v) => v.iter().map(|f| *f as f64).collect(),
        _ => return None,
    };

    match values.as_slice() {
        [d, m, s, ..] => Some(RawCoordinate::Dms([*d, *m, *s])),
        [dd] => Some(RawCoordinate::Decimal(*dd)),
        _ => None,
    }
}

/// `+09:00`-style offset as written by OffsetTime* tags.
fn is_offset(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 6 && (b[0] == b'+' || b[0] == b'-') && b[3] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use exif::experimental::Writer;
    use exif::Rational;

    fn fallback() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2021-06-01T00:00:00+00:00").unwrap()
    }

    fn ascii_field(tag: Tag, s: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        }
    }

    fn dms_field(tag: Tag, d: u32, m: u32, s_hundredths: u32) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![
                Rational::from((d, 1)),
                Rational::from((m, 1)),
                Rational::from((s_hundredths, 100)),
            ]),
        }
    }

    fn tiff(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    #[test]
    fn garbage_bytes_fall_back_to_file_time() {
        let rec = extract("p1", b"definitely not an image", fallback());
        assert!(rec.location.is_none());
        assert_eq!(rec.captured_at, fallback());
    }

    #[test]
    fn empty_bytes_fall_back_to_file_time() {
        let rec = extract("p1", &[], fallback());
        assert_eq!(rec.captured_at, fallback());
    }

    #[test]
    fn reads_gps_and_original_time() {
        let bytes = tiff(&[
            dms_field(Tag::GPSLatitude, 35, 41, 2220),
            ascii_field(Tag::GPSLatitudeRef, "N"),
            dms_field(Tag::GPSLongitude, 139, 42, 580),
            ascii_field(Tag::GPSLongitudeRef, "E"),
            ascii_field(Tag::DateTimeOriginal, "2024:04:06 13:20:00"),
            ascii_field(Tag::OffsetTimeOriginal, "+09:00"),
        ]);
        let rec = extract("p1", &bytes, fallback());
        let loc = rec.location.expect("location");
        assert!((loc.lat - 35.68950).abs() < 1e-5, "lat {}", loc.lat);
        assert!((loc.lng - 139.70161).abs() < 1e-5, "lng {}", loc.lng);
        assert_eq!(rec.captured_at.hour(), 13);
        assert_eq!(rec.captured_at.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn falls_through_to_generic_datetime() {
        let bytes = tiff(&[ascii_field(Tag::DateTime, "2023:12:24 19:05:00")]);
        let raw = read_metadata("p", &bytes).unwrap();
        assert!(raw.latitude.is_none());
        assert_eq!(
            raw.timestamps.get(&TimestampField::DateTime).map(String::as_str),
            Some("2023:12:24 19:05:00")
        );
        let rec = extract("p", &bytes, fallback());
        assert_eq!(rec.captured_at.hour(), 19);
    }

    #[test]
    fn offset_detection() {
        assert!(is_offset("+09:00"));
        assert!(is_offset("-05:30"));
        assert!(!is_offset("09:00"));
        assert!(!is_offset("+0900"));
    }
}
