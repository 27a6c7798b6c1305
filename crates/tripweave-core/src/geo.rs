//! Geographic primitives.
//!
//! Everything here works in WGS84 decimal degrees. Distances use the
//! haversine great-circle formula on a spherical Earth of radius
//! [`EARTH_RADIUS_M`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters used by [`haversine_m`].
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Maximum absolute latitude.
pub const LAT_MAX: f64 = 90.0;

/// Maximum absolute longitude.
pub const LNG_MAX: f64 = 180.0;

/// Divisors for degrees, minutes and seconds, zipped against a DMS triple.
pub const DMS_DIVISION: [f64; 3] = [1.0, 60.0, 3600.0];

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and inside `[-90, 90]` × `[-180, 180]`.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-LAT_MAX..=LAT_MAX).contains(&self.lat)
            && (-LNG_MAX..=LNG_MAX).contains(&self.lng)
    }

    /// Fixed six-decimal `"lat, lng"` rendering used as a fallback address.
    pub fn to_coordinate_string(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Great-circle distance between two points, in meters.
///
/// ```rust
/// use tripweave_core::geo::{haversine_m, GeoPoint};
///
/// let a = GeoPoint::new(0.0, 0.0);
/// assert_eq!(haversine_m(a, a), 0.0);
/// ```
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of consecutive haversine legs along `points`, in kilometers.
pub fn path_length_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .sum::<f64>()
        / 1000.0
}

/// Arithmetic mean of `points`. `None` for an empty slice.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    Some(GeoPoint::new(lat, lng))
}

/// Convert a degrees/minutes/seconds triple to decimal degrees.
///
/// `dd = deg + min/60 + sec/3600`, negated when `reference` is `S` or `W`
/// (case-insensitive, surrounding whitespace ignored).
///
/// ```rust
/// use tripweave_core::geo::convert_dms;
///
/// let lat = convert_dms([35.0, 41.0, 22.2], "N");
/// assert!((lat - 35.68950).abs() < 1e-5);
/// ```
pub fn convert_dms(dms: [f64; 3], reference: &str) -> f64 {
    let dd: f64 = dms
        .iter()
        .zip(DMS_DIVISION.iter())
        .map(|(value, div)| value / div)
        .sum();

    if is_negative_hemisphere(reference) {
        -dd
    } else {
        dd
    }
}

fn is_negative_hemisphere(reference: &str) -> bool {
    matches!(reference.trim().to_ascii_uppercase().as_str(), "S" | "W")
}
