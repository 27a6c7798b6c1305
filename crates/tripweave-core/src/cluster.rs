//! Greedy single-pass spatio-temporal clustering.
//!
//! Photos are grouped into spots by scanning them once in capture order.
//!
//! # Algorithm
//!
//! 1. Keep only photos with a location (every record has a timestamp).
//! 2. Stable-sort by `captured_at` ascending; ties keep input order.
//! 3. Open a cluster with the first photo.
//! 4. For each following photo `p`:
//!    - `distance` = haversine from `p` to the current cluster centroid;
//!    - `elapsed` = minutes since the *previous photo* (not the cluster start).
//!    - If `distance > distance_threshold_m` or `elapsed > time_threshold_min`,
//!      close the cluster and open a new one at `p`.
//!    - Otherwise append `p` and recompute the centroid as the mean of every
//!      member coordinate.
//! 5. Close the last cluster. Ids are `cluster-1`, `cluster-2`, ….
//!
//! Both thresholds are exclusive: a photo exactly at the threshold joins.
//! The scan is order-dependent and must stay sequential.

use crate::geo::{centroid, haversine_m, GeoPoint};
use crate::models::{Cluster, PhotoRecord};

/// Thresholds for [`cluster_photos`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub distance_threshold_m: f64,
    pub time_threshold_min: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            distance_threshold_m: 200.0,
            time_threshold_min: 30.0,
        }
    }
}

/// Group geotagged photos into time-ordered clusters.
///
/// Photos without a location are excluded. Returns an empty list when no
/// photo has one.
///
/// ```rust
/// use chrono::DateTime;
/// use tripweave_core::cluster::{cluster_photos, ClusterParams};
/// use tripweave_core::geo::GeoPoint;
/// use tripweave_core::models::PhotoRecord;
///
/// let t = DateTime::parse_from_rfc3339("2024-04-01T10:00:00+09:00").unwrap();
/// let photos = vec![PhotoRecord {
///     id: "a".into(),
///     location: Some(GeoPoint::new(35.0, 135.0)),
///     captured_at: t,
/// }];
/// let clusters = cluster_photos(&photos, &ClusterParams::default());
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].id, "cluster-1");
/// ```
pub fn cluster_photos(photos: &[PhotoRecord], params: &ClusterParams) -> Vec<Cluster> {
    let mut candidates: Vec<(&PhotoRecord, GeoPoint)> = photos
        .iter()
        .filter_map(|p| p.location.map(|loc| (p, loc)))
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    candidates.sort_by_key(|(p, _)| p.captured_at);

    let mut clusters = Vec::new();
    let mut current = ClusterBuilder::start(candidates[0].0, candidates[0].1);

    for pair in candidates.windows(2) {
        let (prev, _) = pair[0];
        let (photo, point) = pair[1];

        let distance = haversine_m(current.centroid, point);
        let elapsed_min =
            (photo.captured_at - prev.captured_at).num_milliseconds() as f64 / 60_000.0;

        if distance > params.distance_threshold_m || elapsed_min > params.time_threshold_min {
            let finished = std::mem::replace(&mut current, ClusterBuilder::start(photo, point));
            clusters.push(finished.finish(clusters.len() + 1));
        } else {
            current.push(photo, point);
        }
    }

    clusters.push(current.finish(clusters.len() + 1));
    clusters
}

struct ClusterBuilder<'a> {
    members: Vec<&'a PhotoRecord>,
    points: Vec<GeoPoint>,
    centroid: GeoPoint,
}

impl<'a> ClusterBuilder<'a> {
    fn start(photo: &'a PhotoRecord, point: GeoPoint) -> Self {
        Self {
            members: vec![photo],
            points: vec![point],
            centroid: point,
        }
    }

    fn push(&mut self, photo: &'a PhotoRecord, point: GeoPoint) {
        self.members.push(photo);
        self.points.push(point);
        // Full recompute keeps the centroid exactly the mean of all members.
        if let Some(c) = centroid(&self.points) {
            self.centroid = c;
        }
    }

    fn finish(self, index: usize) -> Cluster {
        // Members are in time order, so first/last are the extremes.
        let arrival_time = self.members[0].captured_at;
        let departure_time = self.members[self.members.len() - 1].captured_at;

        Cluster {
            id: format!("cluster-{}", index),
            centroid: self.centroid,
            arrival_time,
            departure_time,
            members: self.members.iter().map(|p| p.id.clone()).collect(),
        }
    }
}
