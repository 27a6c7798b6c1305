//! Place resolution with timeout, degradation, and batching.
//!
//! [`PlaceResolver::resolve`] wraps a [`PlaceLookup`] call and never fails:
//!
//! | Situation | `name` | `address` |
//! |-----------|--------|-----------|
//! | out-of-range / non-finite point (no lookup) | unknown spot | invalid coordinates |
//! | timeout, transport, status or parse error | unknown spot | `"lat, lng"` |
//! | empty candidate list | unknown spot | `"lat, lng"` |
//! | candidates, none in a known tier | unknown spot | empty |
//! | tier matched | feature name | full address, else `"lat, lng"` |
//!
//! A matched place without city context takes the municipality parsed from
//! its address.
//!
//! [`PlaceResolver::resolve_many`] turns clusters into spots in fixed-size
//! batches. Batches run one after another; the members of a batch run
//! concurrently as separate tasks. A member that fails (bad centroid, or a
//! panicking task) becomes a [`SpotWarning`] and is dropped; its siblings
//! are unaffected. Cancelling the token abandons in-flight lookups and
//! leaves the remaining clusters unresolved.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripweave_core::geo::GeoPoint;
use tripweave_core::lexicon::Locale;
use tripweave_core::models::{Cluster, PlaceResolution, ResolvedSpot};
use tripweave_core::place::{extract_city, pick_place, PlaceLookup};

use crate::config::GeocodingConfig;
use crate::progress::{GenerationEvent, ProgressReporter};

/// A cluster that could not be turned into a spot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotWarning {
    pub cluster_id: String,
    /// 1-based position of the cluster in time order.
    pub index: usize,
    pub reason: String,
}

/// Result of [`PlaceResolver::resolve_many`].
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Resolved spots in cluster order.
    pub spots: Vec<ResolvedSpot>,
    /// Failed clusters in cluster order.
    pub failures: Vec<SpotWarning>,
    /// Set when the run was cancelled before every cluster was attempted.
    pub cancelled: bool,
    /// Clusters not attempted or abandoned because of cancellation.
    pub skipped: usize,
}

pub struct PlaceResolver {
    lookup: Arc<dyn PlaceLookup>,
    timeout: Duration,
    batch_size: usize,
}

impl PlaceResolver {
    pub fn new(lookup: Arc<dyn PlaceLookup>, timeout: Duration, batch_size: usize) -> Self {
        Self {
            lookup,
            timeout,
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(lookup: Arc<dyn PlaceLookup>, config: &GeocodingConfig) -> Self {
        Self::new(lookup, config.timeout(), config.batch_size)
    }

    /// Resolve one coordinate. Degrades instead of failing.
    pub async fn resolve(&self, point: GeoPoint, locale: Locale) -> PlaceResolution {
        resolve_point(self.lookup.as_ref(), self.timeout, point, locale).await
    }

    /// Resolve every cluster into a spot, `batch_size` at a time.
    pub async fn resolve_many(
        &self,
        clusters: Vec<Cluster>,
        locale: Locale,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let total = clusters.len();
        let mut outcome = BatchOutcome::default();
        let mut done = 0usize;

        let mut remaining = clusters.into_iter().enumerate().peekable();
        while remaining.peek().is_some() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                outcome.skipped += remaining.count();
                break;
            }

            let batch: Vec<(usize, Cluster)> = remaining.by_ref().take(self.batch_size).collect();
            let batch_len = batch.len();
            debug!(
                from = done + 1,
                to = done + batch_len,
                total,
                "resolving batch"
            );

            let ids: Vec<(usize, String)> = batch
                .iter()
                .map(|(i, c)| (i + 1, c.id.clone()))
                .collect();

            let mut handles: Vec<_> = batch
                .into_iter()
                .map(|(_, cluster)| {
                    let lookup = Arc::clone(&self.lookup);
                    let timeout = self.timeout;
                    tokio::spawn(resolve_cluster(lookup, timeout, cluster, locale))
                })
                .collect();

            let results = tokio::select! {
                results = join_all(handles.iter_mut()) => Some(results),
                _ = cancel.cancelled() => None,
            };

            let Some(results) = results else {
                for handle in &handles {
                    handle.abort();
                }
                outcome.cancelled = true;
                outcome.skipped += batch_len + remaining.count();
                info!(resolved = outcome.spots.len(), total, "place resolution cancelled");
                break;
            };

            for ((index, cluster_id), joined) in ids.into_iter().zip(results) {
                let result = joined.unwrap_or_else(|e| Err(format!("resolution task failed: {}", e)));
                match result {
                    Ok(spot) => outcome.spots.push(spot),
                    Err(reason) => {
                        warn!(cluster = %cluster_id, index, %reason, "dropping cluster");
                        outcome.failures.push(SpotWarning {
                            cluster_id,
                            index,
                            reason,
                        });
                    }
                }
            }

            done += batch_len;
            progress.report(GenerationEvent::Resolving {
                done: done as u64,
                total: total as u64,
            });
        }

        outcome
    }
}

async fn resolve_cluster(
    lookup: Arc<dyn PlaceLookup>,
    timeout: Duration,
    cluster: Cluster,
    locale: Locale,
) -> Result<ResolvedSpot, String> {
    if cluster.members.is_empty() {
        return Err(format!("{} has no photos", cluster.id));
    }
    let centroid = cluster.centroid;
    if !centroid.lat.is_finite() || !centroid.lng.is_finite() {
        return Err(format!("{} has a non-finite centroid", cluster.id));
    }

    let resolution = resolve_point(lookup.as_ref(), timeout, centroid, locale).await;
    Ok(ResolvedSpot::from_cluster(cluster, resolution))
}

async fn resolve_point(
    lookup: &dyn PlaceLookup,
    timeout: Duration,
    point: GeoPoint,
    locale: Locale,
) -> PlaceResolution {
    if !point.is_valid() {
        warn!(lat = point.lat, lng = point.lng, "invalid coordinates, skipping lookup");
        return PlaceResolution {
            name: locale.unknown_spot().to_string(),
            address: locale.invalid_coordinates().to_string(),
            ..Default::default()
        };
    }

    let coordinate_fallback = || PlaceResolution {
        name: locale.unknown_spot().to_string(),
        address: point.to_coordinate_string(),
        ..Default::default()
    };

    let features = match tokio::time::timeout(timeout, lookup.lookup(point, locale)).await {
        Ok(Ok(features)) => features,
        Ok(Err(e)) => {
            warn!(lat = point.lat, lng = point.lng, error = %e, "place lookup failed");
            return coordinate_fallback();
        }
        Err(_) => {
            warn!(
                lat = point.lat,
                lng = point.lng,
                timeout_ms = timeout.as_millis() as u64,
                "place lookup timed out"
            );
            return coordinate_fallback();
        }
    };

    if features.is_empty() {
        debug!(lat = point.lat, lng = point.lng, "no place candidates");
        return coordinate_fallback();
    }

    match pick_place(&features, locale) {
        Some(mut picked) => {
            if picked.place.is_empty() {
                picked.place = extract_city(&picked.address).to_string();
            }
            if picked.address.is_empty() {
                picked.address = point.to_coordinate_string();
            }
            picked
        }
        None => PlaceResolution {
            name: locale.unknown_spot().to_string(),
            feature_types: features
                .iter()
                .flat_map(|f| f.place_types.iter().map(|t| t.as_str().to_string()))
                .collect(),
            ..Default::default()
        },
    }
}
