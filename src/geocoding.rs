//! Reverse-geocoding clients.
//!
//! Implements [`PlaceLookup`] for the configured provider:
//! - **[`MapboxLookup`]** — Mapbox-compatible v5 places endpoint over `reqwest`.
//! - **[`DisabledLookup`]** — no network I/O; returns no candidates, so every
//!   spot degrades to its coordinate string.
//!
//! # Request
//!
//! ```text
//! GET {base_url}/{lng},{lat}.json
//!     ?access_token=…&language={ja|en}
//!     &types=poi,neighborhood,locality,place,region,address
//!     &limit={limit}
//! ```
//!
//! # Failures
//!
//! Every failure is an `Err` for the resolver to degrade on; nothing here
//! retries:
//! - missing token, or a token not starting with `pk.`/`sk.`
//! - transport error or client-side timeout
//! - non-2xx status
//! - a content type that is not JSON
//! - a body that does not match the expected shape

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use tripweave_core::geo::GeoPoint;
use tripweave_core::lexicon::Locale;
use tripweave_core::place::{ContextEntry, GeocodeFeature, PlaceLookup, PlaceType};

use crate::config::GeocodingConfig;

/// Lookup that never touches the network.
///
/// Used when `geocoding.provider = "disabled"`.
pub struct DisabledLookup;

#[async_trait]
impl PlaceLookup for DisabledLookup {
    async fn lookup(&self, _point: GeoPoint, _locale: Locale) -> Result<Vec<GeocodeFeature>> {
        Ok(Vec::new())
    }
}

// ============ Mapbox ============

/// Client for a Mapbox-compatible reverse-geocoding endpoint.
pub struct MapboxLookup {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    limit: u32,
}

impl MapboxLookup {
    /// Build a client reading the token from `config.token_env`.
    ///
    /// A missing token is not an error here; lookups fail instead, so
    /// generation still completes with coordinate addresses.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).ok();
        if token.is_none() {
            tracing::warn!(
                env = %config.token_env,
                "geocoding token not set; spots will use coordinate addresses"
            );
        }
        Self::with_token(config, token)
    }

    pub fn with_token(config: &GeocodingConfig, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.map(|t| t.trim().to_string()),
            limit: config.limit,
        })
    }

    fn token(&self) -> Result<&str> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            bail!("Geocoding token is not configured");
        };
        if !token.starts_with("pk.") && !token.starts_with("sk.") {
            bail!("Invalid geocoding token format: must start with 'pk.' or 'sk.'");
        }
        Ok(token)
    }

    fn url(&self, point: GeoPoint) -> String {
        format!("{}/{},{}.json", self.base_url, point.lng, point.lat)
    }
}

#[async_trait]
impl PlaceLookup for MapboxLookup {
    async fn lookup(&self, point: GeoPoint, locale: Locale) -> Result<Vec<GeocodeFeature>> {
        let token = self.token()?;
        let types = PlaceType::query_types();
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(self.url(point))
            .header("Accept", "application/json")
            .query(&[
                ("access_token", token),
                ("language", locale.as_str()),
                ("types", types.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("Geocoding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!(
                "Geocoding API error {}: {}",
                status,
                truncate(&body_text, 200)
            );
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("json") {
            bail!("Unexpected geocoding content-type: '{}'", content_type);
        }

        let body: MapboxResponse = response
            .json()
            .await
            .context("Invalid geocoding response body")?;

        debug!(
            lat = point.lat,
            lng = point.lng,
            features = body.features.len(),
            "geocoding response"
        );

        Ok(body.features.into_iter().map(GeocodeFeature::from).collect())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============ Wire format ============

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    place_type: Vec<PlaceType>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
    #[serde(default)]
    context: Vec<MapboxContext>,
}

#[derive(Debug, Deserialize)]
struct MapboxContext {
    #[serde(default)]
    id: String,
    #[serde(default)]
    text: Option<String>,
}

impl From<MapboxFeature> for GeocodeFeature {
    fn from(f: MapboxFeature) -> Self {
        let properties_name = f
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string);

        GeocodeFeature {
            label: f.text.unwrap_or_default(),
            full_address: f.place_name.unwrap_or_default(),
            place_types: f.place_type,
            properties_name,
            context: f
                .context
                .into_iter()
                .map(|c| ContextEntry {
                    id: c.id,
                    text: c.text.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Create the [`PlaceLookup`] for the configured provider.
///
/// | Config Value | Lookup |
/// |-------------|--------|
/// | `"disabled"` | [`DisabledLookup`] |
/// | `"mapbox"` | [`MapboxLookup`] |
pub fn create_lookup(config: &GeocodingConfig) -> Result<Arc<dyn PlaceLookup>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledLookup)),
        "mapbox" => Ok(Arc::new(MapboxLookup::new(config)?)),
        other => bail!("Unknown geocoding provider: {}", other),
    }
}
