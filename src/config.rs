use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use tripweave_core::cluster::ClusterParams;
use tripweave_core::lexicon::Locale;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClusteringConfig {
    #[serde(default = "default_distance_threshold_m")]
    pub distance_threshold_m: f64,
    #[serde(default = "default_time_threshold_min")]
    pub time_threshold_min: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            distance_threshold_m: default_distance_threshold_m(),
            time_threshold_min: default_time_threshold_min(),
        }
    }
}

impl ClusteringConfig {
    pub fn params(&self) -> ClusterParams {
        ClusterParams {
            distance_threshold_m: self.distance_threshold_m,
            time_threshold_min: self.time_threshold_min,
        }
    }
}

fn default_distance_threshold_m() -> f64 {
    200.0
}
fn default_time_threshold_min() -> f64 {
    30.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            limit: default_limit(),
        }
    }
}

impl GeocodingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_provider() -> String {
    "mapbox".to_string()
}
fn default_base_url() -> String {
    "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string()
}
fn default_token_env() -> String {
    "MAPBOX_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_batch_size() -> usize {
    5
}
fn default_limit() -> u32 {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_photos: default_max_photos(),
            locale: default_locale(),
        }
    }
}

impl GenerationConfig {
    pub fn locale(&self) -> Locale {
        Locale::parse(&self.locale)
    }
}

fn default_max_photos() -> usize {
    500
}
fn default_locale() -> String {
    "ja".to_string()
}

/// Read and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate clustering
    if !(config.clustering.distance_threshold_m > 0.0) {
        anyhow::bail!("clustering.distance_threshold_m must be > 0");
    }
    if !(config.clustering.time_threshold_min > 0.0) {
        anyhow::bail!("clustering.time_threshold_min must be > 0");
    }

    // Validate geocoding
    match config.geocoding.provider.as_str() {
        "disabled" | "mapbox" => {}
        other => anyhow::bail!(
            "Unknown geocoding provider: '{}'. Must be mapbox or disabled.",
            other
        ),
    }
    if config.geocoding.batch_size == 0 {
        anyhow::bail!("geocoding.batch_size must be >= 1");
    }
    if config.geocoding.timeout_secs == 0 {
        anyhow::bail!("geocoding.timeout_secs must be >= 1");
    }
    if config.geocoding.limit == 0 {
        anyhow::bail!("geocoding.limit must be >= 1");
    }
    if config.geocoding.is_enabled() && config.geocoding.base_url.trim().is_empty() {
        anyhow::bail!(
            "geocoding.base_url must be set when provider is '{}'",
            config.geocoding.provider
        );
    }

    // Validate generation
    if config.generation.max_photos == 0 {
        anyhow::bail!("generation.max_photos must be >= 1");
    }
    match config.generation.locale.as_str() {
        "ja" | "en" => {}
        other => anyhow::bail!("Unknown locale: '{}'. Must be ja or en.", other),
    }

    Ok(())
}
