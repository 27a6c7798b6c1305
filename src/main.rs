//! # Tripweave CLI (`tripweave`)
//!
//! ## Usage
//!
//! ```bash
//! tripweave --config ./config/tripweave.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tripweave generate <dir>` | Build a trip from every photo under a directory |
//! | `tripweave exif <file>` | Show the location and capture time read from one photo |
//! | `tripweave geocode <lat> <lng>` | Resolve one coordinate to a place |
//! | `tripweave titles <tag> <tag> <tag>` | Suggest titles from three `category:label` tags |
//!
//! A missing config file is not an error; built-in defaults apply.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripweave::config::{self, Config};
use tripweave::generate::{GenerationOptions, TripGeneration, TripGenerator};
use tripweave::geocoding::create_lookup;
use tripweave::photos::{read_photo, scan_photos};
use tripweave::progress::ProgressMode;
use tripweave::resolver::PlaceResolver;
use tripweave_core::geo::GeoPoint;
use tripweave_core::lexicon::Locale;
use tripweave_core::models::{Tag, TagCategory};
use tripweave_core::titles::synthesize_titles;

/// Tripweave CLI — turn a folder of photos into a trip record.
#[derive(Parser)]
#[command(
    name = "tripweave",
    about = "Tripweave — turn a folder of photos into a trip record",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tripweave.toml`. Clustering thresholds,
    /// geocoding provider and generation limits are read from this file.
    #[arg(long, global = true, default_value = "./config/tripweave.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a trip from every photo under a directory.
    ///
    /// Prints the trip, its warnings and its tags. Ctrl-C stops place
    /// resolution and prints the partial trip.
    Generate {
        /// Directory to scan for photos.
        dir: PathBuf,

        /// Output language (`ja` or `en`). Overrides `generation.locale`.
        #[arg(long)]
        locale: Option<String>,

        /// Print the result as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Progress on stderr: `off`, `human` or `json`. Defaults to human on a TTY.
        #[arg(long)]
        progress: Option<String>,

        /// Extra glob patterns to skip, relative to `dir`.
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },

    /// Show the location and capture time read from one photo.
    Exif {
        /// Image file.
        file: PathBuf,
    },

    /// Resolve one coordinate to a place through the configured provider.
    Geocode {
        lat: f64,
        lng: f64,

        #[arg(long)]
        locale: Option<String>,
    },

    /// Suggest titles from exactly three `category:label` tags.
    Titles {
        /// Tags such as `place:Kyoto`, `season:Autumn trip`, `mood:Quiet`.
        #[arg(num_args = 3, required = true)]
        tags: Vec<String>,

        #[arg(long)]
        locale: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripweave=info,tripweave_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Generate {
            dir,
            locale,
            json,
            progress,
            exclude,
        } => {
            run_generate(&cfg, &dir, locale.as_deref(), json, progress.as_deref(), &exclude)
                .await?;
        }
        Commands::Exif { file } => {
            run_exif(&file)?;
        }
        Commands::Geocode { lat, lng, locale } => {
            run_geocode(&cfg, lat, lng, locale.as_deref()).await?;
        }
        Commands::Titles { tags, locale } => {
            run_titles(&cfg, &tags, locale.as_deref())?;
        }
    }

    Ok(())
}

fn locale_or_config(cfg: &Config, locale: Option<&str>) -> Locale {
    locale
        .map(Locale::parse)
        .unwrap_or_else(|| cfg.generation.locale())
}

async fn run_generate(
    cfg: &Config,
    dir: &Path,
    locale: Option<&str>,
    json: bool,
    progress: Option<&str>,
    exclude: &[String],
) -> Result<()> {
    let mode = match progress {
        Some(s) => ProgressMode::parse(s)?,
        None => ProgressMode::default_for_tty(),
    };
    let reporter = mode.reporter();

    let files = scan_photos(dir, exclude)?;
    if files.is_empty() {
        bail!("No photos found under {}", dir.display());
    }
    if files.len() > cfg.generation.max_photos {
        bail!(
            "Too many photos: {} found under {}, at most {} allowed",
            files.len(),
            dir.display(),
            cfg.generation.max_photos
        );
    }
    info!(photos = files.len(), dir = %dir.display(), "scanned photo directory");

    let photos = files
        .iter()
        .map(read_photo)
        .collect::<Result<Vec<_>>>()?;

    let lookup = create_lookup(&cfg.geocoding)?;
    let resolver = PlaceResolver::from_config(lookup, &cfg.geocoding);
    let mut options = GenerationOptions::from_config(cfg);
    options.locale = locale_or_config(cfg, locale);
    let generator = TripGenerator::new(resolver, options);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing with resolved spots");
                cancel.cancel();
            }
        })
    };

    let result = generator.generate(photos, reporter.as_ref(), &cancel).await;
    ctrl_c.abort();
    let generation = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&generation)?);
    } else {
        print_generation(&generation);
    }
    Ok(())
}

fn print_generation(generation: &TripGeneration) {
    let trip = &generation.trip;
    println!("{}", trip.title);
    println!(
        "  {}  {} → {}  ({} photos, {} spots)",
        trip.location,
        trip.start_date,
        trip.end_date,
        trip.photo_count,
        trip.spot_count()
    );

    if !trip.spots.is_empty() {
        println!();
        for (i, spot) in trip.spots.iter().enumerate() {
            println!(
                "{}. {}  [{}]",
                i + 1,
                spot.name,
                spot.arrival_time.format("%Y-%m-%d %H:%M")
            );
            println!("     {}  ({} photos)", spot.address, spot.photo_ids.len());
        }
    }

    if !generation.tags.is_empty() {
        println!();
        let labels: Vec<String> = generation
            .tags
            .iter()
            .map(|t| format!("#{}", t.label))
            .collect();
        println!("{}", labels.join(" "));
    }

    if !trip.title_suggestions.is_empty() {
        println!();
        for suggestion in &trip.title_suggestions {
            match &suggestion.subtitle {
                Some(sub) => println!("- {} / {}", suggestion.title, sub),
                None => println!("- {}", suggestion.title),
            }
        }
    }

    if !generation.warnings.is_empty() {
        println!();
        for warning in &generation.warnings {
            println!("warning: {}", warning);
        }
    }
}

fn run_exif(file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read photo: {}", file.display()))?;
    let modified = std::fs::metadata(file)?
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let modified = chrono::DateTime::<chrono::Utc>::from(modified).fixed_offset();

    let id = file.to_string_lossy();
    let raw = tripweave::exif::read_metadata(&id, &bytes);
    let record = tripweave::exif::extract(&id, &bytes, modified);

    let output = serde_json::json!({
        "id": record.id,
        "location": record.location,
        "captured_at": record.captured_at.to_rfc3339(),
        "has_exif": raw.as_ref().is_some_and(|r| !r.is_empty()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_geocode(cfg: &Config, lat: f64, lng: f64, locale: Option<&str>) -> Result<()> {
    let locale = locale_or_config(cfg, locale);
    let lookup = create_lookup(&cfg.geocoding)?;
    let resolver = PlaceResolver::from_config(lookup, &cfg.geocoding);
    let resolution = resolver.resolve(GeoPoint::new(lat, lng), locale).await;
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

fn run_titles(cfg: &Config, args: &[String], locale: Option<&str>) -> Result<()> {
    let locale = locale_or_config(cfg, locale);
    let tags = args
        .iter()
        .map(|s| parse_tag(s))
        .collect::<Result<Vec<_>>>()?;

    for suggestion in synthesize_titles(&tags, locale)? {
        match suggestion.subtitle {
            Some(sub) => println!("{}\t{}", suggestion.title, sub),
            None => println!("{}", suggestion.title),
        }
    }
    Ok(())
}

/// Parse `category:label` into a tag with full score.
fn parse_tag(arg: &str) -> Result<Tag> {
    let (category, label) = arg
        .split_once(':')
        .with_context(|| format!("Invalid tag '{}': expected category:label", arg))?;
    let category: TagCategory = category.parse()?;
    let label = label.trim();
    if label.is_empty() {
        bail!("Invalid tag '{}': label is empty", arg);
    }
    Ok(Tag::new(category, label, 1.0, "cli"))
}
