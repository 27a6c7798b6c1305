//! # Tripweave
//!
//! Turns a folder of photos into a structured trip record.
//!
//! Tripweave reads GPS and capture time from each photo, groups photos taken
//! close together in space and time into spots, resolves each spot to a
//! human-readable place through a reverse-geocoding provider, and assembles
//! a trip with a date range, a location, a title, descriptive tags and
//! alternative title suggestions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  Photos  │──▶│   EXIF    │──▶│  Cluster  │──▶│ Resolver │
//! │ dir/bytes│   │ GPS+time  │   │ 200m/30min│   │ batches  │
//! └──────────┘   └───────────┘   └───────────┘   └────┬─────┘
//!                                                     │
//!                               ┌─────────────────────┘
//!                               ▼
//!                         ┌───────────┐   ┌────────────┐
//!                         │ Assembler │──▶│ Tags/Titles│
//!                         └───────────┘   └────────────┘
//! ```
//!
//! Pure stages (clustering, place picking, tags, titles) live in
//! `tripweave-core`; this crate adds I/O, configuration and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! export MAPBOX_TOKEN=pk....
//! tripweave generate ~/Pictures/kyoto --locale en
//! tripweave titles "place:Kyoto" "season:Autumn trip" "time:Evening walk"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`exif`] | EXIF container parsing |
//! | [`photos`] | Photo directory scanning |
//! | [`geocoding`] | Reverse-geocoding clients |
//! | [`resolver`] | Timeout, degradation and batching of lookups |
//! | [`generate`] | Trip assembly |
//! | [`progress`] | Progress reporting |

pub mod config;
pub mod exif;
pub mod generate;
pub mod geocoding;
pub mod photos;
pub mod progress;
pub mod resolver;
