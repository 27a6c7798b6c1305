//! # tripweave core
//!
//! Runtime-free logic for turning a set of photos into a trip: metadata
//! normalization, spatio-temporal clustering, reverse-geocode candidate
//! selection, and tag/title synthesis.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or other
//! native-only dependencies. The only outward seam is the
//! [`PlaceLookup`](place::PlaceLookup) trait, implemented by the
//! application crate (and by test doubles).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geo`] | Coordinates, haversine distance, DMS conversion |
//! | [`metadata`] | Raw photo metadata → [`PhotoRecord`](models::PhotoRecord) |
//! | [`cluster`] | Greedy single-pass spot clustering |
//! | [`place`] | Geocode feature model and name-selection chain |
//! | [`lexicon`] | Locale, sentinel strings, and label tables |
//! | [`tags`] | Five-category tag synthesis |
//! | [`titles`] | Title suggestions from three tags |
//! | [`models`] | Shared data types |

pub mod cluster;
pub mod geo;
pub mod lexicon;
pub mod metadata;
pub mod models;
pub mod place;
pub mod tags;
pub mod titles;
