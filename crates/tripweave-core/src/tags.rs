//! Five-category tag synthesis.
//!
//! [`synthesize_tags`] turns trip-level [`TagSignals`] into exactly five
//! [`Tag`]s, one per [`TagCategory`]. It runs in two steps:
//!
//! 1. **Candidates** — every category produces one or more scored labels
//!    from deterministic heuristics. Each category has a fallback, so a
//!    signal bundle with every optional field missing still yields all five.
//! 2. **Selection** — [`select_tags`] deduplicates by id, keeps the best
//!    candidate of each category, backfills from the overall pool if a
//!    category came up empty, and returns the result sorted by score.
//!
//! # Candidate scores
//!
//! | Category | Candidate | Score |
//! |----------|-----------|-------|
//! | place | trip location | 0.95 |
//! | place | prefecture from first spot address, else its region | 0.90 |
//! | place | first spot name | 0.82 |
//! | place | "somewhere" | 0.35 |
//! | season | season of start month | 0.90 |
//! | season | summer/winter nuance | 0.75 |
//! | season | fallback | 0.40 |
//! | time | bucket of mean photo hour | 0.85 |
//! | time | fallback | 0.40 |
//! | motion | distance bucket / numeric | 0.85 / 0.55 |
//! | motion | GPS-ratio proxy (wandered / stroll) | 0.65 / 0.55 |
//! | mood | brightness | 0.75 |
//! | mood | default urban moods | 0.60 / 0.55 |
//! | mood | low GPS coverage | 0.55 |

use chrono::{DateTime, FixedOffset, Timelike};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::lexicon::{self, Locale, Season};
use crate::models::{Tag, TagCategory};
use crate::place::extract_prefecture;

/// Number of tags in a final set.
pub const TAG_COUNT: usize = 5;

/// GPS ratio assumed by the motion proxy when none is supplied.
const DEFAULT_GPS_PROXY: f64 = 0.2;

/// Trip-level inputs to tag synthesis. Every field except `locale` is optional.
#[derive(Debug, Clone, Default)]
pub struct TagSignals {
    /// Coarse trip location (region, prefecture, or city).
    pub location: Option<String>,
    pub first_spot_name: Option<String>,
    pub first_spot_address: Option<String>,
    pub first_spot_region: Option<String>,
    /// Month of the trip's start date, 1–12.
    pub start_month: Option<u32>,
    pub photo_timestamps: Option<Vec<DateTime<FixedOffset>>>,
    /// Fraction of photos with a usable location, 0–1.
    pub gps_ratio: Option<f64>,
    /// Total travel distance between consecutive spots.
    pub distance_km: Option<f64>,
    pub is_likely_bright: Option<bool>,
    pub locale: Locale,
}

/// Produce exactly [`TAG_COUNT`] tags, one per category, best first.
pub fn synthesize_tags(signals: &TagSignals) -> Vec<Tag> {
    select_tags(candidates(signals))
}

/// Every scored candidate for `signals`, in generation order.
pub fn candidates(signals: &TagSignals) -> Vec<Tag> {
    let mut out = Vec::new();
    place_candidates(signals, &mut out);
    season_candidates(signals, &mut out);
    time_candidates(signals, &mut out);
    motion_candidates(signals, &mut out);
    mood_candidates(signals, &mut out);
    out
}

/// Reduce a candidate pool to at most [`TAG_COUNT`] tags.
///
/// One top-scored tag per category first (ties keep pool order), then the
/// best remaining tags overall until the set is full. The result is sorted
/// by score, highest first.
pub fn select_tags(pool: Vec<Tag>) -> Vec<Tag> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<Tag> = pool.into_iter().filter(|t| seen.insert(t.id.clone())).collect();
    cleaned.sort_by(by_score_desc);

    let mut selected: Vec<Tag> = TagCategory::ALL
        .iter()
        .filter_map(|cat| cleaned.iter().find(|t| t.category == *cat).cloned())
        .collect();

    if selected.len() < TAG_COUNT {
        let taken: HashSet<String> = selected.iter().map(|t| t.id.clone()).collect();
        let missing = TAG_COUNT - selected.len();
        selected.extend(
            cleaned
                .into_iter()
                .filter(|t| !taken.contains(&t.id))
                .take(missing),
        );
    }

    selected.sort_by(by_score_desc);
    selected.truncate(TAG_COUNT);
    selected
}

fn by_score_desc(a: &Tag, b: &Tag) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

// ============ Candidates ============

fn place_candidates(signals: &TagSignals, out: &mut Vec<Tag>) {
    let locale = signals.locale;

    if let Some(location) = non_empty(&signals.location) {
        if !lexicon::is_unknown_location(location) {
            out.push(Tag::new(TagCategory::Place, location, 0.95, "trip location"));
        }
    }

    let prefecture = non_empty(&signals.first_spot_address)
        .map(extract_prefecture)
        .filter(|p| !p.is_empty())
        .or_else(|| non_empty(&signals.first_spot_region));
    if let Some(region) = prefecture {
        if !lexicon::is_unknown_location(region) {
            out.push(Tag::new(TagCategory::Place, region, 0.90, "first spot region"));
        }
    }

    if let Some(name) = non_empty(&signals.first_spot_name) {
        if !lexicon::is_unknown_spot(name) {
            out.push(Tag::new(TagCategory::Place, name, 0.82, "first spot name"));
        }
    }

    out.push(Tag::new(TagCategory::Place, locale.somewhere(), 0.35, "fallback"));
}

fn season_candidates(signals: &TagSignals, out: &mut Vec<Tag>) {
    let locale = signals.locale;
    match signals.start_month.and_then(Season::from_month) {
        Some(season) => {
            out.push(Tag::new(
                TagCategory::Season,
                season.trip_label(locale),
                0.90,
                "start month",
            ));
            if let Some(nuance) = season.nuance_label(locale) {
                out.push(Tag::new(TagCategory::Season, nuance, 0.75, "season nuance"));
            }
        }
        None => out.push(Tag::new(
            TagCategory::Season,
            lexicon::season_fallback(locale),
            0.40,
            "fallback",
        )),
    }
}

fn time_candidates(signals: &TagSignals, out: &mut Vec<Tag>) {
    let locale = signals.locale;
    let timestamps = signals
        .photo_timestamps
        .as_deref()
        .filter(|ts| !ts.is_empty());

    match timestamps {
        Some(ts) => {
            let mean = ts.iter().map(|t| t.hour() as f64).sum::<f64>() / ts.len() as f64;
            let hour = mean.round() as u32;
            out.push(Tag::new(
                TagCategory::Time,
                lexicon::time_tag_label(hour, locale),
                0.85,
                "mean photo hour",
            ));
        }
        None => out.push(Tag::new(
            TagCategory::Time,
            lexicon::time_fallback(locale),
            0.40,
            "fallback",
        )),
    }
}

fn motion_candidates(signals: &TagSignals, out: &mut Vec<Tag>) {
    let locale = signals.locale;
    match signals.distance_km.filter(|d| d.is_finite()) {
        Some(km) => {
            out.push(Tag::new(
                TagCategory::Motion,
                lexicon::motion_label(km, locale),
                0.85,
                "travel distance",
            ));
            out.push(Tag::new(
                TagCategory::Motion,
                lexicon::motion_numeric_label(km, locale),
                0.55,
                "travel distance",
            ));
        }
        None => {
            let proxy = signals.gps_ratio.unwrap_or(DEFAULT_GPS_PROXY);
            if proxy >= 0.6 {
                out.push(Tag::new(
                    TagCategory::Motion,
                    lexicon::wandered(locale),
                    0.65,
                    "gps ratio",
                ));
            } else {
                out.push(Tag::new(
                    TagCategory::Motion,
                    lexicon::casual_stroll(locale),
                    0.55,
                    "gps ratio",
                ));
            }
        }
    }
}

fn mood_candidates(signals: &TagSignals, out: &mut Vec<Tag>) {
    let locale = signals.locale;
    match signals.is_likely_bright {
        Some(bright) => out.push(Tag::new(
            TagCategory::Mood,
            lexicon::brightness_mood(bright, locale),
            0.75,
            "brightness",
        )),
        None => {
            let [first, second] = lexicon::default_moods(locale);
            out.push(Tag::new(TagCategory::Mood, first, 0.60, "default mood"));
            out.push(Tag::new(TagCategory::Mood, second, 0.55, "default mood"));
        }
    }

    if signals.gps_ratio.is_some_and(|r| r < 0.3) {
        out.push(Tag::new(
            TagCategory::Mood,
            lexicon::uncertain_journey(locale),
            0.55,
            "low gps ratio",
        ));
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn categories(tags: &[Tag]) -> Vec<TagCategory> {
        let mut cats: Vec<TagCategory> = tags.iter().map(|t| t.category).collect();
        cats.sort();
        cats
    }

    fn assert_full_coverage(tags: &[Tag]) {
        assert_eq!(tags.len(), TAG_COUNT, "{:?}", tags);
        assert_eq!(categories(tags), TagCategory::ALL.to_vec());
        for pair in tags.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    fn at_hour(h: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2024-11-03T{:02}:15:00+09:00", h)).unwrap()
    }

    #[test]
    fn empty_signals_still_cover_every_category() {
        let tags = synthesize_tags(&TagSignals::default());
        assert_full_coverage(&tags);
        let labels: Vec<&str> = tags.iter().map(|t| t.label.as_str()).collect();
        assert!(labels.contains(&"どこかの街角"));
        assert!(labels.contains(&"季節の気配"));
        assert!(labels.contains(&"ある日の時間"));
        assert!(labels.contains(&"ゆるく散歩"));
        assert!(labels.contains(&"街のざわめき"));
    }

    #[test]
    fn full_signals_pick_strongest_candidates() {
        let signals = TagSignals {
            location: Some("京都府".into()),
            first_spot_name: Some("清水寺".into()),
            first_spot_address: Some("日本、京都府京都市東山区清水1丁目".into()),
            start_month: Some(11),
            photo_timestamps: Some(vec![at_hour(14), at_hour(16), at_hour(18)]),
            gps_ratio: Some(0.9),
            distance_km: Some(4.2),
            is_likely_bright: Some(true),
            locale: Locale::Ja,
            ..Default::default()
        };
        let tags = synthesize_tags(&signals);
        assert_full_coverage(&tags);

        assert_eq!(tags[0].id, "place:京都府");
        assert_eq!(tags[0].score, 0.95);
        let by_cat = |c: TagCategory| tags.iter().find(|t| t.category == c).unwrap();
        assert_eq!(by_cat(TagCategory::Season).label, "秋の旅");
        assert_eq!(by_cat(TagCategory::Time).label, "午後の時間");
        assert_eq!(by_cat(TagCategory::Motion).label, "ゆるく散歩");
        assert_eq!(by_cat(TagCategory::Mood).label, "まぶしさの記憶");
    }

    #[test]
    fn unknown_sentinels_are_not_place_tags() {
        let signals = TagSignals {
            location: Some("Unknown".into()),
            first_spot_name: Some("Unknown spot".into()),
            locale: Locale::En,
            ..Default::default()
        };
        let tags = synthesize_tags(&signals);
        let place = tags.iter().find(|t| t.category == TagCategory::Place).unwrap();
        assert_eq!(place.label, "Somewhere in town");
        assert_eq!(place.score, 0.35);
    }

    #[test]
    fn region_is_used_when_address_has_no_prefecture() {
        let signals = TagSignals {
            first_spot_address: Some("Rue de Rivoli, Paris".into()),
            first_spot_region: Some("Île-de-France".into()),
            locale: Locale::En,
            ..Default::default()
        };
        let place = candidates(&signals)
            .into_iter()
            .find(|t| t.category == TagCategory::Place)
            .unwrap();
        assert_eq!(place.label, "Île-de-France");
        assert_eq!(place.score, 0.90);
    }

    #[test]
    fn summer_has_nuance_candidate() {
        let signals = TagSignals {
            start_month: Some(7),
            locale: Locale::En,
            ..Default::default()
        };
        let seasons: Vec<String> = candidates(&signals)
            .into_iter()
            .filter(|t| t.category == TagCategory::Season)
            .map(|t| t.label)
            .collect();
        assert_eq!(seasons, vec!["Summer trip", "Midsummer"]);
    }

    #[test]
    fn distance_adds_numeric_motion() {
        let signals = TagSignals {
            distance_km: Some(16.04),
            locale: Locale::En,
            ..Default::default()
        };
        let motion: Vec<(String, f64)> = candidates(&signals)
            .into_iter()
            .filter(|t| t.category == TagCategory::Motion)
            .map(|t| (t.label, t.score))
            .collect();
        assert_eq!(
            motion,
            vec![
                ("A long walking day".to_string(), 0.85),
                ("16.0km traveled".to_string(), 0.55),
            ]
        );
    }

    #[test]
    fn low_gps_ratio_adds_uncertain_mood() {
        let signals = TagSignals {
            gps_ratio: Some(0.1),
            ..Default::default()
        };
        let moods: Vec<String> = candidates(&signals)
            .into_iter()
            .filter(|t| t.category == TagCategory::Mood)
            .map(|t| t.label)
            .collect();
        assert!(moods.contains(&"手探りの旅".to_string()));
    }

    #[test]
    fn select_backfills_missing_categories() {
        let pool = vec![
            Tag::new(TagCategory::Place, "A", 0.9, ""),
            Tag::new(TagCategory::Place, "B", 0.8, ""),
            Tag::new(TagCategory::Place, "C", 0.7, ""),
            Tag::new(TagCategory::Mood, "D", 0.6, ""),
            Tag::new(TagCategory::Mood, "D", 0.6, ""),
            Tag::new(TagCategory::Mood, "E", 0.5, ""),
            Tag::new(TagCategory::Mood, "F", 0.1, ""),
        ];
        let selected = select_tags(pool);
        let ids: Vec<&str> = selected.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["place:A", "place:B", "place:C", "mood:D", "mood:E"]);
    }

    #[test]
    fn select_with_small_pool_returns_what_it_has() {
        let pool = vec![Tag::new(TagCategory::Time, "x", 0.5, "")];
        assert_eq!(select_tags(pool).len(), 1);
    }

    #[test]
    fn randomized_signals_always_cover_every_category() {
        let mut rng = StdRng::seed_from_u64(0x7419);
        let places = ["京都府", "不明", "", "Tokyo", "Unknown"];
        let spots = ["清水寺", "不明なスポット", "Unknown spot", ""];

        for _ in 0..64 {
            let maybe = |rng: &mut StdRng| rng.gen_bool(0.5);
            let locale = if rng.gen_bool(0.5) { Locale::Ja } else { Locale::En };
            let signals = TagSignals {
                location: maybe(&mut rng)
                    .then(|| places[rng.gen_range(0..places.len())].to_string()),
                first_spot_name: maybe(&mut rng)
                    .then(|| spots[rng.gen_range(0..spots.len())].to_string()),
                first_spot_address: maybe(&mut rng).then(|| "大阪府大阪市北区".to_string()),
                first_spot_region: maybe(&mut rng).then(|| "Kansai".to_string()),
                start_month: maybe(&mut rng).then(|| rng.gen_range(0..=13)),
                photo_timestamps: maybe(&mut rng).then(|| {
                    (0..rng.gen_range(0..5))
                        .map(|_| at_hour(rng.gen_range(0..24)))
                        .collect()
                }),
                gps_ratio: maybe(&mut rng).then(|| rng.gen_range(0.0..=1.0)),
                distance_km: maybe(&mut rng).then(|| rng.gen_range(0.0..40.0)),
                is_likely_bright: maybe(&mut rng).then(|| rng.gen_bool(0.5)),
                locale,
            };
            assert_full_coverage(&synthesize_tags(&signals));
        }
    }

    #[test]
    fn deterministic_output() {
        let signals = TagSignals {
            location: Some("Kyoto".into()),
            start_month: Some(1),
            gps_ratio: Some(0.2),
            locale: Locale::En,
            ..Default::default()
        };
        assert_eq!(synthesize_tags(&signals), synthesize_tags(&signals));
    }
}
