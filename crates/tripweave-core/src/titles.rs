//! Title suggestions from three selected tags.
//!
//! The three tags are slotted by category. Templates fire in a fixed order,
//! each only when its slots are filled:
//!
//! | Template | Needs | English | Japanese |
//! |----------|-------|---------|----------|
//! | A | place + season | `{place}, {season} {poetic}` | `{place}、{season}の{poetic}` |
//! | B | place + time | `{time} in {place}, {motion}` | `{time}の{place}で、{motion}` |
//! | C | place or season | `{place/season} memories — {poetic}` | `{place/season}の記憶 — {poetic}` |
//! | fallback | nothing fired | `Travel record — {poetic}` | `旅の記録 — {poetic}` |
//!
//! `{poetic}` is the first present of mood, motion, time. Results are
//! deduplicated by title and capped at [`MAX_TITLES`].

use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::lexicon::Locale;
use crate::models::{Tag, TagCategory, TitleSuggestion};

/// Exact number of tags accepted by [`synthesize_titles`].
pub const TITLE_TAG_COUNT: usize = 3;

pub const MAX_TITLES: usize = 3;

/// Build up to three title suggestions from exactly three tags.
///
/// Returns an error unless `tags.len() == 3`.
pub fn synthesize_titles(tags: &[Tag], locale: Locale) -> Result<Vec<TitleSuggestion>> {
    if tags.len() != TITLE_TAG_COUNT {
        bail!(
            "Title synthesis needs exactly {} tags, got {}",
            TITLE_TAG_COUNT,
            tags.len()
        );
    }

    let slots = Slots::from_tags(tags);
    let words = Words::for_locale(locale);
    let used_tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
    let poetic = slots.poetic().unwrap_or(words.default_poetic);

    let place = slots.place.as_deref();
    let season = slots.season.as_deref();
    let time = slots.time.as_deref();
    let motion = slots.motion.as_deref();
    let mood = slots.mood.as_deref();

    let suggestion = |title: String, subtitle: Option<&str>| TitleSuggestion {
        title,
        subtitle: subtitle.map(str::to_string),
        used_tag_ids: used_tag_ids.clone(),
    };
    let mut suggestions = Vec::new();

    if let (Some(p), Some(s)) = (place, season) {
        let title = match locale {
            Locale::Ja => format!("{}、{}の{}", p, s, poetic),
            Locale::En => format!("{}, {} {}", p, s, poetic),
        };
        suggestions.push(suggestion(title, motion.or(time).or(mood)));
    }

    if let (Some(p), Some(t)) = (place, time) {
        let action = motion.unwrap_or(words.default_action);
        let title = match locale {
            Locale::Ja => format!("{}の{}で、{}", t, p, action),
            Locale::En => format!("{} in {}, {}", t, p, action),
        };
        suggestions.push(suggestion(title, mood.or(season)));
    }

    if let Some(info) = place.or(season) {
        let title = match locale {
            Locale::Ja => format!("{}の記憶 — {}", info, poetic),
            Locale::En => format!("{} memories — {}", info, poetic),
        };
        let pair = match (place, season) {
            (Some(p), Some(s)) => Some(format!("{} / {}", p, s)),
            _ => None,
        };
        let parts: Vec<String> = pair
            .into_iter()
            .chain([motion, time, mood].into_iter().flatten().map(str::to_string))
            .collect();
        let subtitle = parts.join(words.separator);
        let subtitle = Some(subtitle.as_str()).filter(|s| !s.is_empty());
        suggestions.push(suggestion(title, subtitle));
    }

    if suggestions.is_empty() {
        suggestions.push(suggestion(format!("{} — {}", words.record, poetic), None));
    }

    Ok(dedup_titles(suggestions))
}

/// Drop later suggestions whose title repeats an earlier one, then cap at
/// [`MAX_TITLES`].
pub fn dedup_titles(suggestions: Vec<TitleSuggestion>) -> Vec<TitleSuggestion> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|s| seen.insert(s.title.clone()))
        .take(MAX_TITLES)
        .collect()
}

/// Cleaned labels keyed by category. With three tags at most three are set.
#[derive(Default)]
struct Slots {
    place: Option<String>,
    season: Option<String>,
    time: Option<String>,
    motion: Option<String>,
    mood: Option<String>,
}

impl Slots {
    fn from_tags(tags: &[Tag]) -> Self {
        let mut slots = Slots::default();
        for tag in tags {
            let label = clean_label(&tag.label);
            if label.is_empty() {
                continue;
            }
            let slot = match tag.category {
                TagCategory::Place => &mut slots.place,
                TagCategory::Season => &mut slots.season,
                TagCategory::Time => &mut slots.time,
                TagCategory::Motion => &mut slots.motion,
                TagCategory::Mood => &mut slots.mood,
            };
            // First tag of a category wins.
            if slot.is_none() {
                *slot = Some(label);
            }
        }
        slots
    }

    fn poetic(&self) -> Option<&str> {
        self.mood
            .as_deref()
            .or(self.motion.as_deref())
            .or(self.time.as_deref())
    }
}

struct Words {
    default_poetic: &'static str,
    default_action: &'static str,
    record: &'static str,
    separator: &'static str,
}

impl Words {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Ja => Words {
                default_poetic: "旅の記憶",
                default_action: "ふらりと歩く",
                record: "旅の記録",
                separator: "・",
            },
            Locale::En => Words {
                default_poetic: "travel memories",
                default_action: "wandering",
                record: "Travel record",
                separator: " · ",
            },
        }
    }
}

/// Collapse internal whitespace runs to a single space and trim.
fn clean_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}
