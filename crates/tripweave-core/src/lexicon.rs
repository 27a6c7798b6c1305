//! Locale-specific vocabulary.
//!
//! Turns machine signals (month, hour, distance, brightness) into short
//! human phrases, and holds every sentinel string the pipeline emits.
//! Locale is always an explicit parameter; nothing here reads ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl Locale {
    /// Parse a locale tag such as `"en"`, `"en-US"` or `"ja"`.
    ///
    /// Anything that is not English falls back to Japanese, the product default.
    pub fn parse(tag: &str) -> Self {
        let primary = tag.trim().split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("en") {
            Locale::En
        } else {
            Locale::Ja
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ja => "ja",
            Locale::En => "en",
        }
    }

    /// Name used when a coordinate cannot be resolved.
    pub fn unknown_spot(self) -> &'static str {
        match self {
            Locale::Ja => "不明なスポット",
            Locale::En => "Unknown spot",
        }
    }

    /// Address used for out-of-range or non-finite coordinates.
    pub fn invalid_coordinates(self) -> &'static str {
        match self {
            Locale::Ja => "座標が不正です",
            Locale::En => "Invalid coordinates",
        }
    }

    /// Trip location when nothing could be derived.
    pub fn unknown_location(self) -> &'static str {
        match self {
            Locale::Ja => "不明",
            Locale::En => "Unknown",
        }
    }

    /// Trip title when no location is known.
    pub fn unknown_trip_title(self) -> &'static str {
        match self {
            Locale::Ja => "旅の記録",
            Locale::En => "Travel record",
        }
    }

    /// Place tag used when nothing better is available.
    pub fn somewhere(self) -> &'static str {
        match self {
            Locale::Ja => "どこかの街角",
            Locale::En => "Somewhere in town",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `name` is the unknown-spot sentinel of any locale.
pub fn is_unknown_spot(name: &str) -> bool {
    [Locale::Ja, Locale::En]
        .iter()
        .any(|l| l.unknown_spot() == name)
}

/// True when `location` is empty or the unknown-location sentinel of any locale.
pub fn is_unknown_location(location: &str) -> bool {
    let trimmed = location.trim();
    trimmed.is_empty()
        || [Locale::Ja, Locale::En]
            .iter()
            .any(|l| l.unknown_location() == trimmed)
}

fn pick(locale: Locale, ja: &'static str, en: &'static str) -> &'static str {
    match locale {
        Locale::Ja => ja,
        Locale::En => en,
    }
}

// ============ Seasons ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Dec–Feb winter, Mar–May spring, Jun–Aug summer, Sep–Nov autumn.
    /// `None` outside `1..=12`.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Autumn),
            _ => None,
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Season::Winter, Locale::Ja) => "冬",
            (Season::Spring, Locale::Ja) => "春",
            (Season::Summer, Locale::Ja) => "夏",
            (Season::Autumn, Locale::Ja) => "秋",
            (Season::Winter, Locale::En) => "Winter",
            (Season::Spring, Locale::En) => "Spring",
            (Season::Summer, Locale::En) => "Summer",
            (Season::Autumn, Locale::En) => "Autumn",
        }
    }

    /// Base season tag label, e.g. `秋の旅` / `Autumn trip`.
    pub fn trip_label(self, locale: Locale) -> String {
        match locale {
            Locale::Ja => format!("{}の旅", self.label(locale)),
            Locale::En => format!("{} trip", self.label(locale)),
        }
    }

    /// Secondary nuance label. Only summer and winter have one.
    pub fn nuance_label(self, locale: Locale) -> Option<&'static str> {
        match (self, locale) {
            (Season::Summer, Locale::Ja) => Some("盛夏"),
            (Season::Summer, Locale::En) => Some("Midsummer"),
            (Season::Winter, Locale::Ja) => Some("冬の空気"),
            (Season::Winter, Locale::En) => Some("Winter air"),
            _ => None,
        }
    }
}

pub fn season_fallback(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "季節の気配",
        Locale::En => "Seasonal vibes",
    }
}

// ============ Time of day ============

/// Poetic label for an hour of the day (0–23).
pub fn hour_label(hour: u32, locale: Locale) -> &'static str {
    let (ja, en) = match hour {
        0..=5 => ("夜更け", "Late night"),
        6..=9 => ("朝", "Morning"),
        10..=11 => ("午前", "Forenoon"),
        12..=14 => ("昼下がり", "Early afternoon"),
        15..=17 => ("午後", "Afternoon"),
        18..=20 => ("夕方", "Evening"),
        _ => ("夜", "Night"),
    };
    pick(locale, ja, en)
}

/// Time tag label, e.g. `夕方の時間` / `Evening hours`.
pub fn time_tag_label(hour: u32, locale: Locale) -> String {
    let label = hour_label(hour, locale);
    match locale {
        Locale::Ja => format!("{}の時間", label),
        Locale::En => format!("{} hours", label),
    }
}

pub fn time_fallback(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "ある日の時間",
        Locale::En => "A day's moments",
    }
}

// ============ Motion ============

/// Label for a total travel distance in kilometers.
pub fn motion_label(distance_km: f64, locale: Locale) -> &'static str {
    if distance_km >= 15.0 {
        pick(locale, "よく歩いた日", "A long walking day")
    } else if distance_km >= 8.0 {
        wandered(locale)
    } else if distance_km >= 3.0 {
        casual_stroll(locale)
    } else {
        pick(locale, "近くをめぐる", "Nearby rounds")
    }
}

/// Secondary numeric motion label, e.g. `移動 4.2km`.
pub fn motion_numeric_label(distance_km: f64, locale: Locale) -> String {
    match locale {
        Locale::Ja => format!("移動 {:.1}km", distance_km),
        Locale::En => format!("{:.1}km traveled", distance_km),
    }
}

pub fn wandered(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "歩き回った",
        Locale::En => "Wandered around",
    }
}

pub fn casual_stroll(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "ゆるく散歩",
        Locale::En => "Casual stroll",
    }
}

// ============ Mood ============

pub fn brightness_mood(is_bright: bool, locale: Locale) -> &'static str {
    match (is_bright, locale) {
        (true, Locale::Ja) => "まぶしさの記憶",
        (true, Locale::En) => "Memories of glare",
        (false, Locale::Ja) => "やわらかな光",
        (false, Locale::En) => "Soft light",
    }
}

/// Default urban moods, strongest first.
pub fn default_moods(locale: Locale) -> [&'static str; 2] {
    match locale {
        Locale::Ja => ["街のざわめき", "路地の気配"],
        Locale::En => ["City buzz", "Alley atmosphere"],
    }
}

pub fn uncertain_journey(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "手探りの旅",
        Locale::En => "Journey of discovery",
    }
}

// ============ Titles ============

pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// Trip title for a known location and start month.
pub fn trip_title(location: &str, month: u32, locale: Locale) -> String {
    match locale {
        Locale::Ja => format!("{}・{}月の旅", location, month),
        Locale::En => format!("{} in {}", location, month_name(month)),
    }
}

// ============ Warnings ============

pub fn warn_no_gps(locale: Locale) -> String {
    match locale {
        Locale::Ja => "GPS情報が含まれていません。位置情報は手動で指定してください。".to_string(),
        Locale::En => {
            "No location data found in these photos. Did you mean to add it manually?".to_string()
        }
    }
}

pub fn warn_sparse_gps(with_gps: usize, total: usize, locale: Locale) -> String {
    match locale {
        Locale::Ja => format!(
            "GPS情報が少ない写真が多く含まれています。({}/{}枚)",
            with_gps, total
        ),
        Locale::En => format!(
            "Most photos have no location data ({}/{} geotagged).",
            with_gps, total
        ),
    }
}

pub fn warn_no_clusters(locale: Locale) -> String {
    match locale {
        Locale::Ja => "位置情報付きの写真がないため、スポットを作成できませんでした。".to_string(),
        Locale::En => "No geotagged photos, so no spots could be formed.".to_string(),
    }
}

pub fn warn_spot_failed(index: usize, locale: Locale) -> String {
    match locale {
        Locale::Ja => format!("スポット{}の処理中にエラーが発生しました", index),
        Locale::En => format!("An error occurred while processing spot {}", index),
    }
}

pub fn warn_no_spots(locale: Locale) -> String {
    match locale {
        Locale::Ja => "スポットを検出できませんでした。GPS情報を確認してください。".to_string(),
        Locale::En => "No spots were detected. Please check the photos' location data.".to_string(),
    }
}

pub fn warn_cancelled(resolved: usize, total: usize, locale: Locale) -> String {
    match locale {
        Locale::Ja => format!(
            "処理が中断されました。({}/{}スポット取得済み)",
            resolved, total
        ),
        Locale::En => format!(
            "Generation was cancelled ({}/{} spots resolved).",
            resolved, total
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parse() {
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("en-US"), Locale::En);
        assert_eq!(Locale::parse("EN"), Locale::En);
        assert_eq!(Locale::parse("ja"), Locale::Ja);
        assert_eq!(Locale::parse("fr"), Locale::Ja);
        assert_eq!(Locale::parse(""), Locale::Ja);
    }

    #[test]
    fn seasons_cover_every_month() {
        assert_eq!(Season::from_month(12), Some(Season::Winter));
        assert_eq!(Season::from_month(2), Some(Season::Winter));
        assert_eq!(Season::from_month(3), Some(Season::Spring));
        assert_eq!(Season::from_month(8), Some(Season::Summer));
        assert_eq!(Season::from_month(11), Some(Season::Autumn));
        assert_eq!(Season::from_month(0), None);
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn hour_buckets() {
        assert_eq!(hour_label(5, Locale::Ja), "夜更け");
        assert_eq!(hour_label(6, Locale::Ja), "朝");
        assert_eq!(hour_label(11, Locale::Ja), "午前");
        assert_eq!(hour_label(14, Locale::Ja), "昼下がり");
        assert_eq!(hour_label(17, Locale::En), "Afternoon");
        assert_eq!(hour_label(20, Locale::En), "Evening");
        assert_eq!(hour_label(23, Locale::En), "Night");
    }

    #[test]
    fn motion_thresholds_are_inclusive() {
        assert_eq!(motion_label(15.0, Locale::Ja), "よく歩いた日");
        assert_eq!(motion_label(8.0, Locale::Ja), "歩き回った");
        assert_eq!(motion_label(3.0, Locale::Ja), "ゆるく散歩");
        assert_eq!(motion_label(2.99, Locale::Ja), "近くをめぐる");
    }

    #[test]
    fn sentinels_recognised_across_locales() {
        assert!(is_unknown_spot("Unknown spot"));
        assert!(is_unknown_spot("不明なスポット"));
        assert!(!is_unknown_spot("Kiyomizu-dera"));
        assert!(is_unknown_location("  "));
        assert!(is_unknown_location("不明"));
        assert!(!is_unknown_location("京都府"));
    }

    #[test]
    fn trip_titles() {
        assert_eq!(trip_title("京都府", 11, Locale::Ja), "京都府・11月の旅");
        assert_eq!(trip_title("Kyoto", 11, Locale::En), "Kyoto in November");
    }
}
