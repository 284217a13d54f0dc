//! Field coercions shared by the parsers.

use regex::Regex;
use std::sync::LazyLock;

use crate::html::normalize_ws;
use crate::rules::round_up_to;

static NAME_AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)[\s,(]+(\d{1,3})\)?\s*$").expect("valid name-age regex")
});

static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("valid points regex")
});

static PAYOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*\$\s*([\d,]+(?:\.\d+)?)\s*\)").expect("valid payout regex")
});

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\s*([\d,]+(?:\.\d+)?)").expect("valid money regex")
});

/// Canonical division names, tried in order; first substring hit wins.
/// Older age groups come first so `Super-Seniors 60+` is not read as `Seniors`.
pub const DIVISION_MAPPINGS: &[(&[&str], &str)] = &[
    (&["80+", "80-89", "80 & over", "veterans 80"], "Veterans 80+"),
    (&["70+", "70-79", "70 & over", "veteran"], "Veterans 70+"),
    (&["60+", "60-69", "60 & over", "super-senior", "super senior", "supersenior"], "Super-Seniors 60+"),
    (&["50+", "50-59", "50 & over", "senior"], "Seniors 50+"),
    (&["40+", "40-49", "40 & over", "master"], "Masters 40+"),
    (&["open", "under 40", "u40", "20-39"], "Open"),
];

/// Map free-text division labels onto canonical names. Unmatched text passes
/// through trimmed. Canonical names map to themselves.
pub fn normalize_division(text: &str) -> String {
    let cleaned = normalize_ws(text);
    let lc = cleaned.to_lowercase();
    DIVISION_MAPPINGS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lc.contains(n)))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(cleaned)
}

/// Canonical division named somewhere in a caption or heading
pub fn division_cue(text: &str) -> Option<&'static str> {
    let lc = text.to_lowercase();
    DIVISION_MAPPINGS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lc.contains(n)))
        .map(|(_, canonical)| *canonical)
}

/// Textual division for an age, in the 10-year buckets the old club pages use
pub fn division_for_bucket(age: u32) -> &'static str {
    match age {
        0..=39 => "Open",
        40..=49 => "Masters 40+",
        50..=59 => "Seniors 50+",
        60..=69 => "Super-Seniors 60+",
        70..=79 => "Veterans 70+",
        _ => "Veterans 80+",
    }
}

/// Digits of the text as a number; `"1st"` → 1, `"#12"` → 12
pub fn digits_only(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.len() > 9 {
        return None;
    }
    digits.parse().ok()
}

/// Place number; zero is not a place
pub fn parse_place(text: &str) -> Option<u32> {
    digits_only(text).filter(|&p| p >= 1)
}

/// Split `"John Smith, 35"` into name and age. Text without a trailing age
/// comes back unchanged.
pub fn split_name_age(text: &str) -> (String, Option<u32>) {
    let cleaned = normalize_ws(text);
    if let Some(caps) = NAME_AGE_RE.captures(&cleaned) {
        let name = crate::html::trim_punctuation(&caps[1]).to_string();
        if !name.is_empty() {
            if let Ok(age) = caps[2].parse::<u32>() {
                return (name, Some(age));
            }
        }
    }
    (cleaned, None)
}

/// `"150 ($300)"` → points 150, payout 300
pub fn parse_points(text: &str) -> (Option<f64>, Option<f64>) {
    let points = POINTS_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok());
    let payout = PAYOUT_RE
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok());
    (points, payout)
}

/// Dollar amount in a prize column
pub fn parse_money(text: &str) -> Option<f64> {
    MONEY_RE
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
}

/// Time text to fractional seconds. Accepts `H:MM:SS`, `MM:SS` and bare
/// seconds, each with optional hundredths. Largest unit first.
pub fn parse_time_fraction(text: &str) -> Option<f64> {
    let cleaned = text
        .trim()
        .trim_matches(|c: char| !(c.is_ascii_digit() || c == ':' || c == '.'));
    if cleaned.is_empty() || !cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let parts: Vec<&str> = cleaned.split(':').collect();
    let whole = |s: &str| -> Option<f64> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        s.parse::<f64>().ok()
    };
    let seconds = |s: &str| -> Option<f64> {
        let value = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
        (!s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.')).then_some(value)
    };

    match parts[..] {
        [s] => seconds(s),
        [m, s] => {
            let secs = seconds(s).filter(|&v| v < 60.0)?;
            Some(whole(m)? * 60.0 + secs)
        }
        [h, m, s] => {
            let mins = whole(m).filter(|&v| v < 60.0)?;
            let secs = seconds(s).filter(|&v| v < 60.0)?;
            Some(whole(h)? * 3600.0 + mins * 60.0 + secs)
        }
        _ => None,
    }
}

/// Time text to whole seconds; hundredths round up to the next second.
pub fn parse_time_to_seconds(text: &str) -> Option<u32> {
    let value = parse_time_fraction(text)?;
    let rounded = round_up_to(value, 1.0);
    (rounded <= u32::MAX as f64).then_some(rounded as u32)
}

/// Render whole seconds as `M:SS` or `H:MM:SS`
pub fn format_seconds(total: u32) -> String {
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
