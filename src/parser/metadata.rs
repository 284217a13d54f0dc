//! Event name, date and location recovery from page text.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::html;

const MONTHS: &str = r"(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";

static LONG_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTHS}\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\b")).expect("valid long date regex")
});

static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").expect("valid slash date regex")
});

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid iso date regex")
});

static ORDINAL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{MONTHS}\.?\s+(\d{{1,2}})(?:st|nd|rd|th),?\s+(\d{{4}})|(\d{{1,2}})(?:st|nd|rd|th)\s+(?:of\s+)?{MONTHS}\.?,?\s+(\d{{4}}))\b"
    ))
    .expect("valid ordinal date regex")
});

static LABELED_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:location|venue|site)\s*:\s*([^\n|]{3,80})").expect("valid labeled location regex")
});

static CUE_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|at)\s+((?:[A-Z][\w.'\-]*)(?:\s+[A-Z][\w.'\-]*)*(?:,\s*[A-Z][A-Za-z]+)?)")
        .expect("valid location cue regex")
});

static CITY_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-zA-Z.]+(?:\s[A-Z][a-zA-Z.]+)*),\s*(CA|California)\b")
        .expect("valid city state regex")
});

static PLACEHOLDER_TITLES: &[&str] = &[
    "results",
    "race results",
    "untitled",
    "untitled document",
    "document",
    "new page",
    "new page 1",
    "home",
    "index",
];

fn month_number(name: &str) -> Option<u32> {
    let lc = name.to_ascii_lowercase();
    let n = match lc.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day.parse().ok()?)
}

/// `Month D, YYYY`
pub fn long_form_date(text: &str) -> Option<NaiveDate> {
    LONG_DATE_RE
        .captures_iter(text)
        .find_map(|caps| ymd(&caps[3], month_number(&caps[1])?, &caps[2]))
}

fn slash_date(text: &str) -> Option<NaiveDate> {
    SLASH_DATE_RE.captures_iter(text).find_map(|caps| {
        let month: u32 = caps[1].parse().ok()?;
        ymd(&caps[3], month, &caps[2])
    })
}

fn iso_date(text: &str) -> Option<NaiveDate> {
    ISO_DATE_RE.captures_iter(text).find_map(|caps| {
        let month: u32 = caps[2].parse().ok()?;
        ymd(&caps[1], month, &caps[3])
    })
}

fn ordinal_date(text: &str) -> Option<NaiveDate> {
    ORDINAL_DATE_RE.captures_iter(text).find_map(|caps| {
        if let (Some(m), Some(d), Some(y)) = (caps.get(1), caps.get(2), caps.get(3)) {
            return ymd(y.as_str(), month_number(m.as_str())?, d.as_str());
        }
        let (d, m, y) = (caps.get(4)?, caps.get(5)?, caps.get(6)?);
        ymd(y.as_str(), month_number(m.as_str())?, d.as_str())
    })
}

/// Try the four date shapes in order: long-form, slash, ISO, ordinal.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    long_form_date(text)
        .or_else(|| slash_date(text))
        .or_else(|| iso_date(text))
        .or_else(|| ordinal_date(text))
}

fn clean_location(raw: &str) -> Option<String> {
    let cut = raw
        .split([';', '|', '(', '\u{2013}'])
        .next()
        .unwrap_or(raw)
        .split(" - ")
        .next()
        .unwrap_or(raw);
    // A trailing date is not part of the place
    let cut = match LONG_DATE_RE.find(cut) {
        Some(m) => &cut[..m.start()],
        None => cut,
    };
    let cleaned = html::trim_punctuation(&html::normalize_ws(cut)).to_string();
    (cleaned.chars().count() >= 3).then_some(cleaned)
}

/// Location via a `Location:`/`Venue:` label, else an `in`/`at` cue.
pub fn extract_location(text: &str) -> Option<String> {
    if let Some(loc) = LABELED_LOCATION_RE
        .captures_iter(text)
        .find_map(|caps| clean_location(&caps[1]))
    {
        return Some(loc);
    }
    text.lines().find_map(|line| {
        CUE_LOCATION_RE
            .captures_iter(line)
            .find_map(|caps| clean_location(&caps[1]))
    })
}

/// `City, CA`-shaped location
pub fn city_state_location(text: &str) -> Option<String> {
    CITY_STATE_RE
        .captures(text)
        .map(|caps| format!("{}, {}", &caps[1], &caps[2]))
}

/// Best title: first `<h1>`, `<h2>`, `<title>`, then a large `<font>`.
pub fn heading_title(doc: &str) -> Option<String> {
    for tag in ["h1", "h2", "title"] {
        if let Some(text) = html::first_tag_text(doc, tag) {
            return Some(text);
        }
    }
    large_font_text(doc)
}

fn large_font_text(doc: &str) -> Option<String> {
    html::tag_blocks(doc, "<font", "</font>").into_iter().find_map(|block| {
        let open = html::to_lower(&block[..block.find('>')?]);
        let size = open.split("size=").nth(1)?;
        let size = size.trim_start_matches(['"', '\'']);
        let large = size.starts_with("+2")
            || size.starts_with("+3")
            || size.starts_with("+4")
            || size.starts_with('5')
            || size.starts_with('6')
            || size.starts_with('7');
        if !large {
            return None;
        }
        let text = html::clean_text(html::inner_after_open_tag(block));
        (!text.is_empty()).then_some(text)
    })
}

/// Title-less or boilerplate titles that carry no event name
pub fn is_placeholder_title(title: &str) -> bool {
    let lc = html::normalize_ws(title).to_lowercase();
    lc.is_empty() || PLACEHOLDER_TITLES.contains(&lc.as_str()) || lc.starts_with("microsoft word")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_date_shapes() {
        assert_eq!(extract_date("Held June 7, 1998 at the park"), date(1998, 6, 7));
        assert_eq!(extract_date("Sept. 12 2004"), date(2004, 9, 12));
        assert_eq!(extract_date("Date: 3/15/99"), date(1999, 3, 15));
        assert_eq!(extract_date("2011-10-02"), date(2011, 10, 2));
        assert_eq!(extract_date("the 4th of July, 2001"), date(2001, 7, 4));
        assert_eq!(extract_date("November 23rd, 2000"), date(2000, 11, 23));
        assert_eq!(extract_date("no date"), None);
    }

    #[test]
    fn test_date_pattern_order() {
        // Long form wins even when a slash date appears first
        assert_eq!(extract_date("updated 1/2/2003 - race on May 4, 2002"), date(2002, 5, 4));
    }

    #[test]
    fn test_invalid_calendar_date_skipped() {
        assert_eq!(extract_date("February 30, 1999 or March 1, 1999"), date(1999, 3, 1));
    }

    #[test]
    fn test_location_cues() {
        assert_eq!(extract_location("Venue: Golden Gate Park; 8am").as_deref(), Some("Golden Gate Park"));
        assert_eq!(
            extract_location("Bay 10K held at Lake Merritt, Oakland").as_deref(),
            Some("Lake Merritt, Oakland")
        );
        assert_eq!(extract_location("results are in"), None);
        assert_eq!(city_state_location("Run at Palo Alto, CA today").as_deref(), Some("Palo Alto, CA"));
    }

    #[test]
    fn test_heading_title_order() {
        let doc = "<title>Page</title><h2>Second</h2><h1>First</h1>";
        assert_eq!(heading_title(doc).as_deref(), Some("First"));
        let doc = r#"<font size="+2">Turkey Trot 5K</font>"#;
        assert_eq!(heading_title(doc).as_deref(), Some("Turkey Trot 5K"));
        assert_eq!(heading_title("<p>nothing</p>"), None);
    }

    #[test]
    fn test_placeholder_titles() {
        assert!(is_placeholder_title("Untitled Document"));
        assert!(is_placeholder_title("Microsoft Word - results98.doc"));
        assert!(!is_placeholder_title("Harbor 10K"));
    }
}
