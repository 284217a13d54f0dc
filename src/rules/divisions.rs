use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use super::history::rule_set;
use super::RulesError;

/// Competition gender; `Mixed` divisions are open to both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "X")]
    Mixed,
}

impl Gender {
    /// Parse `M`/`F`/`W`/`X` and the spelled-out words
    pub fn from_code(code: &str) -> Result<Self, RulesError> {
        match code.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "men" | "man" | "boys" => Ok(Self::Male),
            "f" | "w" | "female" | "women" | "woman" | "girls" | "ladies" => Ok(Self::Female),
            "x" | "mixed" | "open" => Ok(Self::Mixed),
            _ => Err(RulesError::UnknownGender(code.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Mixed => "X",
        }
    }

    /// Letter used in division codes (`M40`, `W100`)
    fn division_letter(&self) -> char {
        match self {
            Self::Male => 'M',
            Self::Female => 'W',
            Self::Mixed => 'X',
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            Self::Male => "Men",
            Self::Female => "Women",
            Self::Mixed => "Masters",
        }
    }

    fn youth(&self) -> &'static str {
        match self {
            Self::Male => "Boys",
            Self::Female => "Girls",
            Self::Mixed => "Youth",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A named age/gender competition category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Division {
    pub code: String,
    pub name: String,
    pub min_age: u32,
    /// `None` means no upper bound
    pub max_age: Option<u32>,
    pub gender: Gender,
}

impl Division {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && self.max_age.map_or(true, |max| age <= max)
    }
}

/// A division an athlete may enter, flagged primary or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionEligibility {
    pub division: Division,
    pub primary: bool,
    pub note: Option<String>,
}

/// Result of reverse-parsing free-form division text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DivisionSpec {
    pub gender: Option<Gender>,
    pub min_age: u32,
    pub max_age: Option<u32>,
}

/// Youth bands below open age: (min, max, label, code suffix)
const YOUTH_BANDS: &[(u32, u32, &str, &str)] = &[
    (0, 8, "8 & Under", "8U"),
    (9, 10, "9-10", "9-10"),
    (11, 12, "11-12", "11-12"),
    (13, 14, "13-14", "13-14"),
    (15, 16, "15-16", "15-16"),
    (17, 18, "17-18", "17-18"),
    (19, 19, "19", "19"),
];

/// The full, contiguous division ladder for a gender and rules year.
pub fn divisions(gender: Gender, year: i32) -> Vec<Division> {
    let rules = rule_set(year);
    let letter = gender.division_letter();
    let mut out = Vec::new();

    for &(min, max, label, suffix) in YOUTH_BANDS {
        out.push(Division {
            code: format!("{letter}{suffix}"),
            name: format!("{} {label}", gender.youth()),
            min_age: min,
            max_age: Some(max),
            gender,
        });
    }

    out.push(Division {
        code: format!("{letter}OPEN"),
        name: match gender {
            Gender::Mixed => "Open".to_string(),
            _ => format!("{} Open", gender.plural()),
        },
        min_age: rules.open_start_age,
        max_age: Some(rules.masters_start_age - 1),
        gender,
    });

    let mut start = rules.masters_start_age;
    while start < rules.masters_catch_all_age {
        let end = start + rules.masters_band_years - 1;
        out.push(Division {
            code: format!("{letter}{start}"),
            name: format!("{} {start}-{end}", gender.plural()),
            min_age: start,
            max_age: Some(end),
            gender,
        });
        start += rules.masters_band_years;
    }

    out.push(Division {
        code: format!("{letter}{}", rules.masters_catch_all_age),
        name: format!("{} {}+", gender.plural(), rules.masters_catch_all_age),
        min_age: rules.masters_catch_all_age,
        max_age: None,
        gender,
    });

    out
}

/// The division an athlete of `age` competes in for the rules year.
pub fn division_for_age(age: u32, gender: Gender, year: i32) -> Option<Division> {
    divisions(gender, year).into_iter().find(|d| d.contains(age))
}

/// Primary division plus open eligibility for masters-age athletes.
pub fn eligible_divisions(age: u32, gender: Gender, year: i32) -> Vec<DivisionEligibility> {
    let rules = rule_set(year);
    let mut out = Vec::new();

    let Some(primary) = division_for_age(age, gender, year) else {
        return out;
    };
    let is_masters = primary.min_age >= rules.masters_start_age;
    out.push(DivisionEligibility {
        division: primary,
        primary: true,
        note: None,
    });

    if is_masters {
        if let Some(open) = divisions(gender, year)
            .into_iter()
            .find(|d| d.min_age == rules.open_start_age)
        {
            out.push(DivisionEligibility {
                division: open,
                primary: false,
                note: Some("Open-eligible".to_string()),
            });
        }
    }
    out
}

/// Age for competition purposes: age on December 31 of the competition year,
/// not on the event date. `None` when born after that year.
pub fn competition_age(birth_date: NaiveDate, competition_year: i32) -> Option<u32> {
    let reference = NaiveDate::from_ymd_opt(competition_year, 12, 31)?;
    // Every birthday in the year has passed by Dec 31
    let age = reference.year() - birth_date.year();
    u32::try_from(age).ok()
}

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3})\s*(?:-|–|to)\s*(\d{1,3})").expect("valid division range regex")
});

static OVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\s*(?:\+|&\s*over|and\s+over|&\s*older|and\s+older|plus)")
        .expect("valid division over regex")
});

static UNDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(\d{1,2})\s*(?:&|and)\s*under|\bu-?(\d{1,2})\b)")
        .expect("valid division under regex")
});

static SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[mwfx]|men'?s?|women'?s?|male|female)?\s*(\d{1,3})$")
        .expect("valid division single-age regex")
});

static CODE_GENDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([mwfx])\s*\d").expect("valid division code gender regex")
});

static WOMEN_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:women'?s?|woman|female|ladies|girls)\b").expect("valid women regex")
});

static MEN_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:men'?s?|man|male|boys)\b").expect("valid men regex")
});

/// Gender named by free-form division text, if any
pub fn gender_in_text(text: &str) -> Option<Gender> {
    let trimmed = text.trim();
    if let Some(caps) = CODE_GENDER_RE.captures(trimmed) {
        return match caps[1].to_ascii_lowercase().as_str() {
            "m" => Some(Gender::Male),
            "w" | "f" => Some(Gender::Female),
            _ => Some(Gender::Mixed),
        };
    }
    if WOMEN_WORD_RE.is_match(trimmed) {
        Some(Gender::Female)
    } else if MEN_WORD_RE.is_match(trimmed) {
        Some(Gender::Male)
    } else {
        None
    }
}

/// Best-effort reverse parse of division text such as `M40-44`, `W50`,
/// `Masters 40+` or `8 & Under`. A lone number is a 5-year band.
pub fn parse_division_string(text: &str) -> Option<DivisionSpec> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let gender = gender_in_text(trimmed);

    if let Some(caps) = RANGE_RE.captures(trimmed) {
        let min: u32 = caps[1].parse().ok()?;
        let max: u32 = caps[2].parse().ok()?;
        if max >= min {
            return Some(DivisionSpec { gender, min_age: min, max_age: Some(max) });
        }
    }

    if let Some(caps) = OVER_RE.captures(trimmed) {
        let min: u32 = caps[1].parse().ok()?;
        return Some(DivisionSpec { gender, min_age: min, max_age: None });
    }

    if let Some(caps) = UNDER_RE.captures(trimmed) {
        if let Some(m) = caps.get(1) {
            let max: u32 = m.as_str().parse().ok()?;
            return Some(DivisionSpec { gender, min_age: 0, max_age: Some(max) });
        }
        if let Some(m) = caps.get(2) {
            let limit: u32 = m.as_str().parse().ok()?;
            return Some(DivisionSpec { gender, min_age: 0, max_age: Some(limit.saturating_sub(1)) });
        }
    }

    if let Some(caps) = SINGLE_RE.captures(trimmed) {
        let min: u32 = caps[1].parse().ok()?;
        return Some(DivisionSpec { gender, min_age: min, max_age: Some(min + 4) });
    }

    let lc = trimmed.to_ascii_lowercase();
    let keyword_band = if lc.contains("veteran") {
        Some((70, None))
    } else if lc.contains("super") {
        Some((60, None))
    } else if lc.contains("senior") {
        Some((50, None))
    } else if lc.contains("master") {
        Some((40, None))
    } else if lc.contains("open") {
        let rules = rule_set(i32::MAX);
        Some((rules.open_start_age, Some(rules.masters_start_age - 1)))
    } else {
        None
    };

    keyword_band.map(|(min_age, max_age)| DivisionSpec { gender, min_age, max_age })
}
