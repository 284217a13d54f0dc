use serde::Serialize;

use super::divisions::Gender;
use super::divisions::Gender::{Female as F, Male as M};
use super::history::{rule_set, TimingMethod};
use super::RulesError;
use crate::parser::fields::parse_time_fraction;

/// Direction of "better" for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// Timed on the track; lower is better
    Track,
    /// Timed on the roads or cross country; lower is better
    Road,
    /// Measured jumps and throws; higher is better
    Field,
}

impl EventKind {
    pub fn lower_is_better(&self) -> bool {
        !matches!(self, Self::Field)
    }
}

/// A performance as written on a result page or entered by an operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark<'a> {
    Value(f64),
    Text(&'a str),
}

impl From<f64> for Mark<'_> {
    fn from(value: f64) -> Self {
        Mark::Value(value)
    }
}

impl<'a> From<&'a str> for Mark<'a> {
    fn from(text: &'a str) -> Self {
        Mark::Text(text)
    }
}

impl Mark<'_> {
    /// Seconds for times (`4:05.3`), meters for distances (`6.45m`)
    pub fn normalize(&self) -> Result<f64, RulesError> {
        match *self {
            Mark::Value(v) if v.is_finite() && v >= 0.0 => Ok(v),
            Mark::Value(v) => Err(RulesError::UnparseablePerformance(v.to_string())),
            Mark::Text(text) => {
                let cleaned = text.trim().trim_end_matches(['m', 'M', 's']).trim();
                let parsed = if cleaned.contains(':') {
                    parse_time_fraction(cleaned)
                } else {
                    cleaned.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
                };
                parsed.ok_or_else(|| RulesError::UnparseablePerformance(text.to_string()))
            }
        }
    }
}

/// Qualifying level reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StandardLevel {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardCheck {
    pub event: String,
    pub gender: Gender,
    pub kind: EventKind,
    pub mark: f64,
    pub standard_a: f64,
    pub standard_b: f64,
    pub level: Option<StandardLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEligibility {
    pub eligible: bool,
    pub reason: Option<String>,
}

struct StandardEntry {
    event: &'static str,
    gender: Gender,
    a: f64,
    b: f64,
}

struct StandardsTable {
    from_year: i32,
    name: &'static str,
    entries: &'static [StandardEntry],
}

const fn entry(event: &'static str, gender: Gender, a: f64, b: f64) -> StandardEntry {
    StandardEntry { event, gender, a, b }
}

static STANDARDS_2008: &[StandardEntry] = &[
    entry("100m", M, 10.95, 11.30),
    entry("100m", F, 12.20, 12.65),
    entry("200m", M, 22.10, 22.85),
    entry("200m", F, 25.00, 25.90),
    entry("400m", M, 49.20, 50.80),
    entry("400m", F, 57.50, 59.50),
    entry("800m", M, 115.0, 119.0),
    entry("800m", F, 136.0, 141.0),
    entry("1500m", M, 237.0, 246.0),
    entry("1500m", F, 282.0, 292.0),
    entry("5000m", M, 870.0, 900.0),
    entry("5000m", F, 1020.0, 1065.0),
    entry("10000m", M, 1830.0, 1890.0),
    entry("10000m", F, 2130.0, 2220.0),
    entry("marathon", M, 8700.0, 9300.0),
    entry("marathon", F, 10200.0, 10800.0),
    entry("highjump", M, 2.05, 1.98),
    entry("highjump", F, 1.70, 1.63),
    entry("longjump", M, 7.20, 6.95),
    entry("longjump", F, 5.95, 5.70),
    entry("shotput", M, 16.50, 15.50),
    entry("shotput", F, 13.80, 13.00),
];

static STANDARDS_2016: &[StandardEntry] = &[
    entry("100m", M, 10.85, 11.20),
    entry("100m", F, 12.10, 12.50),
    entry("200m", M, 21.90, 22.60),
    entry("200m", F, 24.80, 25.60),
    entry("400m", M, 48.90, 50.40),
    entry("400m", F, 56.90, 58.80),
    entry("800m", M, 113.5, 117.5),
    entry("800m", F, 134.0, 139.0),
    entry("1500m", M, 234.0, 243.0),
    entry("1500m", F, 278.0, 288.0),
    entry("mile", M, 252.0, 262.0),
    entry("mile", F, 300.0, 312.0),
    entry("5000m", M, 860.0, 890.0),
    entry("5000m", F, 1005.0, 1050.0),
    entry("10000m", M, 1805.0, 1865.0),
    entry("10000m", F, 2100.0, 2190.0),
    entry("5k", M, 900.0, 960.0),
    entry("5k", F, 1050.0, 1110.0),
    entry("10k", M, 1860.0, 1980.0),
    entry("10k", F, 2160.0, 2280.0),
    entry("halfmarathon", M, 4080.0, 4320.0),
    entry("halfmarathon", F, 4740.0, 5040.0),
    entry("marathon", M, 8580.0, 9120.0),
    entry("marathon", F, 9960.0, 10560.0),
    entry("highjump", M, 2.08, 2.00),
    entry("highjump", F, 1.72, 1.65),
    entry("longjump", M, 7.30, 7.00),
    entry("longjump", F, 6.05, 5.80),
    entry("triplejump", M, 15.20, 14.60),
    entry("triplejump", F, 12.60, 12.10),
    entry("shotput", M, 17.00, 16.00),
    entry("shotput", F, 14.20, 13.40),
    entry("discus", M, 52.00, 48.00),
    entry("discus", F, 45.00, 41.00),
    entry("javelin", M, 64.00, 59.00),
    entry("javelin", F, 46.00, 42.00),
];

/// Championship standards tables, oldest first.
static STANDARDS: &[StandardsTable] = &[
    StandardsTable { from_year: 2008, name: "Championship Standards 2008", entries: STANDARDS_2008 },
    StandardsTable { from_year: 2016, name: "Championship Standards 2016", entries: STANDARDS_2016 },
];

fn standards_table(year: i32) -> Result<&'static StandardsTable, RulesError> {
    STANDARDS
        .iter()
        .rev()
        .find(|t| t.from_year <= year)
        .ok_or(RulesError::NoStandards { year })
}

/// Canonical lookup key: `"100 Meters"` → `100m`, `"Half-Marathon"` → `halfmarathon`
pub fn event_key(event: &str) -> String {
    let mut key: String = event
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    for (long, short) in [
        ("kilometers", "k"),
        ("kilometres", "k"),
        ("km", "k"),
        ("meters", "m"),
        ("metres", "m"),
        ("meter", "m"),
        ("hurdles", "h"),
        ("miles", "mile"),
        ("throw", ""),
    ] {
        if key.ends_with(long) {
            key.truncate(key.len() - long.len());
            key.push_str(short);
        }
    }
    if key == "1mile" {
        key = "mile".to_string();
    }
    key
}

/// Classify an event by name
pub fn event_kind(event: &str) -> EventKind {
    let key = event_key(event);
    const FIELD: &[&str] = &["jump", "vault", "shot", "discus", "javelin", "hammer", "weight"];
    const ROAD: &[&str] = &["marathon", "xc", "crosscountry", "road"];

    if FIELD.iter().any(|f| key.contains(f)) {
        EventKind::Field
    } else if ROAD.iter().any(|r| key.contains(r)) || key.ends_with('k') {
        EventKind::Road
    } else {
        EventKind::Track
    }
}

/// Compare a performance against the A/B standards of the rules year.
pub fn check_standard<'a>(
    year: i32,
    event: &str,
    gender: Gender,
    mark: impl Into<Mark<'a>>,
) -> Result<StandardCheck, RulesError> {
    let table = standards_table(year)?;
    let key = event_key(event);
    let entry = table
        .entries
        .iter()
        .find(|e| e.event == key && e.gender == gender)
        .ok_or_else(|| RulesError::UnknownEvent {
            event: event.to_string(),
            gender: gender.to_string(),
        })?;

    let value = mark.into().normalize()?;
    let kind = event_kind(event);
    let meets = |standard: f64| {
        if kind.lower_is_better() {
            value <= standard
        } else {
            value >= standard
        }
    };

    let level = if meets(entry.a) {
        Some(StandardLevel::A)
    } else if meets(entry.b) {
        Some(StandardLevel::B)
    } else {
        None
    };

    Ok(StandardCheck {
        event: key,
        gender,
        kind,
        mark: value,
        standard_a: entry.a,
        standard_b: entry.b,
        level,
    })
}

/// Events carrying a standard for the gender in the rules year
pub fn championship_events(year: i32, gender: Gender) -> Result<(String, Vec<String>), RulesError> {
    let table = standards_table(year)?;
    let events = table
        .entries
        .iter()
        .filter(|e| e.gender == gender)
        .map(|e| e.event.to_string())
        .collect();
    Ok((table.name.to_string(), events))
}

/// Sprint distances affected by wind and short enough to require FAT
fn sprint_distance(key: &str) -> Option<u32> {
    let digits: String = key.chars().take_while(|c| c.is_ascii_digit()).collect();
    let rest = &key[digits.len()..];
    if !matches!(rest, "m" | "mh") {
        return None;
    }
    digits.parse().ok()
}

/// Whether a mark can stand as a record under the rules year's wind and timing rules.
pub fn record_eligible(year: i32, event: &str, wind_mps: Option<f64>, timing: TimingMethod) -> RecordEligibility {
    let rules = rule_set(year);
    let key = event_key(event);
    let kind = event_kind(event);
    let sprint = sprint_distance(&key);

    let ineligible = |reason: String| RecordEligibility {
        eligible: false,
        reason: Some(reason),
    };

    let wind_affected = sprint.is_some_and(|d| d <= 200) || key == "longjump" || key == "triplejump";
    if wind_affected {
        match wind_mps {
            None => return ineligible("no wind reading".to_string()),
            Some(w) if w > rules.wind_limit_mps => {
                return ineligible(format!("wind-aided (+{w:.1} m/s > {:.1})", rules.wind_limit_mps));
            }
            Some(_) => {}
        }
    }

    if sprint.is_some_and(|d| d <= 400) && timing == TimingMethod::Hand {
        return ineligible("hand timing not accepted at 400m or shorter".to_string());
    }

    if kind == EventKind::Road && timing == TimingMethod::Chip && !rules.chip_time_official {
        return ineligible(format!("chip time not official before {}", super::history::RULE_ERAS[1].from_year));
    }

    RecordEligibility {
        eligible: true,
        reason: None,
    }
}
