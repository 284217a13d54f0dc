use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::fields::parse_time_to_seconds;
use crate::rules::Gender;

/// Sex recorded on a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    /// First letter of the text, uppercased; `W` counts as female
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().chars().next()?.to_ascii_uppercase() {
            'M' => Some(Self::M),
            'F' | 'W' => Some(Self::F),
            _ => None,
        }
    }

    /// Single-sex equivalent of a rules gender; mixed has none
    pub fn from_gender(gender: Gender) -> Option<Self> {
        match gender {
            Gender::Male => Some(Self::M),
            Gender::Female => Some(Self::F),
            Gender::Mixed => None,
        }
    }
}

/// One finisher row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultRecord {
    pub place: Option<u32>,
    pub athlete_name: String,
    pub athlete_age: Option<u32>,
    pub sex: Option<Sex>,
    pub time_display: Option<String>,
    pub time_seconds: Option<u32>,
    pub points: Option<f64>,
    pub payout: Option<f64>,
    pub division: Option<String>,
    pub division_place: Option<u32>,
    pub sex_place: Option<u32>,
    pub club: Option<String>,
    pub bib: Option<String>,
    pub pace: Option<String>,
    pub city: Option<String>,
}

impl ResultRecord {
    pub fn new(athlete_name: impl Into<String>) -> Self {
        Self {
            athlete_name: athlete_name.into(),
            ..Self::default()
        }
    }

    /// Apply record defaults: trimmed text, blank strings to `None`,
    /// place zero dropped, seconds derived from the display time.
    fn normalize(&mut self) {
        self.athlete_name = crate::html::normalize_ws(&self.athlete_name);

        for field in [
            &mut self.time_display,
            &mut self.division,
            &mut self.club,
            &mut self.bib,
            &mut self.pace,
            &mut self.city,
        ] {
            if let Some(text) = field.take() {
                let text = crate::html::normalize_ws(&text);
                if !text.is_empty() {
                    *field = Some(text);
                }
            }
        }

        if self.place == Some(0) {
            self.place = None;
        }
        if self.time_seconds.is_none() {
            self.time_seconds = self.time_display.as_deref().and_then(parse_time_to_seconds);
        }
    }
}

/// Everything one parse invocation extracted from a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedResultSet {
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub event_location: Option<String>,
    pub event_type: String,
    /// Unique division labels, first-seen order
    pub divisions: Vec<String>,
    /// Finisher rows in document order
    pub results: Vec<ResultRecord>,
    /// Parser diagnostics (parser id, column layout, context hints)
    pub metadata: BTreeMap<String, Value>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ParsedResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finisher row. Rows without an athlete name are discarded.
    ///
    /// Returns whether the row was kept.
    pub fn add_result(&mut self, mut record: ResultRecord) -> bool {
        record.normalize();
        if record.athlete_name.is_empty() {
            return false;
        }
        if let Some(division) = &record.division {
            self.add_division(division.clone());
        }
        self.results.push(record);
        true
    }

    /// Record a division label once
    pub fn add_division(&mut self, division: String) {
        if !division.is_empty() && !self.divisions.contains(&division) {
            self.divisions.push(division);
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Plain JSON map for the import side, with `result_count` added
    pub fn to_value(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("result_count".to_string(), Value::from(self.result_count()));
        }
        value
    }
}
