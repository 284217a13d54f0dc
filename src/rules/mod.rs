//! Year-parameterized competition rules: age divisions, rule eras and
//! championship standards.
//!
//! Everything here is a pure lookup over immutable tables. Callers hold a
//! [`RulesEngine`] for the rules year they care about instead of reaching
//! for a global instance.

mod divisions;
mod error;
mod history;
mod standards;


pub use divisions::{
    competition_age, division_for_age, divisions, eligible_divisions, gender_in_text,
    parse_division_string, Division, DivisionEligibility, DivisionSpec, Gender,
};
pub use error::RulesError;
pub use history::{round_up_to, rule_set, RuleSet, TimingMethod, RULE_ERAS};
pub use standards::{
    championship_events, check_standard, event_key, event_kind, record_eligible, EventKind, Mark,
    RecordEligibility, StandardCheck, StandardLevel,
};

use chrono::NaiveDate;

/// Rules lookups bound to one rules year
#[derive(Debug, Clone, Copy)]
pub struct RulesEngine {
    year: i32,
    rules: &'static RuleSet,
}

impl RulesEngine {
    /// Create an engine for a rules year
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            rules: rule_set(year),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The rule era in force
    pub fn rules(&self) -> &'static RuleSet {
        self.rules
    }

    pub fn divisions(&self, gender: Gender) -> Vec<Division> {
        divisions(gender, self.year)
    }

    pub fn division_for_age(&self, age: u32, gender: Gender) -> Option<Division> {
        division_for_age(age, gender, self.year)
    }

    pub fn eligible_divisions(&self, age: u32, gender: Gender) -> Vec<DivisionEligibility> {
        eligible_divisions(age, gender, self.year)
    }

    /// Competition age of an athlete for this rules year
    pub fn competition_age(&self, birth_date: NaiveDate) -> Option<u32> {
        competition_age(birth_date, self.year)
    }

    /// Division for an athlete given a birth date rather than an age
    pub fn division_for_birth_date(&self, birth_date: NaiveDate, gender: Gender) -> Option<Division> {
        self.competition_age(birth_date)
            .and_then(|age| self.division_for_age(age, gender))
    }

    pub fn round_mark(&self, raw_seconds: f64, timing: TimingMethod) -> f64 {
        self.rules.round_mark(raw_seconds, timing)
    }

    pub fn check_standard<'a>(
        &self,
        event: &str,
        gender: Gender,
        mark: impl Into<Mark<'a>>,
    ) -> Result<StandardCheck, RulesError> {
        check_standard(self.year, event, gender, mark)
    }

    pub fn record_eligible(&self, event: &str, wind_mps: Option<f64>, timing: TimingMethod) -> RecordEligibility {
        record_eligible(self.year, event, wind_mps, timing)
    }

    pub fn championship_events(&self, gender: Gender) -> Result<(String, Vec<String>), RulesError> {
        championship_events(self.year, gender)
    }
}
