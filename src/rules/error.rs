use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    #[error("No standards table covers rules year {year}")]
    NoStandards { year: i32 },

    #[error("No standard for event '{event}' ({gender})")]
    UnknownEvent { event: String, gender: String },

    #[error("Cannot read performance mark: {0}")]
    UnparseablePerformance(String),

    #[error("Unknown gender code: {0}")]
    UnknownGender(String),
}
