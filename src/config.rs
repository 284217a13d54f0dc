use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Thresholds shared by the classifier and the parsers.
///
/// Every field is optional in JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Minimum `<pre>` text length for the classifier's `has_pre` signal
    pub classifier_pre_min_chars: usize,
    /// Minimum `<pre>` text length before the pre-text parser commits
    pub pre_min_chars: usize,
    /// Lines sampled by the fixed-width column heuristic
    pub fixed_width_sample_lines: usize,
    /// Lines a whitespace offset must recur in to count as a column boundary
    pub stable_boundary_min_lines: usize,
    /// Stable boundaries needed to call a block fixed-width
    pub min_stable_boundaries: usize,
    /// Non-empty lines scanned for event name/date/location in pre text
    pub metadata_scan_lines: usize,
    /// Header keyword hits needed to treat a table's first row as a header
    pub header_min_keyword_hits: usize,
    /// Keyword hits needed for a pre-text line to count as the column header
    pub pre_header_min_keywords: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            classifier_pre_min_chars: 100,
            pre_min_chars: 200,
            fixed_width_sample_lines: 20,
            stable_boundary_min_lines: 3,
            min_stable_boundaries: 3,
            metadata_scan_lines: 20,
            header_min_keyword_hits: 2,
            pre_header_min_keywords: 3,
        }
    }
}

impl ParserConfig {
    /// Parse and validate a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject thresholds that would make every document (or none) match
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("pre_min_chars", self.pre_min_chars),
            ("fixed_width_sample_lines", self.fixed_width_sample_lines),
            ("stable_boundary_min_lines", self.stable_boundary_min_lines),
            ("min_stable_boundaries", self.min_stable_boundaries),
            ("metadata_scan_lines", self.metadata_scan_lines),
            ("header_min_keyword_hits", self.header_min_keyword_hits),
            ("pre_header_min_keywords", self.pre_header_min_keywords),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}
