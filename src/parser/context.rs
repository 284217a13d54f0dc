use serde::{Deserialize, Serialize};

/// Optional hints supplied by the import side. Never required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseContext {
    pub source_url: Option<String>,
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    /// Suspected season year
    pub year: Option<i32>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

impl ParseContext {
    /// Copy the hints onto a result: event type, plus source/id/year echoed
    /// into metadata for the import side.
    pub(crate) fn annotate(&self, result: &mut super::ParsedResultSet) {
        if let Some(event_type) = &self.event_type {
            result.event_type = event_type.trim().to_string();
        }
        if let Some(url) = &self.source_url {
            result.set_metadata("source_url", url.as_str());
        }
        if let Some(id) = &self.event_id {
            result.set_metadata("event_id", id.as_str());
        }
        if let Some(year) = self.year {
            result.set_metadata("year_hint", year);
        }
    }
}
