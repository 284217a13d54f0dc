mod context;
pub mod fields;
pub mod metadata;
mod pre_text;
mod registry;
mod result;
mod table;
mod word;

#[cfg(test)]
mod tests;

pub use context::ParseContext;
pub use pre_text::PreTextParser;
pub use registry::{ParserCandidate, ParserRegistry, RegistryAnalysis, RegistryError};
pub use result::{ParsedResultSet, ResultRecord, Sex};
pub use table::TableParser;
pub use word::{sanitize_word_html, WordHtmlParser};

/// Core trait that all result-page parsers must implement
///
/// Parsers are stateless: column layouts and section context live in locals
/// of one `parse` call, so a single instance can be shared across threads.
pub trait ResultParser: Send + Sync {
    /// Stable identifier (`"table"`, `"pre"`, `"word"`)
    fn id(&self) -> &'static str;

    /// Selection rank; lower values are tried first
    fn priority(&self) -> i32;

    /// Cheap applicability check, no extraction
    fn can_parse(&self, html: &str) -> bool;

    /// Extract results and event metadata
    ///
    /// # Arguments
    /// * `html` - Raw page markup
    /// * `context` - Optional hints from the import side
    ///
    /// # Returns
    /// A result set; structural failure is reported through its `errors`
    fn parse(&self, html: &str, context: &ParseContext) -> ParsedResultSet;
}
