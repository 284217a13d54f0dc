use super::{ParseContext, ParsedResultSet, PreTextParser, ResultParser, TableParser, WordHtmlParser};
use crate::classifier::{self, FormatSignals};
use crate::config::ParserConfig;
use serde::Serialize;
use thiserror::Error;

/// Registry-level failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No parser can handle this document")]
    NoApplicableParser,
}

/// One parser's view of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserCandidate {
    pub id: &'static str,
    pub priority: i32,
    pub applicable: bool,
}

/// Diagnostic report for the preview tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryAnalysis {
    pub signals: FormatSignals,
    /// Every registered parser, in selection order
    pub candidates: Vec<ParserCandidate>,
    /// Id of the parser `detect` would pick
    pub selected: Option<&'static str>,
}

/// Priority-ordered dispatch table for result parsers
pub struct ParserRegistry {
    /// Sorted by ascending priority
    parsers: Vec<Box<dyn ResultParser>>,
    config: ParserConfig,
}

impl ParserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::empty(ParserConfig::default())
    }

    fn empty(config: ParserConfig) -> Self {
        Self {
            parsers: Vec::new(),
            config,
        }
    }

    /// Registry holding the Word, table and pre-text parsers
    pub fn with_default_parsers() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Default parsers built with the given thresholds
    pub fn with_config(config: ParserConfig) -> Self {
        let mut registry = Self::empty(config.clone());
        registry.register(WordHtmlParser::with_config(config.clone()));
        registry.register(TableParser::with_config(config.clone()));
        registry.register(PreTextParser::with_config(config));
        registry
    }

    /// Register a parser. Equal priorities keep registration order.
    ///
    /// # Example
    /// ```ignore
    /// registry.register(TableParser::new());
    /// registry.register(PreTextParser::new());
    /// ```
    pub fn register(&mut self, parser: impl ResultParser + 'static) {
        tracing::debug!(parser_id = parser.id(), priority = parser.priority(), "registering parser");
        self.parsers.push(Box::new(parser));
        self.parsers.sort_by_key(|p| p.priority());
    }

    /// First parser, by priority, whose `can_parse` accepts the document
    pub fn detect(&self, html: &str) -> Option<&dyn ResultParser> {
        let selected = self.parsers.iter().find(|p| p.can_parse(html)).map(|p| &**p);
        match selected {
            Some(parser) => tracing::debug!(parser_id = parser.id(), "parser selected"),
            None => tracing::debug!("no parser applicable"),
        }
        selected
    }

    /// Detect and parse in one step
    pub fn parse(&self, html: &str, context: &ParseContext) -> Result<ParsedResultSet, RegistryError> {
        let parser = self.detect(html).ok_or(RegistryError::NoApplicableParser)?;
        let result = parser.parse(html, context);
        if result.results.is_empty() {
            tracing::warn!(
                parser_id = parser.id(),
                errors = result.errors.len(),
                "parser returned no results"
            );
        }
        Ok(result)
    }

    /// Classifier signals plus every parser's applicability
    pub fn analyze(&self, html: &str) -> RegistryAnalysis {
        let candidates: Vec<ParserCandidate> = self
            .parsers
            .iter()
            .map(|p| ParserCandidate {
                id: p.id(),
                priority: p.priority(),
                applicable: p.can_parse(html),
            })
            .collect();
        let selected = candidates.iter().find(|c| c.applicable).map(|c| c.id);

        RegistryAnalysis {
            signals: classifier::analyze_with(html, &self.config),
            candidates,
            selected,
        }
    }

    /// Get the number of registered parsers
    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    /// Registered parser ids in selection order
    pub fn parser_ids(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.id()).collect()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}
