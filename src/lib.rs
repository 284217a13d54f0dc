// Public API exports
pub mod classifier;
pub mod config;
pub mod html;
pub mod parser;
pub mod rules;

// Re-export main types for convenience
pub use classifier::{analyze, FormatSignals};
pub use config::{ConfigError, ParserConfig};

pub use parser::{
    ParseContext, ParsedResultSet, ParserRegistry, PreTextParser, RegistryAnalysis, RegistryError,
    ResultParser, ResultRecord, Sex, TableParser, WordHtmlParser,
};

pub use rules::{Division, Gender, RulesEngine, RulesError, TimingMethod};
