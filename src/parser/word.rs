//! Microsoft Word HTML exports.
//!
//! Word output is cleaned back to plain HTML, then handed to the table or
//! pre-text parser. Nothing is extracted here directly.

use regex::Regex;
use std::sync::LazyLock;

use super::{ParseContext, ParsedResultSet, PreTextParser, ResultParser, TableParser};
use crate::classifier;
use crate::config::ParserConfig;

/// Ordered cleanup passes: pattern and replacement.
static SANITIZE_PASSES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // XML prolog and processing instructions (`<?mso-application ...?>`)
        (r"(?is)<\?[^>]*\?>", ""),
        // Conditional comments, including their payload
        (r"(?is)<!--\[if[^\]]*\]>.*?<!\[endif\]-->", ""),
        (r"(?i)<!\[if[^\]]*\]>|<!\[endif\]>", ""),
        (r"(?is)<xml[^>]*>.*?</xml>", ""),
        (r"(?is)<style[^>]*>.*?</style>", ""),
        (r"(?s)<!--.*?-->", ""),
        // Generator, ProgId and Office metadata
        (r"(?i)<meta[^>]*>", ""),
        (r"(?i)<link[^>]*>", ""),
        // Office-namespaced elements with their content, then stray tags
        (r"(?is)<(?:o|w|v|m):[\w-]+[^>]*/>", ""),
        (r"(?is)<(?:o|w|v|m):([\w-]+)[^>]*>.*?</(?:o|w|v|m):[\w-]+\s*>", ""),
        (r"(?i)</?(?:o|w|v|m):[^>]*>", ""),
        // Smart tags are unwrapped, not dropped with their content: they wrap
        // athlete names and places that must survive into the results
        (r"(?i)</?st\d:[^>]*>", ""),
        (r#"(?i)\s+xmlns(?::\w+)?\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#, ""),
        (r#"(?i)\s+class\s*=\s*(?:"Mso[^"]*"|'Mso[^']*'|Mso[\w-]*)"#, ""),
        (r#"(?i)mso-[\w-]+\s*:[^;"'>]*;?"#, ""),
        (r#"(?i)\s+style\s*=\s*(?:"[\s;]*"|'[\s;]*')"#, ""),
        (r#"(?i)\s+lang\s*=\s*(?:"[^"]*"|'[^']*'|[\w-]+)"#, ""),
        (r"(?i)<span\s*>\s*</span>", ""),
        (r"(?i)<p(?:\s[^>]*)?>(?:\s|&nbsp;|\x{a0})*</p>", "<br>"),
        // Residual fingerprints in text or unknown attributes
        (r"(?i)urn:schemas-microsoft-com:office[\w:]*", ""),
        (r"(?i)word\.document(?:\.\d+)?", ""),
        (r"(?i)progid", ""),
        (r"(?i)mso-[\w-]*", ""),
        // Trailing spaces and blank-line runs; interior spacing is kept for `<pre>` columns
        (r"(?m)[ \t]+$", ""),
        (r"\n(?:[ \t]*\r?\n){2,}", "\n\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid word sanitize regex"), replacement))
    .collect()
});

/// Strip Word-specific markup, leaving plain HTML with no Office fingerprint.
pub fn sanitize_word_html(html: &str) -> String {
    let mut doc = html.to_string();
    for (pattern, replacement) in SANITIZE_PASSES.iter() {
        if let std::borrow::Cow::Owned(cleaned) = pattern.replace_all(&doc, *replacement) {
            doc = cleaned;
        }
    }
    doc
}

/// Decorator over the table and pre-text parsers for Word exports
#[derive(Debug, Clone, Default)]
pub struct WordHtmlParser {
    table: TableParser,
    pre: PreTextParser,
}

impl WordHtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            table: TableParser::with_config(config.clone()),
            pre: PreTextParser::with_config(config),
        }
    }
}

impl ResultParser for WordHtmlParser {
    fn id(&self) -> &'static str {
        "word"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn can_parse(&self, html: &str) -> bool {
        classifier::is_word_html(html)
    }

    fn parse(&self, html: &str, context: &ParseContext) -> ParsedResultSet {
        let cleaned = sanitize_word_html(html);
        let delegate: Option<&dyn ResultParser> = if self.table.can_parse(&cleaned) {
            Some(&self.table)
        } else if self.pre.can_parse(&cleaned) {
            Some(&self.pre)
        } else {
            None
        };

        let Some(delegate) = delegate else {
            tracing::warn!(original_len = html.len(), cleaned_len = cleaned.len(), "no delegate for word document");
            let mut result = ParsedResultSet::new();
            result.set_metadata("parser", self.id());
            context.annotate(&mut result);
            result.add_error("no suitable parser found");
            return result;
        };

        tracing::debug!(delegate = delegate.id(), "word document delegated");
        let mut result = delegate.parse(&cleaned, context);
        result.set_metadata("delegated_from", self.id());
        result.set_metadata("removed_bytes", html.len().saturating_sub(cleaned.len()));
        result
    }
}
