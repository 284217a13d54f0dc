//! Structural format signals for a raw result page.
//!
//! Signals are diagnostic only. Each parser makes its own applicability
//! decision; the registry never selects a parser from these flags.


use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::ParserConfig;
use crate::html;

/// Microsoft Office HTML fingerprints, matched case-insensitively.
pub const WORD_FINGERPRINTS: &[&str] = &[
    "urn:schemas-microsoft-com:office",
    "xmlns:o=",
    "xmlns:w=",
    "mso-",
    "progid",
    "word.document",
];

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(19[89]\d|20[0-2]\d)(?:\D|$)").expect("valid year regex")
});

/// Signals computed from one HTML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSignals {
    /// A `<table>` holds a `<tr>` holding a `<td>`
    pub has_tables: bool,
    /// A `<pre>` block carries enough text to be more than decoration
    pub has_pre: bool,
    /// Any Word-export fingerprint is present
    pub is_word_html: bool,
    /// The first `<pre>` block looks column-aligned
    pub has_fixed_width_columns: bool,
    /// First plausible season year in the document
    pub estimated_year: Option<i32>,
    pub table_count: usize,
    /// Character count of the first `<pre>` block's text
    pub pre_chars: usize,
    /// SHA-256 of the raw document, hex encoded
    pub fingerprint: String,
}

/// Compute format signals with default thresholds
pub fn analyze(html: &str) -> FormatSignals {
    analyze_with(html, &ParserConfig::default())
}

/// Compute format signals with the given thresholds
pub fn analyze_with(html: &str, config: &ParserConfig) -> FormatSignals {
    let pres = html::pre_texts(html);
    let first_pre = pres.first().map(String::as_str).unwrap_or("");

    FormatSignals {
        has_tables: has_table_structure(html),
        has_pre: pres
            .iter()
            .any(|p| p.trim().chars().count() >= config.classifier_pre_min_chars),
        is_word_html: is_word_html(html),
        has_fixed_width_columns: has_fixed_width_columns(first_pre, config),
        estimated_year: estimate_year(html),
        table_count: html::tag_blocks(html, "<table", "</table>").len(),
        pre_chars: first_pre.trim().chars().count(),
        fingerprint: fingerprint(html),
    }
}

/// True iff some `<table>` contains a `<tr>` that contains a `<td>`.
pub fn has_table_structure(html: &str) -> bool {
    html::tag_blocks(html, "<table", "</table>").into_iter().any(|table| {
        html::tag_blocks(table, "<tr", "</tr>")
            .into_iter()
            .any(|row| html::next_tag_block_ci(row, "<td", "</td>", 0).is_some())
    })
}

/// True iff any Office fingerprint appears anywhere in the document.
pub fn is_word_html(html: &str) -> bool {
    let lc = html::to_lower(html);
    WORD_FINGERPRINTS.iter().any(|fp| lc.contains(fp))
}

/// First 4-digit number that looks like a season year (1980-2029).
pub fn estimate_year(html: &str) -> Option<i32> {
    YEAR_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Column-alignment heuristic over the first non-trivial lines of a pre block.
///
/// Records the character offset of every run of two or more whitespace
/// characters per line; an offset recurring in enough lines is a stable
/// column boundary.
pub fn has_fixed_width_columns(pre_text: &str, config: &ParserConfig) -> bool {
    stable_boundaries(pre_text, config).len() >= config.min_stable_boundaries
}

/// Stable column boundaries in ascending order.
pub fn stable_boundaries(pre_text: &str, config: &ParserConfig) -> Vec<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();

    for line in pre_text
        .lines()
        .filter(|l| l.trim().chars().count() >= 10)
        .take(config.fixed_width_sample_lines)
    {
        for offset in whitespace_run_offsets(line) {
            *counts.entry(offset).or_default() += 1;
        }
    }

    let mut stable: Vec<usize> = counts
        .into_iter()
        .filter(|&(_, n)| n >= config.stable_boundary_min_lines)
        .map(|(offset, _)| offset)
        .collect();
    stable.sort_unstable();
    stable
}

/// Character offsets where runs of two or more whitespace characters start
fn whitespace_run_offsets(line: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;

    for (i, ch) in line.trim_end().chars().enumerate() {
        if ch.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(i);
            }
            run_len += 1;
        } else {
            if let Some(start) = run_start.take() {
                if run_len >= 2 && start > 0 {
                    offsets.push(start);
                }
            }
            run_len = 0;
        }
    }
    offsets
}

fn fingerprint(html: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    hex::encode(hasher.finalize())
}
