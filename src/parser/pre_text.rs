//! Fixed-width results inside `<pre>` blocks.
//!
//! Column offsets are detected and reported, but each field of a result line
//! is located by its own anchored pattern so drifting offsets across old
//! documents do not shift values into the wrong fields.

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

use super::fields::division_for_bucket;
use super::{metadata, ParseContext, ParsedResultSet, ResultParser, ResultRecord, Sex};
use crate::config::ParserConfig;
use crate::html;

static RESULT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\.?\s+(\S.*)$").expect("valid result line regex")
});

static DATA_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\.?\s+[A-Z]").expect("valid data line regex")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?\b").expect("valid time regex")
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}(?:\.\d+)?\b").expect("valid pace regex")
});

static DIVISION_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([MW])(\d{2})(?:-(\d{2}))?\b").expect("valid division token regex")
});

static RANGED_DIVISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[MW]\d{2}-\d{2}\b").expect("valid ranged division regex")
});

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-=]{3,}[-=\s]*$").expect("valid separator regex")
});

static RACE_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:championships?|5k|8k|10k|12k|15k|marathon|half|mile|cross[- ]country|xc|\d+\s*miler?)\b")
        .expect("valid race type regex")
});

static STATE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?),\s*([A-Z]{2})$").expect("valid state suffix regex")
});

static CITY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?),\s*([A-Z][A-Za-z.'\-]*)$").expect("valid city suffix regex")
});

/// Header keywords per field. Longer fields come first so `div pl` is not
/// also claimed by `div`.
const HEADER_FIELDS: &[(&str, &[&str])] = &[
    ("division_place", &["div pl", "div place"]),
    ("sex_place", &["sex pl", "sex place"]),
    ("place", &["place", "pos", "o'all", "overall", "rank"]),
    ("name", &["name", "athlete", "runner"]),
    ("bib", &["bib", "no.", "#"]),
    ("time", &["time", "finish"]),
    ("sex", &["sex"]),
    ("division", &["division", "div", "age group", "ag"]),
    ("pace", &["pace", "min/mi", "/mi"]),
    ("club", &["club", "team", "affil"]),
    ("city", &["city", "location", "from"]),
];

/// Offsets assumed when a block has no header line
const DEFAULT_COLUMNS: &[(&str, usize)] = &[
    ("place", 0),
    ("name", 8),
    ("bib", 40),
    ("time", 48),
    ("sex_place", 60),
    ("division", 68),
    ("division_place", 78),
    ("pace", 86),
];

/// Column layout of one block, in character offsets
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    columns: Vec<(String, usize)>,
    header_line: Option<String>,
}

impl ColumnLayout {
    fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .map(|(field, offset)| (field.clone(), json!(offset)))
            .collect();
        Value::Object(map)
    }
}

/// Section context while walking the block
#[derive(Debug, Default)]
struct SectionState {
    in_results: bool,
    current_sex: Option<Sex>,
    markers: Vec<String>,
}

/// Parser for fixed-width `<pre>` text
#[derive(Debug, Clone, Default)]
pub struct PreTextParser {
    config: ParserConfig,
}

impl PreTextParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    fn is_substantial(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.config.pre_min_chars
    }

    /// Event name, date and location from the top of the block
    fn extract_metadata(&self, lines: &[&str], html: &str, result: &mut ParsedResultSet) {
        let head: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .take(self.config.metadata_scan_lines)
            .collect();

        let title = metadata::heading_title(html).filter(|t| !metadata::is_placeholder_title(t));
        let race_line = head
            .iter()
            .filter(|l| (5..=60).contains(&l.chars().count()) && RACE_TYPE_RE.is_match(l))
            .max_by_key(|l| l.chars().count())
            .map(|l| html::normalize_ws(l));

        result.event_name = match (title, race_line) {
            (Some(title), _) => title,
            (None, Some(line)) => line,
            (None, None) => String::new(),
        };
        if result.event_name.is_empty() {
            result.add_warning("no event name found");
        }

        let head_text = head.join("\n");
        result.event_date = metadata::long_form_date(&head_text)
            .or_else(|| metadata::extract_date(&head_text))
            .or_else(|| metadata::extract_date(&html::visible_text(html)));
        result.event_location =
            metadata::city_state_location(&head_text).or_else(|| metadata::extract_location(&head_text));
    }

    /// Header-line offsets, else the default table refined from a data line
    fn detect_columns(&self, lines: &[&str]) -> ColumnLayout {
        for line in lines {
            let columns = header_columns(line);
            if columns.len() >= self.config.pre_header_min_keywords {
                return ColumnLayout {
                    columns,
                    header_line: Some(line.trim_end().to_string()),
                };
            }
        }

        let mut columns: Vec<(String, usize)> = DEFAULT_COLUMNS
            .iter()
            .map(|(field, offset)| (field.to_string(), *offset))
            .collect();
        if let Some(line) = lines.iter().find(|l| DATA_LINE_RE.is_match(l)) {
            refine_columns(&mut columns, line);
        }
        ColumnLayout {
            columns,
            header_line: None,
        }
    }
}

impl ResultParser for PreTextParser {
    fn id(&self) -> &'static str {
        "pre"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn can_parse(&self, html: &str) -> bool {
        html::pre_texts(html).iter().any(|text| self.is_substantial(text))
    }

    fn parse(&self, html: &str, context: &ParseContext) -> ParsedResultSet {
        let mut result = ParsedResultSet::new();
        result.set_metadata("parser", self.id());
        context.annotate(&mut result);

        let blocks = html::pre_texts(html);
        let Some(text) = blocks
            .iter()
            .find(|t| self.is_substantial(t))
            .or_else(|| blocks.iter().find(|t| !t.trim().is_empty()))
        else {
            tracing::warn!("no <pre> content found");
            result.add_error("no <pre> content found");
            return result;
        };

        let lines: Vec<&str> = text.lines().collect();
        self.extract_metadata(&lines, html, &mut result);

        let layout = self.detect_columns(&lines);
        result.set_metadata("columns", layout.to_value());
        result.set_metadata("column_source", if layout.header_line.is_some() { "header" } else { "default" });
        if let Some(header) = &layout.header_line {
            result.set_metadata("header_line", header.as_str());
        }

        let mut state = SectionState::default();
        for line in &lines {
            if line.trim().is_empty() {
                continue;
            }
            if SEPARATOR_RE.is_match(line) {
                state.in_results = true;
                continue;
            }
            if let Some(sex) = section_sex(line) {
                state.current_sex = Some(sex);
                state.markers.push(html::normalize_ws(line));
                continue;
            }
            if let Some(mut record) = parse_result_line(line) {
                if record.sex.is_none() {
                    record.sex = state.current_sex;
                }
                result.add_result(record);
            }
        }

        result.set_metadata("in_results", state.in_results);
        result.set_metadata("sections", state.markers);
        if result.results.is_empty() {
            tracing::warn!(lines = lines.len(), "no result lines recognized");
            result.add_warning("no result lines recognized");
        }
        result
    }
}

/// Fields named on a candidate header line with their character offsets
fn header_columns(line: &str) -> Vec<(String, usize)> {
    let lc = html::to_lower(line);
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut columns = Vec::new();

    for (field, keywords) in HEADER_FIELDS {
        let hit = keywords.iter().find_map(|k| {
            lc.match_indices(k)
                .map(|(at, m)| (at, at + m.len()))
                .find(|&(start, end)| {
                    word_bounded(&lc, start, end) && !claimed.iter().any(|&(s, e)| start < e && s < end)
                })
        });
        if let Some((start, end)) = hit {
            claimed.push((start, end));
            columns.push((field.to_string(), lc[..start].chars().count()));
        }
    }
    columns.sort_by_key(|(_, offset)| *offset);
    columns
}

/// Alphabetic keywords must not sit inside a longer word
fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let first = text[start..].chars().next();
    let last = text[..end].chars().next_back();
    let edge = |c: Option<char>, inner: Option<char>| match (c, inner) {
        (Some(c), Some(i)) if i.is_alphabetic() => !c.is_alphabetic(),
        _ => true,
    };
    edge(before, first) && edge(after, last)
}

/// Move the time and division offsets to where a real data line has them
fn refine_columns(columns: &mut [(String, usize)], line: &str) {
    let char_offset = |byte: usize| line[..byte].chars().count();
    let time_at = TIME_RE.find(line).map(|m| char_offset(m.start()));
    let division_at = RANGED_DIVISION_RE.find(line).map(|m| char_offset(m.start()));

    for (field, offset) in columns.iter_mut() {
        match (field.as_str(), time_at, division_at) {
            ("time", Some(at), _) => *offset = at,
            ("division", _, Some(at)) => *offset = at,
            _ => {}
        }
    }
}

/// `WOMEN`/`FEMALE`/`LADIES` or `MEN`/`MALE` section heading
fn section_sex(line: &str) -> Option<Sex> {
    let word: String = line
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic() || *c == '\'')
        .filter(|c| *c != '\'')
        .collect::<String>()
        .to_ascii_uppercase();
    match word.trim_end_matches('S') {
        "WOMEN" | "FEMALE" | "LADIE" => Some(Sex::F),
        "MEN" | "MALE" => Some(Sex::M),
        _ => None,
    }
}

/// Name run after the place number: stops at two spaces, a tab or a digit.
/// Returns the raw name and the byte offset where it ends.
fn name_run(rest: &str) -> (&str, usize) {
    let mut end = rest.len();
    let mut prev_space = false;
    for (i, ch) in rest.char_indices() {
        if ch.is_ascii_digit() || ch == '\t' || (ch == ' ' && prev_space) {
            end = if prev_space { i - 1 } else { i };
            break;
        }
        prev_space = ch == ' ';
    }
    (&rest[..end], end)
}

/// Clean a captured name and split off a trailing `, XX` state or city.
fn split_name_suffix(raw: &str) -> (String, Option<String>) {
    let name = html::trim_punctuation(raw);
    if let Some(caps) = STATE_SUFFIX_RE.captures(name) {
        return (caps[1].trim().to_string(), Some(caps[2].to_string()));
    }
    if let Some(caps) = CITY_SUFFIX_RE.captures(name) {
        // `Smith, John` is a surname-first name, not a city
        if caps[1].split_whitespace().count() >= 2 {
            return (caps[1].trim().to_string(), Some(caps[2].to_string()));
        }
    }
    (name.to_string(), None)
}

/// Last whitespace token of the text and its byte offset, if it is a bare number
fn trailing_number(text: &str) -> Option<(usize, &str)> {
    let trimmed = text.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let token = &trimmed[start..];
    (!token.is_empty() && token.chars().all(|c| c.is_ascii_digit())).then_some((start, token))
}

/// Leading digits of the first whitespace token and its byte offset, e.g.
/// `3` from `3/45`. Clock values are not places.
fn leading_number(text: &str) -> Option<(usize, u32)> {
    let start = text.len() - text.trim_start().len();
    let token = text[start..].split_whitespace().next()?;
    if token.contains(':') {
        return None;
    }
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().map(|n| (start, n))
}

/// Parse one result line. Lines without a place number or a name yield `None`.
fn parse_result_line(line: &str) -> Option<ResultRecord> {
    let caps = RESULT_LINE_RE.captures(line)?;
    let rest_match = caps.get(2)?;
    let rest = rest_match.as_str();

    let (raw_name, name_end) = name_run(rest);
    let (name, city) = split_name_suffix(raw_name);
    if !name.chars().any(char::is_alphabetic) {
        return None;
    }

    let mut record = ResultRecord::new(name);
    record.place = caps[1].parse().ok();
    record.city = city;

    let tail = &rest[name_end..];
    let mut bib_at = None;
    if let Some(time) = TIME_RE.find(tail) {
        record.time_display = Some(time.as_str().to_string());
        if let Some((at, bib)) = trailing_number(&tail[..time.start()]).filter(|(_, bib)| bib.len() <= 5) {
            bib_at = Some(at);
            record.bib = Some(bib.to_string());
        }

        let after_time = time.end();
        if let Some(pace) = CLOCK_RE
            .find_iter(&tail[after_time..])
            .filter(|m| standalone_clock(&tail[after_time..], m.start(), m.end()))
            .last()
        {
            record.pace = Some(pace.as_str().to_string());
        }
    }

    // Age-group columns sit before or after the time depending on the page
    if let Some(division) = DIVISION_TOKEN_RE.captures(tail) {
        let (Some(token), Some(letter), Some(age)) = (division.get(0), division.get(1), division.get(2)) else {
            return Some(record);
        };
        record.sex = Sex::from_text(letter.as_str());
        if let Ok(age) = age.as_str().parse::<u32>() {
            record.division = Some(division_for_bucket(age).to_string());
        }
        record.sex_place = trailing_number(&tail[..token.start()])
            .filter(|(at, _)| Some(*at) != bib_at)
            .and_then(|(_, n)| n.parse().ok());
        record.division_place = leading_number(&tail[token.end()..])
            .filter(|(at, _)| Some(token.end() + at) != bib_at)
            .map(|(_, n)| n);
    }

    Some(record)
}

/// A clock match not glued to a neighbouring `:`, so `1:02:45` yields no pace
fn standalone_clock(text: &str, start: usize, end: usize) -> bool {
    !text[..start].ends_with(':') && !text[end..].starts_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_line_with_city_bleed() {
        let record = parse_result_line("    1. Christophe Impens, Albuqu     6    14:13").unwrap();
        assert_eq!(record.place, Some(1));
        assert_eq!(record.athlete_name, "Christophe Impens");
        assert_eq!(record.city.as_deref(), Some("Albuqu"));
        assert_eq!(record.bib.as_deref(), Some("6"));
        assert_eq!(record.time_display.as_deref(), Some("14:13"));
        assert_eq!(record.pace, None);
    }

    #[test]
    fn test_result_line_full_layout() {
        let line = "  12  Maria Lopez, CA           412    38:05     7  W45-49   2   6:08";
        let record = parse_result_line(line).unwrap();
        assert_eq!(record.place, Some(12));
        assert_eq!(record.athlete_name, "Maria Lopez");
        assert_eq!(record.bib.as_deref(), Some("412"));
        assert_eq!(record.time_display.as_deref(), Some("38:05"));
        assert_eq!(record.sex, Some(Sex::F));
        assert_eq!(record.sex_place, Some(7));
        assert_eq!(record.division.as_deref(), Some("Masters 40+"));
        assert_eq!(record.division_place, Some(2));
        assert_eq!(record.pace.as_deref(), Some("6:08"));
    }

    #[test]
    fn test_division_before_time() {
        let record = parse_result_line("1. John Smith   M45-49   123   17:02").unwrap();
        assert_eq!(record.athlete_name, "John Smith");
        assert_eq!(record.sex, Some(Sex::M));
        assert_eq!(record.division.as_deref(), Some("Masters 40+"));
        assert_eq!(record.bib.as_deref(), Some("123"));
        assert_eq!(record.time_display.as_deref(), Some("17:02"));
        assert_eq!(record.division_place, None);
        assert_eq!(record.sex_place, None);
    }

    #[test]
    fn test_division_places_around_leading_token() {
        let record = parse_result_line("  4. Ann Lee    9  W50-54  2    88   19:30   6:17").unwrap();
        assert_eq!(record.sex, Some(Sex::F));
        assert_eq!(record.division.as_deref(), Some("Seniors 50+"));
        assert_eq!(record.sex_place, Some(9));
        assert_eq!(record.division_place, Some(2));
        assert_eq!(record.bib.as_deref(), Some("88"));
        assert_eq!(record.pace.as_deref(), Some("6:17"));
    }

    #[test]
    fn test_pace_is_not_division_place() {
        let record = parse_result_line("7. Lee Park    55   21:10  M30   6:49").unwrap();
        assert_eq!(record.division.as_deref(), Some("Open"));
        assert_eq!(record.division_place, None);
        assert_eq!(record.pace.as_deref(), Some("6:49"));
    }

    #[test]
    fn test_surname_first_kept() {
        let record = parse_result_line("3. Smith, John    21:40").unwrap();
        assert_eq!(record.athlete_name, "Smith, John");
        assert_eq!(record.city, None);
    }

    #[test]
    fn test_hour_time_has_no_pace() {
        let record = parse_result_line("5. Pat Kelly   1:02:45").unwrap();
        assert_eq!(record.time_display.as_deref(), Some("1:02:45"));
        assert_eq!(record.pace, None);
    }

    #[test]
    fn test_non_result_lines() {
        assert!(parse_result_line("PLACE NAME TIME").is_none());
        assert!(parse_result_line("  14   17:02").is_none());
        assert!(parse_result_line("").is_none());
    }

    #[test]
    fn test_section_markers() {
        assert_eq!(section_sex("WOMEN'S RESULTS"), Some(Sex::F));
        assert_eq!(section_sex("  Men"), Some(Sex::M));
        assert_eq!(section_sex("Female Open"), Some(Sex::F));
        assert_eq!(section_sex("Mendocino Run"), None);
        assert_eq!(section_sex("1. Anne"), None);
    }

    #[test]
    fn test_header_columns() {
        let header = "PLACE  NAME                 BIB   TIME   DIV   DIV PL  PACE";
        let columns = header_columns(header);
        let fields: Vec<&str> = columns.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["place", "name", "bib", "time", "division", "division_place", "pace"]);
        assert_eq!(columns[0].1, 0);
        assert_eq!(columns[1].1, 7);
    }

    #[test]
    fn test_refine_from_data_line() {
        let parser = PreTextParser::new();
        let lines = ["    1. Jane Doe          101   17:02   3  W40-44  1"];
        let layout = parser.detect_columns(&lines);
        assert!(layout.header_line.is_none());
        let time = layout.columns.iter().find(|(f, _)| f == "time").unwrap().1;
        let division = layout.columns.iter().find(|(f, _)| f == "division").unwrap().1;
        assert_eq!(time, lines[0].find("17:02").unwrap());
        assert_eq!(division, lines[0].find("W40-44").unwrap());
    }
}
