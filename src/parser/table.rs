//! Results laid out in HTML tables.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use std::sync::LazyLock;

use super::fields::{
    digits_only, division_cue, normalize_division, parse_money, parse_place, parse_points, split_name_age,
};
use super::{metadata, ParseContext, ParsedResultSet, ResultParser, ResultRecord, Sex};
use crate::classifier;
use crate::config::ParserConfig;
use crate::html;
use crate::rules::gender_in_text;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").expect("valid cell selector"));

static TIME_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?$").expect("valid time cell regex")
});

static DIVISION_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[mfw]\s?\d{1,2}").expect("valid division code regex")
});

/// Words that mark a header cell
const HEADER_KEYWORDS: &[&str] = &["place", "name", "time", "points", "age", "div", "bib", "pace", "club"];

/// Header variants per field, tried in order; first substring hit wins.
/// `name_age` is handled before this table.
const COLUMN_VARIANTS: &[(&str, &[&str])] = &[
    ("division_place", &["div pl", "div. pl", "div place", "division place", "ag pl", "age group place", "group place", "cat pl"]),
    ("sex_place", &["sex pl", "sex place", "gender pl", "gender place", "m/f pl"]),
    ("time", &["time", "net", "gun", "chip", "finish"]),
    ("place", &["place", "o'all", "overall", "rank", "pos", "plc"]),
    ("pace", &["pace", "min/mi", "per mile", "/mile"]),
    ("points", &["points", "pts", "score"]),
    ("payout", &["prize", "payout", "purse", "money", "$"]),
    ("division", &["division", "div", "age group", "category", "class", "group"]),
    ("age", &["age"]),
    ("sex", &["sex", "gender", "m/f"]),
    ("bib", &["bib", "no.", "number", "#"]),
    ("club", &["club", "team", "affil"]),
    ("city", &["city", "hometown", "residence", "location", "from", "state"]),
    ("name", &["name", "athlete", "runner", "competitor"]),
];

/// Division and sex context carried from captions into the tables after them
#[derive(Debug, Clone, Default, PartialEq)]
struct Cue {
    division: Option<String>,
    sex: Option<Sex>,
}

impl Cue {
    fn from_text(text: &str) -> Self {
        Self {
            division: division_cue(text).map(str::to_string),
            sex: gender_in_text(text).and_then(Sex::from_gender),
        }
    }

    fn is_empty(&self) -> bool {
        self.division.is_none() && self.sex.is_none()
    }

    /// Overwrite whatever the newer cue names
    fn merge(&mut self, newer: Cue) {
        if newer.division.is_some() {
            self.division = newer.division;
        }
        if newer.sex.is_some() {
            self.sex = newer.sex;
        }
    }
}

/// What a preceding sibling contributes to the cue search
enum Sibling {
    /// Another results table; the search stops here
    Table,
    Text(String),
}

/// Parser for clean HTML table layouts
#[derive(Debug, Clone, Default)]
pub struct TableParser {
    config: ParserConfig,
}

impl TableParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Header-row test: enough cells name a known column
    fn is_header_row(&self, cells: &[String]) -> bool {
        let hits = cells
            .iter()
            .filter(|cell| {
                let lc = cell.to_lowercase();
                HEADER_KEYWORDS.iter().any(|k| lc.contains(k))
            })
            .count();
        hits >= self.config.header_min_keyword_hits
    }
}

impl ResultParser for TableParser {
    fn id(&self) -> &'static str {
        "table"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn can_parse(&self, html: &str) -> bool {
        classifier::has_table_structure(html) && !classifier::is_word_html(html)
    }

    fn parse(&self, html: &str, context: &ParseContext) -> ParsedResultSet {
        let mut result = ParsedResultSet::new();
        result.set_metadata("parser", self.id());
        context.annotate(&mut result);
        extract_event_details(html, &mut result);

        let document = Html::parse_document(html);
        let mut cue = Cue::default();
        let mut layouts = Vec::new();
        let mut tables_parsed = 0usize;

        for table in document.select(&TABLE) {
            if table.select(&TABLE).any(|inner| inner.id() != table.id()) {
                continue;
            }

            let found = table_cue(table);
            if !found.is_empty() {
                tracing::debug!(division = ?found.division, sex = ?found.sex, "table cue");
                cue.merge(found);
            }

            let rows: Vec<Vec<String>> = table
                .select(&ROW)
                .map(|row| row.select(&CELL).map(cell_text).collect::<Vec<_>>())
                .filter(|cells| cells.iter().any(|c| !c.is_empty()))
                .collect();
            let Some(first) = rows.first() else {
                continue;
            };

            let (columns, header, data) = if self.is_header_row(first) {
                (map_columns(first), Some(first), &rows[1..])
            } else {
                (infer_columns(first), None, &rows[..])
            };
            tables_parsed += 1;
            layouts.push(json!(columns));

            let mut kept = 0usize;
            for cells in data {
                if header == Some(cells) || cells.len() < 2 {
                    continue;
                }
                let mut record = map_row(&columns, cells);
                if record.division.is_none() {
                    record.division = cue.division.clone();
                }
                if record.sex.is_none() {
                    record.sex = cue.sex;
                }
                if result.add_result(record) {
                    kept += 1;
                }
            }
            tracing::debug!(rows = data.len(), kept, has_header = header.is_some(), "table parsed");
        }

        result.set_metadata("tables_parsed", tables_parsed);
        result.set_metadata("columns", layouts);
        if tables_parsed == 0 {
            result.add_error("no result tables found");
        } else if result.results.is_empty() {
            result.add_warning("tables contained no result rows");
        }
        result
    }
}

/// Title, date and location from the markup around the tables
fn extract_event_details(html: &str, result: &mut ParsedResultSet) {
    if let Some(title) = metadata::heading_title(html).filter(|t| !metadata::is_placeholder_title(t)) {
        result.event_name = title;
    }

    let lead_end = html::to_lower(html).find("<table").unwrap_or(html.len());
    let lead = html::visible_text(&html[..lead_end]);
    result.event_date = metadata::extract_date(&lead)
        .or_else(|| metadata::extract_date(&result.event_name))
        .or_else(|| metadata::extract_date(&html::visible_text(html)));
    result.event_location = metadata::extract_location(&lead).or_else(|| metadata::city_state_location(&lead));

    if result.event_name.is_empty() {
        result.add_warning("no event name found");
    }
}

fn cell_text(cell: ElementRef) -> String {
    html::normalize_ws(&cell.text().collect::<String>())
}

/// Nearest caption before the table naming a division or sex.
///
/// Walks the table's preceding siblings, then its parent's, and never
/// looks past an earlier table.
fn table_cue(table: ElementRef) -> Cue {
    let sibling = |node| {
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == "table" || element.select(&TABLE).next().is_some() {
                return Sibling::Table;
            }
            return Sibling::Text(element.text().collect::<Vec<_>>().join(" "));
        }
        Sibling::Text(node.value().as_text().map(|t| t.to_string()).unwrap_or_default())
    };

    let (cue, stopped) = first_cue(table.prev_siblings().map(sibling));
    if !cue.is_empty() || stopped {
        return cue;
    }
    table
        .parent()
        .map(|parent| first_cue(parent.prev_siblings().map(sibling)).0)
        .unwrap_or_default()
}

/// First non-empty cue, and whether the walk hit a table
fn first_cue(siblings: impl Iterator<Item = Sibling>) -> (Cue, bool) {
    for sibling in siblings {
        match sibling {
            Sibling::Table => return (Cue::default(), true),
            Sibling::Text(text) => {
                let text = html::normalize_ws(&text);
                if text.is_empty() || text.chars().count() > 200 {
                    continue;
                }
                let cue = Cue::from_text(&text);
                if !cue.is_empty() {
                    return (cue, false);
                }
            }
        }
    }
    (Cue::default(), false)
}

/// Canonical field for one header cell
fn column_field(header: &str, index: usize) -> String {
    let lc = header.to_lowercase();
    if lc.contains("name") && lc.contains("age") {
        return "name_age".to_string();
    }
    if lc.trim() == "pl" || lc.trim() == "pl." {
        return "place".to_string();
    }
    if lc.trim() == "dp" {
        return "division_place".to_string();
    }
    COLUMN_VARIANTS
        .iter()
        .find(|(_, variants)| variants.iter().any(|v| lc.contains(v)))
        .map(|(field, _)| field.to_string())
        .unwrap_or_else(|| format!("column_{index}"))
}

fn map_columns(header: &[String]) -> Vec<String> {
    header.iter().enumerate().map(|(i, h)| column_field(h, i)).collect()
}

/// Guess fields for a header-less table from its first row: a leading
/// number is the place, the first wordy cell the name, a clock value the time.
fn infer_columns(first_row: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    first_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let guess = if TIME_CELL_RE.is_match(cell) {
                "time"
            } else if cell.chars().all(|c| c.is_ascii_digit() || c == '.') && !cell.is_empty() {
                "place"
            } else if cell.chars().any(char::is_alphabetic) && !DIVISION_CODE_RE.is_match(cell) {
                "name"
            } else {
                ""
            };
            if !guess.is_empty() && seen.insert(guess) {
                guess.to_string()
            } else {
                format!("column_{i}")
            }
        })
        .collect()
}

/// Coerce one data row through the column map
fn map_row(columns: &[String], cells: &[String]) -> ResultRecord {
    let mut record = ResultRecord::default();

    for (field, text) in columns.iter().zip(cells) {
        if text.is_empty() {
            continue;
        }
        match field.as_str() {
            "place" => record.place = parse_place(text),
            "division_place" => record.division_place = parse_place(text),
            "sex_place" => record.sex_place = parse_place(text),
            "name_age" => {
                let (name, age) = split_name_age(text);
                record.athlete_name = name;
                record.athlete_age = record.athlete_age.or(age);
            }
            "name" => record.athlete_name = text.clone(),
            "age" => record.athlete_age = digits_only(text),
            "time" => record.time_display = Some(text.clone()),
            "pace" => record.pace = Some(text.clone()),
            "points" => {
                let (points, payout) = parse_points(text);
                record.points = points;
                record.payout = record.payout.or(payout);
            }
            "payout" => record.payout = parse_money(text),
            "division" => {
                if DIVISION_CODE_RE.is_match(text) {
                    record.sex = record.sex.or_else(|| Sex::from_text(text));
                }
                record.division = Some(normalize_division(text));
            }
            "sex" => record.sex = Sex::from_text(text),
            "bib" => record.bib = Some(text.clone()),
            "club" => record.club = Some(text.clone()),
            "city" => record.city = Some(text.clone()),
            _ => {}
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_column_mapping() {
        let header = strings(&["O'all", "Name-Age", "Div Pl", "Sex Place", "Net Time", "Pts", "Team", "Hometown", "Foo"]);
        assert_eq!(
            map_columns(&header),
            strings(&["place", "name_age", "division_place", "sex_place", "time", "points", "club", "city", "column_8"])
        );
        assert_eq!(map_columns(&strings(&["Pl", "Age Group", "Age", "Bib #"])), strings(&["place", "division", "age", "bib"]));
    }

    #[test]
    fn test_header_detection() {
        let parser = TableParser::new();
        assert!(parser.is_header_row(&strings(&["Place", "Name", "Time"])));
        assert!(!parser.is_header_row(&strings(&["1", "Jane Doe", "17:02"])));
        assert!(!parser.is_header_row(&strings(&["Place", "1", "2"])));
    }

    #[test]
    fn test_headerless_inference() {
        assert_eq!(
            infer_columns(&strings(&["1", "Jane Doe", "W40", "17:02"])),
            strings(&["place", "name", "column_2", "time"])
        );
    }

    #[test]
    fn test_row_coercion() {
        let columns = strings(&["place", "name_age", "division", "time", "points"]);
        let record = map_row(&columns, &strings(&["3rd", "Ann Lee, 52", "W50-54", "19:07", "150 ($300)"]));
        assert_eq!(record.place, Some(3));
        assert_eq!(record.athlete_name, "Ann Lee");
        assert_eq!(record.athlete_age, Some(52));
        assert_eq!(record.sex, Some(Sex::F));
        assert_eq!(record.division.as_deref(), Some("W50-54"));
        assert_eq!(record.points, Some(150.0));
        assert_eq!(record.payout, Some(300.0));
    }

    #[test]
    fn test_cue_merge() {
        let mut cue = Cue::from_text("Women");
        cue.merge(Cue::from_text("Masters"));
        assert_eq!(cue.sex, Some(Sex::F));
        assert_eq!(cue.division.as_deref(), Some("Masters 40+"));
    }
}
