use super::*;
use chrono::NaiveDate;

const TABLE_5K: &str = r#"<html><head><title>Results</title></head><body>
<h1>Spring Valley 5K</h1>
<p>Held May 4, 2002 in Golden Gate Park</p>
<table border=1>
<tr><td>Place</td><td>Name-Age</td><td>Points</td></tr>
<tr><td>1</td><td>John Smith, 35</td><td>100</td></tr>
<tr><td>2</td><td>Mike Brown, 41</td><td>90 ($50)</td></tr>
<tr><td>&nbsp;</td><td>&nbsp;</td><td>&nbsp;</td></tr>
<tr><td>3</td><td>Sam Green, 29</td><td>80</td></tr>
</table></body></html>"#;

const DIVISION_TABLES: &str = r#"<html><body>
<h2>Men's Masters</h2>
<table>
<tr><td>Place</td><td>Name</td><td>Time</td></tr>
<tr><td>1</td><td>Hal Ortiz</td><td>17:45</td></tr>
</table>
<h3>Women</h3>
<table>
<tr><td>Place</td><td>Name</td><td>Time</td></tr>
<tr><td>1</td><td>Ida Park</td><td>19:02</td></tr>
<tr><td>2</td><td></td><td>19:40</td></tr>
</table>
</body></html>"#;

fn pre_page() -> String {
    let body = "          Harbor Run 10K
          June 7, 1998  Oakland, CA

PLACE NAME                        BIB   TIME
----- -------------------------- ----- -------
    1. Christophe Impens, Albuqu     6    14:13
    2. Dave Jones, Reno              12    14:40
    3. Luis Ortega                   40    15:02

WOMEN
    4. Ann Lee                       77    16:30
    5.                               81    16:45
";
    format!("<html><head><title>Untitled</title></head><body><pre>{body}</pre></body></html>")
}

fn word_doc(body: &str) -> String {
    format!(
        r#"<html xmlns:o="urn:schemas-microsoft-com:office:office"><head><meta name=ProgId content=Word.Document></head><body lang=EN-US>{body}</body></html>"#
    )
}

fn detected(html: &str) -> Option<&'static str> {
    ParserRegistry::with_default_parsers().detect(html).map(|p| p.id())
}

// ========================================================================
// Detection priority
// ========================================================================

#[test]
fn test_detect_table() {
    assert_eq!(detected(TABLE_5K), Some("table"));
    assert_eq!(detected("<table><tr><td>1</td><td>Ann</td></tr></table>"), Some("table"));
}

#[test]
fn test_detect_word_over_table() {
    let doc = word_doc("<table><tr><td>1</td><td>Ann</td></tr></table>");
    assert!(TableParser::new().can_parse("<table><tr><td>1</td><td>Ann</td></tr></table>"));
    assert!(!TableParser::new().can_parse(&doc));
    assert_eq!(detected(&doc), Some("word"));
}

#[test]
fn test_detect_pre() {
    assert_eq!(detected(&pre_page()), Some("pre"));
}

#[test]
fn test_detect_short_pre_rejected() {
    let short = format!("<pre>{}</pre>", "x".repeat(150));
    assert!(crate::classifier::analyze(&short).has_pre);
    assert_eq!(detected(&short), None);
}

#[test]
fn test_detect_none() {
    assert_eq!(detected("<html><body><p>Results coming soon</p></body></html>"), None);
    assert_eq!(detected(""), None);
}

#[test]
fn test_registry_parse_without_parser() {
    let registry = ParserRegistry::with_default_parsers();
    assert_eq!(
        registry.parse("<p>nothing</p>", &ParseContext::new()),
        Err(RegistryError::NoApplicableParser)
    );
}

#[test]
fn test_registry_analysis() {
    let analysis = ParserRegistry::with_default_parsers().analyze(TABLE_5K);
    assert!(analysis.signals.has_tables);
    assert_eq!(analysis.signals.estimated_year, Some(2002));
    assert_eq!(analysis.selected, Some("table"));
    let ids: Vec<&str> = analysis.candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["word", "table", "pre"]);
}

// ========================================================================
// TableParser
// ========================================================================

#[test]
fn test_table_end_to_end() {
    let result = TableParser::new().parse(TABLE_5K, &ParseContext::new());

    assert_eq!(result.result_count(), 3);
    assert!(result.event_name.contains("5K"));
    assert_eq!(result.event_date, NaiveDate::from_ymd_opt(2002, 5, 4));
    assert_eq!(result.event_location.as_deref(), Some("Golden Gate Park"));
    assert!(result.errors.is_empty());

    let first = &result.results[0];
    assert_eq!(first.place, Some(1));
    assert_eq!(first.athlete_name, "John Smith");
    assert_eq!(first.athlete_age, Some(35));
    assert_eq!(first.points, Some(100.0));

    assert_eq!(result.results[1].payout, Some(50.0));
    assert_eq!(result.results[2].athlete_name, "Sam Green");
}

#[test]
fn test_table_cues_carry_forward() {
    let result = TableParser::new().parse(DIVISION_TABLES, &ParseContext::new());

    assert_eq!(result.result_count(), 2);
    let hal = &result.results[0];
    assert_eq!(hal.sex, Some(Sex::M));
    assert_eq!(hal.division.as_deref(), Some("Masters 40+"));
    assert_eq!(hal.time_seconds, Some(1065));

    let ida = &result.results[1];
    assert_eq!(ida.sex, Some(Sex::F));
    assert_eq!(ida.division.as_deref(), Some("Masters 40+"));
    assert_eq!(result.divisions, vec!["Masters 40+".to_string()]);
}

#[test]
fn test_table_skips_repeated_header() {
    let doc = "<table><tr><td>Place</td><td>Name</td></tr><tr><td>1</td><td>Ann</td></tr>\
               <tr><td>Place</td><td>Name</td></tr><tr><td>2</td><td>Bea</td></tr></table>";
    let result = TableParser::new().parse(doc, &ParseContext::new());
    let names: Vec<&str> = result.results.iter().map(|r| r.athlete_name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bea"]);
}

#[test]
fn test_table_context_hints() {
    let context = ParseContext::new()
        .event_type("road")
        .source_url("http://example.org/r.htm")
        .year(2002);
    let result = TableParser::new().parse(TABLE_5K, &context);
    assert_eq!(result.event_type, "road");
    assert_eq!(result.metadata["source_url"], "http://example.org/r.htm");
    assert_eq!(result.metadata["year_hint"], 2002);
}

// ========================================================================
// PreTextParser
// ========================================================================

#[test]
fn test_pre_end_to_end() {
    let result = PreTextParser::new().parse(&pre_page(), &ParseContext::new());

    assert!(result.errors.is_empty());
    assert_eq!(result.result_count(), 4);
    assert_eq!(result.event_name, "Harbor Run 10K");
    assert_eq!(result.event_date, NaiveDate::from_ymd_opt(1998, 6, 7));
    assert_eq!(result.event_location.as_deref(), Some("Oakland, CA"));
    assert_eq!(result.metadata["column_source"], "header");

    let first = &result.results[0];
    assert_eq!(first.place, Some(1));
    assert!(first.athlete_name.contains("Christophe"));
    assert_eq!(first.time_seconds, Some(853));
    assert_eq!(first.sex, None);

    assert_eq!(result.results[1].athlete_name, "Dave Jones");
    assert_eq!(result.results[3].athlete_name, "Ann Lee");
    assert_eq!(result.results[3].sex, Some(Sex::F));
}

fn age_group_first_page() -> String {
    let body = "          Lakeside 5K Run
          May 2, 2004  Madison, WI

PLACE NAME                  DIV       BIB   TIME
----- -------------------- -------- ----- -------
    1. J&oslash;rgen M&uuml;ller        M45-49     123   17:02
    2. Fran&ccedil;ois &Aacute;lvarez   M30-34     88    17:40
    3. Ren&eacute;e O&#146;Neil          W50-54     7     19:15
";
    format!("<html><body><pre>{body}</pre></body></html>")
}

#[test]
fn test_pre_age_group_before_time() {
    let result = PreTextParser::new().parse(&age_group_first_page(), &ParseContext::new());

    assert!(result.errors.is_empty());
    assert_eq!(result.result_count(), 3);

    let first = &result.results[0];
    assert_eq!(first.athlete_name, "Jørgen Müller");
    assert_eq!(first.sex, Some(Sex::M));
    assert_eq!(first.division.as_deref(), Some("Masters 40+"));
    assert_eq!(first.bib.as_deref(), Some("123"));
    assert_eq!(first.time_seconds, Some(1022));

    assert_eq!(result.results[1].athlete_name, "François Álvarez");
    assert_eq!(result.results[1].division.as_deref(), Some("Open"));

    let third = &result.results[2];
    assert_eq!(third.athlete_name, "Renée O'Neil");
    assert_eq!(third.sex, Some(Sex::F));
    assert_eq!(third.division.as_deref(), Some("Seniors 50+"));
}

#[test]
fn test_table_title_entities() {
    let doc = "<html><head><title>Results</title></head><body><h1>Fj&auml;llr&auml;ven &Oslash;stfold 5K</h1>\
               <table><tr><td>Place</td><td>Name</td></tr><tr><td>1</td><td>&Aring;sa Berg</td></tr></table>\
               </body></html>";
    let result = TableParser::new().parse(doc, &ParseContext::new());
    assert_eq!(result.event_name, "Fjällräven Østfold 5K");
    assert_eq!(result.results[0].athlete_name, "Åsa Berg");
}

#[test]
fn test_pre_without_block() {
    let result = PreTextParser::new().parse("<p>no fixed width here</p>", &ParseContext::new());
    assert!(result.results.is_empty());
    assert!(result.has_errors());
    assert_eq!(result.errors, vec!["no <pre> content found".to_string()]);
}

#[test]
fn test_pre_parser_reusable() {
    let parser = PreTextParser::new();
    let first = parser.parse(&pre_page(), &ParseContext::new());
    let second = parser.parse(&pre_page(), &ParseContext::new());
    assert_eq!(first, second);
}

// ========================================================================
// WordHtmlParser
// ========================================================================

#[test]
fn test_word_delegates_to_pre() {
    let page = pre_page();
    let start = page.find("<pre>").unwrap();
    let end = page.find("</body>").unwrap();
    let doc = word_doc(&page[start..end]);

    let result = WordHtmlParser::new().parse(&doc, &ParseContext::new());
    assert_eq!(result.metadata["parser"], "pre");
    assert_eq!(result.metadata["delegated_from"], "word");
    assert_eq!(result.result_count(), 4);
}

#[test]
fn test_word_without_delegate() {
    let doc = word_doc("<p class=MsoNormal>Results to follow</p>");
    let result = WordHtmlParser::new().parse(&doc, &ParseContext::new());
    assert!(result.results.is_empty());
    assert_eq!(result.errors, vec!["no suitable parser found".to_string()]);
}

// ========================================================================
// Result aggregate
// ========================================================================

#[test]
fn test_blank_names_never_added() {
    let registry = ParserRegistry::with_default_parsers();
    for doc in [TABLE_5K.to_string(), DIVISION_TABLES.to_string(), pre_page()] {
        let result = registry.parse(&doc, &ParseContext::new()).unwrap();
        assert!(result.results.iter().all(|r| !r.athlete_name.trim().is_empty()));
    }

    let mut set = ParsedResultSet::new();
    assert!(!set.add_result(ResultRecord::new("   ")));
    assert!(set.add_result(ResultRecord::new(" Ann  Lee ")));
    assert_eq!(set.results[0].athlete_name, "Ann Lee");
}

#[test]
fn test_record_defaults() {
    let mut set = ParsedResultSet::new();
    let mut record = ResultRecord::new("Ann Lee");
    record.place = Some(0);
    record.club = Some("  ".to_string());
    record.time_display = Some("15:30".to_string());
    record.division = Some("Open".to_string());
    set.add_result(record);
    set.add_division("Open".to_string());

    let kept = &set.results[0];
    assert_eq!(kept.place, None);
    assert_eq!(kept.club, None);
    assert_eq!(kept.time_seconds, Some(930));
    assert_eq!(set.divisions, vec!["Open".to_string()]);
}

#[test]
fn test_to_value_shape() {
    let result = TableParser::new().parse(TABLE_5K, &ParseContext::new());
    let value = result.to_value();
    for key in [
        "event_name",
        "event_date",
        "event_location",
        "event_type",
        "divisions",
        "results",
        "metadata",
        "warnings",
        "errors",
        "result_count",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["result_count"], 3);
    assert_eq!(value["event_date"], "2002-05-04");
}
