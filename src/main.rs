use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use raceparse::{Gender, ParseContext, ParserConfig, ParserRegistry, RegistryError, RulesEngine};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Preview tool for race-result pages: format detection, parsing and
/// division lookups
#[derive(Parser, Debug)]
#[command(name = "raceparse")]
#[command(about = "Detect and parse legacy race-result HTML")]
struct Cli {
    /// Parser thresholds as JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show format signals and which parser would run
    Analyze { file: PathBuf },

    /// Parse one page into results
    Parse {
        file: PathBuf,
        /// Suspected season year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        event_type: Option<String>,
        /// Where the page came from
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        event_id: Option<String>,
    },

    /// Parse every .htm/.html page under a directory and summarize
    Batch { dir: PathBuf },

    /// Division for an age
    Division {
        #[arg(long)]
        age: u32,
        /// M, F/W or X
        #[arg(long)]
        gender: String,
        #[arg(long, default_value_t = 2024)]
        year: i32,
    },

    /// Competition age (age on December 31 of the year)
    Age {
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: String,
        #[arg(long)]
        year: i32,
    },

    /// Check a mark against championship standards
    Standard {
        #[arg(long)]
        event: String,
        #[arg(long)]
        gender: String,
        /// Seconds, a clock time like 4:05.3, or meters
        #[arg(long)]
        mark: String,
        #[arg(long, default_value_t = 2024)]
        year: i32,
    },
}

#[derive(Serialize)]
struct BatchEntry {
    file: String,
    parser: Option<&'static str>,
    event_name: String,
    result_count: usize,
    errors: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            ParserConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => ParserConfig::default(),
    };
    let registry = ParserRegistry::with_config(config);

    match cli.command {
        Command::Analyze { file } => {
            let html = read_page(&file)?;
            emit(&registry.analyze(&html), cli.compact)?;
        }
        Command::Parse {
            file,
            year,
            event_type,
            url,
            event_id,
        } => {
            let html = read_page(&file)?;
            let context = ParseContext {
                source_url: url.or_else(|| Some(file.display().to_string())),
                event_id,
                event_type,
                year,
            };
            let result = registry
                .parse(&html, &context)
                .with_context(|| format!("Cannot parse {}", file.display()))?;
            emit(&result.to_value(), cli.compact)?;
        }
        Command::Batch { dir } => {
            let entries = batch(&registry, &dir)?;
            let parsed = entries.iter().filter(|e| e.result_count > 0).count();
            eprintln!("{parsed}/{} pages yielded results", entries.len());
            emit(&entries, cli.compact)?;
        }
        Command::Division { age, gender, year } => {
            let engine = RulesEngine::for_year(year);
            let gender = Gender::from_code(&gender)?;
            emit(&engine.eligible_divisions(age, gender), cli.compact)?;
        }
        Command::Age { birth_date, year } => {
            let birth = NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid birth date: {birth_date}"))?;
            let Some(age) = RulesEngine::for_year(year).competition_age(birth) else {
                bail!("Born after {year}");
            };
            println!("{age}");
        }
        Command::Standard {
            event,
            gender,
            mark,
            year,
        } => {
            let engine = RulesEngine::for_year(year);
            let gender = Gender::from_code(&gender)?;
            let check = engine.check_standard(&event, gender, mark.as_str())?;
            emit(&check, cli.compact)?;
        }
    }

    Ok(())
}

fn read_page(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    // Pages that are not UTF-8 are read as Latin-1, where each byte is its code point
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    })
}

fn batch(registry: &ParserRegistry, dir: &Path) -> Result<Vec<BatchEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let is_page = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("htm") || e.eq_ignore_ascii_case("html"));
        if !is_page {
            continue;
        }

        let html = read_page(entry.path())?;
        let context = ParseContext::new().source_url(entry.path().display().to_string());
        let file = entry.path().display().to_string();

        let entry = match registry.detect(&html) {
            Some(parser) => {
                let result = parser.parse(&html, &context);
                if result.has_errors() {
                    tracing::warn!(file = %file, parser_id = parser.id(), errors = ?result.errors, "page parsed with errors");
                }
                BatchEntry {
                    file,
                    parser: Some(parser.id()),
                    event_name: result.event_name.clone(),
                    result_count: result.result_count(),
                    errors: result.errors,
                }
            }
            None => BatchEntry {
                file,
                parser: None,
                event_name: String::new(),
                result_count: 0,
                errors: vec![RegistryError::NoApplicableParser.to_string()],
            },
        };
        entries.push(entry);
    }

    Ok(entries)
}

fn emit<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}
