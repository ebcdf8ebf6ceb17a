//! CLI command implementations for mailsort.
//!
//! Provides subcommand handlers for:
//! - `mailsort analyze`: classify one email (file, text, or stdin)
//! - `mailsort history`: list the saved results as cards
//! - `mailsort reset`: clear the history (with confirmation)
//! - `mailsort stats`: summary, weekday histogram, insight
//! - `mailsort health`: check the service, config, storage, event log
//! - `mailsort config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::analysis::AnalysisResult;
use crate::analysis::card::{CardOptions, CardView, Tone};
use crate::client::{Attachment, HttpClient, Transport};
use crate::config::{self, MailsortConfig};
use crate::events::{Event, EventLog, Outcome};
use crate::history::HistoryStore;
use crate::stats::{self, Report};
use crate::storage::FileStorage;
use crate::submit::{Submission, SubmissionForm, SubmitError};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Where the email text for `analyze` comes from.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeInput {
    pub file: Option<std::path::PathBuf>,
    pub text: Option<String>,
    pub stdin: bool,
    pub context: Option<String>,
}

/// Open the persisted history named by `[storage] dir`.
fn open_history(cfg: &MailsortConfig) -> Result<HistoryStore<FileStorage>> {
    let dir = config::expand_home(&cfg.storage.dir)
        .context("could not resolve storage directory")?;
    Ok(HistoryStore::hydrate(FileStorage::new(dir)))
}

// ---------------------------------------------------------------------------
// mailsort analyze
// ---------------------------------------------------------------------------

/// Submit one email to the classification service and print the result.
pub fn run_analyze(input: AnalyzeInput, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut history = open_history(&cfg)?;
    let client = HttpClient::from_config(&cfg.endpoint)?;
    let log = EventLog::from_config(&cfg.logging);

    let text = match (input.text, input.stdin) {
        (Some(text), _) => text,
        (None, true) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read email text from stdin")?;
            buf
        }
        (None, false) => String::new(),
    };
    let file = input
        .file
        .as_deref()
        .map(Attachment::from_path)
        .transpose()?;

    let mut submission = Submission::new(SubmissionForm {
        file,
        text,
        context: input.context.unwrap_or_default(),
    });

    let options = cfg.display.card_options();
    match submission.submit(&client, &mut history, &log) {
        Ok(result) => print_result(&result, &options, format),
        Err(SubmitError::Persist { result }) => {
            print_result(&result, &options, format)?;
            bail!("{}", SubmitError::Persist { result });
        }
        Err(e) => bail!("{e}"),
    }
}

fn print_result(result: &AnalysisResult, options: &CardOptions, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table | OutputFormat::Csv => {
            print_card(&CardView::build(result, options, true));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// mailsort history
// ---------------------------------------------------------------------------

/// List the saved results, newest first.
pub fn run_history(format: OutputFormat, expand: bool) -> Result<()> {
    let cfg = config::load();
    let history = open_history(&cfg)?;
    let entries = history.current();

    if entries.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No emails analyzed yet. Run `mailsort analyze` to get started.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => print_history_csv(entries, &cfg.display.card_options()),
        OutputFormat::Table => {
            println!("{}", "Analysis History".bold().cyan());
            println!("{}", "=".repeat(60));
            let options = cfg.display.card_options();
            for entry in entries {
                println!();
                print_card(&CardView::build(entry, &options, expand));
            }
        }
    }

    Ok(())
}

fn print_card(card: &CardView) {
    println!(
        "{}  {}",
        colorize_tone(&card.category, card.tone).bold(),
        card.timestamp.dimmed()
    );
    println!("  {} {}", "Reason:".bold(), card.reason);

    if let Some(preview) = &card.original_text {
        println!("  {}", "Email:".bold());
        for line in preview.shown.lines() {
            println!("    {}", line.dimmed());
        }
        if preview.expandable && !preview.expanded {
            println!("    {}", "(use --expand to show the full text)".dimmed());
        }
    }

    if let Some(suggestion) = &card.suggestion {
        println!("  {} {}", "Suggested reply:".bold(), suggestion.green());
    }

    if let Some(sender) = &card.sender {
        match &card.company {
            Some(company) => println!("  {} {} ({})", "From:".bold(), sender, company),
            None => println!("  {} {}", "From:".bold(), sender),
        }
    }
}

fn print_history_csv(entries: &[AnalysisResult], options: &CardOptions) {
    println!("category,timestamp,sender,company,reason,suggestion");
    for entry in entries {
        let card = CardView::build(entry, options, true);
        println!(
            "{},{},{},{},{},{}",
            csv_field(entry.category.wire_label()),
            csv_field(&card.timestamp),
            csv_field(card.sender.as_deref().unwrap_or("")),
            csv_field(card.company.as_deref().unwrap_or("")),
            csv_field(&card.reason),
            csv_field(card.suggestion.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// mailsort reset
// ---------------------------------------------------------------------------

/// Clear the history. Asks for confirmation unless `yes` is set.
pub fn run_reset(yes: bool) -> Result<()> {
    let cfg = config::load();
    let mut history = open_history(&cfg)?;

    if history.is_empty() {
        println!("{}", "History is already empty.".yellow());
        return Ok(());
    }

    if !yes {
        print!("Clear all {} history entries? [y/N] ", history.len());
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !is_confirmation(&answer) {
            println!("{}", "Cancelled.".dimmed());
            return Ok(());
        }
    }

    history.clear()?;
    EventLog::from_config(&cfg.logging).record(&Event::new(Outcome::HistoryCleared));
    println!("{} History cleared", "✓".green().bold());
    Ok(())
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// ---------------------------------------------------------------------------
// mailsort stats
// ---------------------------------------------------------------------------

/// Show summary, weekday histogram, and insight for the current history.
pub fn run_stats(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let history = open_history(&cfg)?;
    let report = stats::build_report(history.current());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print_stats_csv(&report),
        OutputFormat::Table => {
            if report.summary.total == 0 {
                println!(
                    "{}",
                    "No data yet. Analyze some emails to see stats.".yellow()
                );
                return Ok(());
            }
            print_stats_table(&report);
        }
    }

    Ok(())
}

fn print_stats_table(report: &Report) {
    let s = &report.summary;
    println!("{}", "Email Statistics".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("  {} {}", "Total:       ".bold(), s.total);
    println!(
        "  {} {} ({}%)",
        "Productive:  ".bold(),
        s.productive.to_string().green(),
        s.productive_pct
    );
    println!(
        "  {} {} ({}%)",
        "Unproductive:".bold(),
        s.unproductive.to_string().yellow(),
        s.unproductive_pct
    );
    println!();

    println!("{}", "By Weekday".bold().cyan());
    let max = report
        .weekdays
        .iter()
        .map(|d| d.productive.max(d.unproductive))
        .max()
        .unwrap_or(0);
    for day in &report.weekdays {
        println!(
            "  {:<4} {:<12} {:<12} {}/{}",
            day.day,
            bar(day.productive, max, 10).green(),
            bar(day.unproductive, max, 10).yellow(),
            day.productive,
            day.unproductive,
        );
    }
    println!();

    println!("  {} {}", "Insight:".bold(), report.insight_message);
}

fn print_stats_csv(report: &Report) {
    println!("day,productive,unproductive");
    for day in &report.weekdays {
        println!("{},{},{}", day.day, day.productive, day.unproductive);
    }
}

// ---------------------------------------------------------------------------
// mailsort health
// ---------------------------------------------------------------------------

/// Check the classification service, config files, storage, and event log.
pub fn run_health() -> Result<()> {
    println!("{}", "mailsort Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.mailsort/config.toml found"
        } else {
            "not found (run `mailsort config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".mailsort.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = HttpClient::from_config(&cfg.endpoint)?;
    let service_ok = client.is_healthy();
    print_health_item(
        "Service",
        service_ok,
        &if service_ok {
            format!("reachable at {}", client.url())
        } else {
            format!("not reachable at {}", client.url())
        },
    );
    print_health_item(
        "Timeout / retries",
        true,
        &format!(
            "{}ms / {}",
            client.timeout().as_millis(),
            client.retry_policy().retries
        ),
    );

    let history = open_history(&cfg)?;
    print_health_item(
        "History",
        true,
        &format!(
            "{} entries in {}",
            history.len(),
            history.storage().dir().display()
        ),
    );

    let log = EventLog::from_config(&cfg.logging);
    match log.path() {
        Some(path) if path.exists() => print_health_item(
            "Event log",
            true,
            &format!("{} events", log.read_all().len()),
        ),
        Some(_) => print_health_item("Event log", true, "no log file yet"),
        None => print_health_item("Event log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// mailsort config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective mailsort Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(config::global_config_file().as_deref(), "~/.mailsort/config.toml");
    print_source(config::project_config_file().as_deref(), ".mailsort.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "MAILSORT_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(path: Option<&Path>, label: &str) {
    if path.is_some_and(Path::exists) {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.mailsort/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your service.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// A horizontal bar of `width * count / max` blocks.
fn bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (count * width).div_ceil(max);
    "█".repeat(filled.min(width))
}

/// Colorize a category label by card tone.
fn colorize_tone(label: &str, tone: Tone) -> colored::ColoredString {
    match tone {
        Tone::Success => label.green(),
        Tone::Warning => label.yellow(),
        Tone::Danger => label.red(),
        Tone::Neutral => label.normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
