use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemadrift_core::{
    ChangeSeverity, ChangeType, ColumnChange, Config, IgnoreRules, OutputFormat, SchemaDiff, ToolResult,
};
use schemadrift_engine::column_diff::REORDER_COLUMN_NAME;
use schemadrift_engine::{compare_schemas_from_values, table_schema_from_value};

/// Exit code when the overall severity reaches `fail_on`
const EXIT_DRIFT: i32 = 1;

/// Exit code when a document is invalid or the comparison failed
const EXIT_FAILED: i32 = 2;

/// SchemaDrift - Structural drift detection between schema snapshots
#[derive(Parser)]
#[command(name = "schemadrift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemadrift.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline schema document against an observed one
    Diff {
        /// Baseline schema (JSON)
        old: PathBuf,

        /// Observed schema (JSON)
        new: PathBuf,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Also write the JSON envelope to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a schema document and print its normalized form
    Validate {
        /// Schema document (JSON)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("schemadrift.toml").exists() {
        Config::from_file(Path::new("schemadrift.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    let code = match cli.command {
        Commands::Diff { old, new, format, output } => {
            let format = format.map(OutputFormat::from).unwrap_or(config.format);
            diff_command(&config, &old, &new, format, output.as_deref(), cli.verbose)?
        }
        Commands::Validate { file } => validate_command(&file)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Diff command - compare two schema documents
fn diff_command(
    config: &Config,
    old: &Path,
    new: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    verbose: bool,
) -> Result<i32> {
    if verbose {
        eprintln!("{} {} -> {}", "Comparing".cyan(), old.display(), new.display());
    }

    let mut result = compare_schemas_from_values(&read_document(old)?, &read_document(new)?);
    apply_ignore_rules(config, &mut result);

    if let Some(path) = output {
        std::fs::write(path, result.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    match format {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Text => print_text(&result),
    }

    let code = match result.diff() {
        None => EXIT_FAILED,
        Some(diff) if config.fails(diff.overall_severity) => EXIT_DRIFT,
        Some(_) => 0,
    };
    Ok(code)
}

/// Drop ignored columns and refresh the hint to match the new roll-up
///
/// Ignored names are also removed from the order lists of reorder entries;
/// a reorder entry whose remaining orders agree is dropped.
fn apply_ignore_rules(config: &Config, result: &mut ToolResult) {
    let rules = &config.ignore;
    if rules.columns.is_empty() {
        return;
    }

    if let Some(payload) = result.data.as_mut() {
        let before = payload.diff.changes.len();

        for change in payload
            .diff
            .changes
            .iter_mut()
            .filter(|c| c.change_type == ChangeType::ColumnReordered)
        {
            prune_reorder_entry(change, rules);
        }

        payload.diff.retain_changes(|c| {
            !rules.is_column_ignored(&c.column_name) && !is_empty_reorder(c)
        });
        tracing::debug!(
            ignored = before - payload.diff.changes.len(),
            "applied ignore rules"
        );
        result.next_action_hint = Some(payload.diff.overall_severity.advisory().to_string());
    }
}

/// Remove ignored names from the `order` lists of a reorder entry
fn prune_reorder_entry(change: &mut ColumnChange, rules: &IgnoreRules) {
    let prefix = change
        .column_name
        .strip_suffix(REORDER_COLUMN_NAME)
        .unwrap_or("")
        .to_string();

    for value in [change.old_value.as_mut(), change.new_value.as_mut()].into_iter().flatten() {
        if let Some(order) = value.get_mut("order").and_then(|o| o.as_array_mut()) {
            order.retain(|name| {
                name.as_str()
                    .map_or(true, |n| !rules.is_column_ignored(&format!("{}{}", prefix, n)))
            });
        }
    }
}

fn is_empty_reorder(change: &ColumnChange) -> bool {
    change.change_type == ChangeType::ColumnReordered
        && change.old_value.as_ref().map(|v| &v["order"]) == change.new_value.as_ref().map(|v| &v["order"])
}

fn severity_badge(severity: ChangeSeverity) -> colored::ColoredString {
    match severity {
        ChangeSeverity::Safe => "SAFE".green(),
        ChangeSeverity::Warning => "WARNING".yellow(),
        ChangeSeverity::Breaking => "BREAKING".red().bold(),
    }
}

fn print_text(result: &ToolResult) {
    let Some(diff) = result.diff() else {
        eprintln!(
            "{} {}",
            "Error:".red().bold(),
            result.error.as_deref().unwrap_or("comparison failed")
        );
        return;
    };

    print_diff(diff);

    if let Some(hint) = &result.next_action_hint {
        println!();
        println!("{}", hint.bold());
    }
}

fn print_diff(diff: &SchemaDiff) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Schema drift:".bold().bright_blue(), diff.table_name.bold());
    println!("{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Baseline:".bold(), diff.old_schema_version);
    println!("{} {}", "Observed:".bold(), diff.new_schema_version);
    println!();

    if !diff.has_changes() {
        println!("{}", "✓ No schema changes detected".green());
        return;
    }

    for change in &diff.changes {
        println!(
            "  {:<10} {:<22} {}",
            severity_badge(change.severity),
            change.change_type.as_str(),
            change.column_name.yellow()
        );
        println!("             {}", change.reasoning.dimmed());
    }

    println!();
    println!(
        "{} {} ({})",
        "Overall:".bold(),
        severity_badge(diff.overall_severity),
        diff.summary
    );
}

/// Validate command - run the document adapter only
fn validate_command(file: &Path) -> Result<i32> {
    match table_schema_from_value(&read_document(file)?) {
        Ok(schema) => {
            println!("{}", schema.to_json()?);
            eprintln!(
                "{} {} ({} columns)",
                "✓ Valid schema:".green(),
                schema.table_name,
                schema.columns.len()
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("{} {}: {}", "✗ Invalid schema".red().bold(), file.display(), e);
            Ok(EXIT_FAILED)
        }
    }
}
