//! Shapley Attribution CLI Module
//!
//! Command-line interface for running coalition attribution on a data file
//! with a linear scoring model.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{AttributionConfig, Weighting};
use crate::explainability::{AttributionTable, CoalitionExplainer, FeatureMatrix, LinearScorer};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "shapley-attribution")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exact coalition-based feature attribution for scoring models")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attribute a linear model's mean prediction to the features of a data file
    Explain {
        /// Input data file (CSV, TSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name (excluded from the features)
        #[arg(short, long)]
        target: String,

        /// Model coefficient as name=value; repeat for each feature
        #[arg(short, long = "coef", value_parser = parse_coefficient)]
        coefficients: Vec<(String, f64)>,

        /// Model intercept
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        intercept: f64,

        /// JSON configuration file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads (1 = sequential)
        #[arg(long)]
        threads: Option<usize>,

        /// Refuse inputs with more features than this
        #[arg(long)]
        max_features: Option<usize>,

        /// Weighting of marginal contributions (unweighted, shapley)
        #[arg(long)]
        weighting: Option<Weighting>,

        /// Decimal places in the percentage columns
        #[arg(long)]
        decimals: Option<u32>,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Parse `name=value` into a coefficient pair
pub fn parse_coefficient(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid coefficient '{}': {}", value, e))?;
    Ok((name.to_string(), value))
}

/// Options for `explain` that end up in [`AttributionConfig`]
#[derive(Debug, Default, Clone)]
pub struct ExplainOverrides {
    pub config: Option<PathBuf>,
    pub threads: Option<usize>,
    pub max_features: Option<usize>,
    pub weighting: Option<Weighting>,
    pub decimals: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl ExplainOverrides {
    /// Load the config file (if any) and apply the command-line overrides
    pub fn resolve(&self) -> anyhow::Result<AttributionConfig> {
        let mut config = match &self.config {
            Some(path) => AttributionConfig::load(&path.to_string_lossy())?,
            None => AttributionConfig::default(),
        };
        if let Some(threads) = self.threads {
            config = config.with_n_threads(threads);
        }
        if let Some(max_features) = self.max_features {
            config = config.with_max_features(max_features);
        }
        if let Some(weighting) = self.weighting {
            config = config.with_weighting(weighting);
        }
        if let Some(decimals) = self.decimals {
            config = config.with_decimals(decimals);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_explain(
    data_path: &PathBuf,
    target: &str,
    coefficients: &[(String, f64)],
    intercept: f64,
    overrides: &ExplainOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let config = overrides.resolve()?;

    let start = Instant::now();
    let df = DataLoader::new().load_auto(data_path)?;
    let matrix = FeatureMatrix::from_dataframe(&df, target)?;
    if matrix.n_features() == 0 {
        anyhow::bail!("no feature columns left after removing target '{}'", target);
    }
    let model = LinearScorer::from_named(matrix.features().names(), coefficients, intercept)?;

    if json {
        let table = CoalitionExplainer::new(&model).with_config(config).explain(&matrix)?;
        println!("{}", table.to_json()?);
        return Ok(());
    }

    section("Explain");
    println!(
        "  {} rows × {} features loaded in {:?}",
        matrix.n_rows(),
        matrix.n_features(),
        start.elapsed()
    );

    step_run(&format!("Scoring {} coalitions", 1u64 << matrix.n_features()));
    let table = CoalitionExplainer::new(&model).with_config(config).explain(&matrix)?;
    step_done(&format!("{} ms", table.stats.elapsed_ms));

    print_table(&table);
    Ok(())
}

fn print_table(table: &AttributionTable) {
    section("Attribution");
    println!(
        "  {:<24} {:>14} {:>14}",
        muted("Feature"),
        muted("Magnitude %"),
        muted("Direction %")
    );
    println!("  {}", dim(&"─".repeat(54)));
    for row in table {
        let direction = format!("{:>14}", row.direction_pct);
        let direction = if row.direction_pct < 0.0 {
            direction.truecolor(230, 120, 120)
        } else {
            direction.normal()
        };
        println!("  {:<24} {:>14} {}", row.feature, row.magnitude_pct, direction);
    }
    println!();
    println!("  {:<24} {}", muted("Base value"), table.base_value);
    if let Some(empty) = table.empty_value {
        println!("  {:<24} {}", muted("All-masked value"), empty);
    }
    for note in zero_share_notes(table) {
        println!("  {}", dim(note));
    }
    println!();
}

/// Explanations for share columns that fell back to zero
fn zero_share_notes(table: &AttributionTable) -> Vec<&'static str> {
    let mut notes = Vec::new();
    if table.magnitude_undefined {
        notes.push("model output did not vary; magnitude and direction shares reported as zero");
    } else if table.direction_undefined {
        notes.push("signed contributions cancel out; direction shares reported as zero");
    }
    notes
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_auto(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    let numeric = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_float() || col.dtype().is_integer())
        .count();
    println!("  {:<12} {}", muted("Numeric"), numeric);
    println!();

    println!("  {:<20} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(42)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6}",
            col.name().to_string(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count()
        );
    }

    println!();
    Ok(())
}
