//! sales-summary CLI - schema checks and category sales summaries over CSV tables

use clap::{Parser, Subcommand, ValueEnum};
use sales_summary::{
    load_catalog, load_csv_table, summarize, synthetic, validate, DateBound, RecordFormat,
    RecordWriter, RuleSet, SalesSummary, SalesTables,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales-summary")]
#[command(version, about = "Sales-by-category summary with schema conformance checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a schema metadata catalog for every column the rules read
    Validate {
        /// CSV export with TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME columns
        #[arg(short, long)]
        catalog: PathBuf,

        /// Rule set YAML (defaults to the built-in AdventureWorks bindings)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Summarize sales by category from CSV tables
    Summarize {
        /// Orders fact table CSV
        #[arg(long)]
        orders: PathBuf,

        /// Product dimension CSV
        #[arg(long)]
        products: PathBuf,

        /// Product subcategory dimension CSV
        #[arg(long)]
        subcategories: PathBuf,

        /// Product category dimension CSV
        #[arg(long)]
        categories: PathBuf,

        /// First day of the range (inclusive)
        #[arg(short, long)]
        start: DateBound,

        /// Last day of the range (inclusive)
        #[arg(short, long)]
        end: DateBound,

        /// Rule set YAML (defaults to the built-in AdventureWorks bindings)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Validate against this catalog CSV before summarizing
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Summarize the built-in synthetic tables
    Synthetic {
        #[arg(short, long, default_value = "2013-01-01")]
        start: DateBound,

        #[arg(short, long, default_value = "2013-12-31")]
        end: DateBound,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Ndjson,
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { catalog, rules } => validate_catalog(&catalog, rules.as_deref()),
        Commands::Summarize {
            orders,
            products,
            subcategories,
            categories,
            start,
            end,
            rules,
            catalog,
            format,
        } => {
            let inputs = CsvInputs {
                orders,
                products,
                subcategories,
                categories,
            };
            summarize_csv(&inputs, start, end, rules.as_deref(), catalog.as_deref(), format)
        }
        Commands::Synthetic { start, end, format } => summarize_synthetic(start, end, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

struct CsvInputs {
    orders: PathBuf,
    products: PathBuf,
    subcategories: PathBuf,
    categories: PathBuf,
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet, String> {
    match path {
        Some(path) => {
            let rules = RuleSet::load_from_file(path)?;
            tracing::info!("Loaded rule set '{}' from {}", rules.name, path.display());
            Ok(rules)
        }
        None => Ok(RuleSet::default()),
    }
}

fn check_catalog(catalog: &Path, rules: &RuleSet) -> Result<usize, String> {
    let table = load_catalog(catalog)
        .map_err(|e| format!("Failed to load catalog {}: {}", catalog.display(), e))?;
    let required = rules.required_columns();
    validate(&table, &required).map_err(|e| e.to_string())?;
    Ok(required.len())
}

/// Check a catalog CSV against the rule set
fn validate_catalog(catalog: &Path, rules: Option<&Path>) -> Result<(), String> {
    let rules = load_rules(rules)?;
    let count = check_catalog(catalog, &rules)?;
    println!(
        "✅ All {} required columns for '{}' are present in {}",
        count,
        rules.name,
        catalog.display()
    );
    Ok(())
}

/// Load the four CSV tables, optionally validate, and print the summary
fn summarize_csv(
    inputs: &CsvInputs,
    start: DateBound,
    end: DateBound,
    rules: Option<&Path>,
    catalog: Option<&Path>,
    format: OutputFormat,
) -> Result<(), String> {
    let rules = load_rules(rules)?;

    if let Some(catalog) = catalog {
        let count = check_catalog(catalog, &rules)?;
        tracing::info!("Catalog check passed for {} columns", count);
    }

    let t = &rules.tables;
    let load = |path: &Path, name: &str| {
        load_csv_table(path, name).map_err(|e| format!("Failed to load {}: {}", path.display(), e))
    };
    let orders = load(&inputs.orders, &t.orders.name)?;
    let products = load(&inputs.products, &t.products.name)?;
    let subcategories = load(&inputs.subcategories, &t.subcategories.name)?;
    let categories = load(&inputs.categories, &t.categories.name)?;

    let tables = SalesTables {
        orders: &orders,
        products: &products,
        subcategories: &subcategories,
        categories: &categories,
    };
    let summary = summarize(&tables, start, end, &rules).map_err(|e| e.to_string())?;
    print_summary(&summary, format)
}

/// Summarize the built-in synthetic tables
fn summarize_synthetic(
    start: DateBound,
    end: DateBound,
    format: OutputFormat,
) -> Result<(), String> {
    let (products, subcategories, categories) = synthetic::dimensions();
    let orders = synthetic::orders();
    let tables = SalesTables {
        orders: &orders,
        products: &products,
        subcategories: &subcategories,
        categories: &categories,
    };

    let summary =
        summarize(&tables, start, end, &RuleSet::default()).map_err(|e| e.to_string())?;
    print_summary(&summary, format)
}

fn print_summary(summary: &SalesSummary, format: OutputFormat) -> Result<(), String> {
    let mut out = std::io::stdout().lock();

    let format = match format {
        OutputFormat::Table => {
            write!(out, "{}", summary).map_err(|e| e.to_string())?;
            return out.flush().map_err(|e| e.to_string());
        }
        OutputFormat::Csv => RecordFormat::Csv,
        OutputFormat::Json => RecordFormat::Json,
        OutputFormat::Ndjson => RecordFormat::Ndjson,
    };

    let mut writer =
        RecordWriter::new(out, format, summary.columns()).map_err(|e| e.to_string())?;
    writer.write_all(summary).map_err(|e| e.to_string())?;
    writer.finish().map_err(|e| e.to_string())
}
