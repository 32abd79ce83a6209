use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use data_analyst::config::{validate_table_name, AppConfig};
use data_analyst::dataset::cleaning::{DataCleaner, KeepDuplicate, MissingStrategy, OutlierMethod};
use data_analyst::dataset::{ingestion, profile, statistics};
use data_analyst::db::HistoryStore;
use data_analyst::llm::ProviderKind;
use data_analyst::observability;
use data_analyst::DataAssistant;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "analyst")]
#[command(about = "Ask natural-language questions about a CSV file")]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Provider tried first (xai, groq, gemini, openai)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model for the selected provider
    #[arg(long, global = true)]
    model: Option<String>,

    /// Table name the dataset is registered under
    #[arg(long, global = true)]
    table: Option<String>,

    /// Ceiling for each provider call and for query execution
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// SQLite file for analysis history (or set ANALYST_HISTORY_DB)
    #[arg(long, global = true)]
    history_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question about a CSV file
    Ask {
        csv_file: PathBuf,
        question: String,

        /// Print the whole response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print column types, missing values, statistics and a quality score
    Profile { csv_file: PathBuf },
    /// Clean a CSV file and write the result
    Clean(CleanArgs),
    /// List configured providers and the active selection
    Providers,
    /// Show recent analyses
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(clap::Args)]
struct CleanArgs {
    csv_file: PathBuf,

    /// Where the cleaned CSV is written
    #[arg(short, long)]
    output: PathBuf,

    /// Columns to drop before anything else
    #[arg(long, value_delimiter = ',')]
    drop: Vec<String>,

    /// Rename a column, as old=new (repeatable)
    #[arg(long)]
    rename: Vec<String>,

    /// drop_rows, drop_columns, fill_mean, fill_median, fill_mode,
    /// fill_constant=<value>, forward_fill, backward_fill or interpolate
    #[arg(long)]
    missing: Option<String>,

    /// Columns the missing-data strategy applies to (default: all)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Remove outliers from numeric columns (iqr or z_score)
    #[arg(long)]
    outliers: Option<String>,

    /// Remove duplicate rows, keeping the first
    #[arg(long)]
    dedupe: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    observability::init_tracing(args.verbose);

    let config = load_config(&args)?;

    match args.command {
        Commands::Ask { csv_file, question, json } => ask(&config, csv_file, &question, json).await,
        Commands::Profile { csv_file } => show_profile(csv_file),
        Commands::Clean(clean_args) => clean(clean_args),
        Commands::Providers => show_providers(&config),
        Commands::History { limit } => show_history(&config, limit),
    }
}

/// Environment first, then command-line overrides.
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("Failed to read configuration")?;

    if let Some(provider) = &args.provider {
        let kind: ProviderKind = provider.parse()?;
        config.default_provider = Some(kind);
        // DEFAULT_AI_MODEL may name a model of another provider
        config.default_model = args.model.clone();
    } else if let Some(model) = &args.model {
        config.default_model = Some(model.clone());
    }

    if let Some(table) = &args.table {
        validate_table_name(table)?;
        config.table_name = table.clone();
    }

    if let Some(secs) = args.timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be positive");
        }
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(path) = &args.history_db {
        config.history_path = Some(path.clone());
    }

    Ok(config)
}

async fn ask(config: &AppConfig, csv_file: PathBuf, question: &str, json: bool) -> Result<()> {
    if !config.has_providers() {
        bail!("No AI provider configured. Set one of XAI_API_KEY, GROQ_API_KEY, GEMINI_API_KEY or OPENAI_API_KEY");
    }

    let dataset = ingestion::load_csv(&csv_file)?;
    info!("Loaded {} rows x {} columns from {:?}", dataset.height(), dataset.width(), csv_file);

    let assistant = DataAssistant::from_config(config)?;
    let response = assistant.ask(&dataset, question).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response.to_json()?)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!(" {}", response.question);
    println!("{}", "=".repeat(80));
    println!("\nSQL ({} / {}):\n  {}", response.answered_by.provider, response.answered_by.model, response.sql);
    println!(
        "\nResult ({} rows, {}ms):",
        response.result.row_count, response.result.execution_time_ms
    );
    println!("{}", response.result.preview(20)?);
    if response.result.row_count > 20 {
        println!("... {} more rows", response.result.row_count - 20);
    }
    println!("\nInterpretation:\n{}", response.explanation);

    Ok(())
}

fn show_profile(csv_file: PathBuf) -> Result<()> {
    let dataset = ingestion::load_csv(&csv_file)?;
    let summary = profile::profile(&dataset);
    let quality = profile::quality_score(&dataset)?;

    println!("\n{}", "=".repeat(80));
    println!(" {} ({} rows x {} columns)", dataset.name(), summary.total_rows, summary.total_columns);
    println!("{}", "=".repeat(80));
    println!(
        "Numeric: {}  Text: {}  Date: {}",
        summary.numeric_columns, summary.text_columns, summary.date_columns
    );

    println!("\n{:<30} {:<10} {:>10} {:>10} {:>10}", "column", "type", "missing", "missing%", "unique");
    println!("{}", "-".repeat(74));
    for column in profile::column_summaries(&dataset)? {
        println!(
            "{:<30} {:<10} {:>10} {:>9.1}% {:>10}",
            column.name,
            format!("{:?}", column.column_type),
            column.null_count,
            column.null_pct,
            column.unique
        );
    }

    let stats = statistics::summary_statistics(&dataset)?;
    if !stats.numeric.is_empty() {
        println!(
            "\n{:<30} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "numeric", "count", "mean", "std", "min", "median", "max"
        );
        println!("{}", "-".repeat(94));
        for column in &stats.numeric {
            println!(
                "{:<30} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
                column.name,
                column.count,
                fmt_stat(column.mean),
                fmt_stat(column.std),
                fmt_stat(column.min),
                fmt_stat(column.median),
                fmt_stat(column.max)
            );
        }
    }
    for column in &stats.categorical {
        let top = column
            .top_values
            .iter()
            .map(|v| format!("{} ({})", v.value, v.count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("\n{}: {} distinct; top: {}", column.name, column.unique_values, top);
    }

    let strong = statistics::correlations(&dataset, 0.0)?.strong_pairs(0.7);
    if !strong.is_empty() {
        println!("\nStrong correlations (|r| >= 0.7):");
        for (a, b, r) in strong {
            println!("  {} ~ {}: {:.3}", a, b, r);
        }
    }

    println!(
        "\nQuality score: {:.2} (completeness {:.2}%, uniqueness {:.2}%)",
        quality.quality_score, quality.completeness, quality.uniqueness
    );
    println!(
        "Missing cells: {} of {}  Duplicate rows: {}",
        quality.missing_cells, quality.total_cells, quality.duplicate_rows
    );

    Ok(())
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn clean(args: CleanArgs) -> Result<()> {
    let mut dataset = ingestion::load_csv(&args.csv_file)?;
    let mut cleaner = DataCleaner::new(&mut dataset);

    if !args.drop.is_empty() {
        cleaner.drop_columns(&args.drop)?;
    }

    if !args.rename.is_empty() {
        let renames = args
            .rename
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((old, new)) => Ok((old.trim().to_string(), new.trim().to_string())),
                None => bail!("--rename expects old=new, got {}", pair),
            })
            .collect::<Result<Vec<_>>>()?;
        cleaner.rename_columns(&renames)?;
    }

    if let Some(missing) = &args.missing {
        let strategy: MissingStrategy = missing.parse()?;
        let columns = (!args.columns.is_empty()).then_some(args.columns.as_slice());
        cleaner.handle_missing(strategy, columns)?;
    }

    if let Some(method) = &args.outliers {
        let method: OutlierMethod = method.parse()?;
        cleaner.remove_outliers(method, None)?;
    }

    if args.dedupe {
        cleaner.remove_duplicates(None, KeepDuplicate::First)?;
    }

    let summary = cleaner.summary();
    for step in &summary.operations {
        println!("- {}", step.description);
    }
    println!(
        "{} x {} -> {} x {} ({} rows, {} columns removed)",
        summary.original_shape.0,
        summary.original_shape.1,
        summary.current_shape.0,
        summary.current_shape.1,
        summary.rows_removed,
        summary.columns_removed
    );

    ingestion::write_csv(&dataset, &args.output)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn show_providers(config: &AppConfig) -> Result<()> {
    let assistant = DataAssistant::from_config(config)?;
    let registry = assistant.registry();
    let info = registry.info();

    if info.total_providers == 0 {
        println!("No providers configured.");
        return Ok(());
    }

    for name in &info.available_providers {
        let marker = if info.active_provider.as_deref() == Some(name.as_str()) { "*" } else { " " };
        println!("{} {}: {}", marker, name, registry.models(name).join(", "));
    }
    if let (Some(provider), Some(model)) = (info.active_provider, info.active_model) {
        println!("\nActive: {} ({})", provider, model);
    }

    Ok(())
}

fn show_history(config: &AppConfig, limit: usize) -> Result<()> {
    let Some(path) = &config.history_path else {
        bail!("No history database configured. Set ANALYST_HISTORY_DB or pass --history-db");
    };

    let store = HistoryStore::open(path)?;
    let entries = store.recent(limit)?;
    if entries.is_empty() {
        println!("No analyses recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{} [{}] {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.status.as_str(),
            entry.question
        );
        if let Some(sql) = &entry.sql {
            println!("    {}", sql);
        }
        match (&entry.row_count, &entry.error_message) {
            (Some(rows), _) => println!("    {} rows", rows),
            (None, Some(error)) => println!("    error: {}", error),
            _ => {}
        }
    }

    Ok(())
}
