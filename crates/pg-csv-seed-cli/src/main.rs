//! pg-csv-seed CLI - Seed a PostgreSQL (pgvector) database from CSV exports.

use clap::Parser;
use pg_csv_seed::{Config, Orchestrator, SeedError, SeedResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "pg-csv-seed")]
#[command(about = "Seed a PostgreSQL (pgvector) database from CSV exports")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (optional; environment variables are
    /// read either way)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file read before the environment (variables already set win)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Directory holding clients.csv, consultation.csv, training.csv and
    /// employments.csv [env: DATABASE_DIR]
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// PostgreSQL connection string [env: DB_URL]
    #[arg(long)]
    db_url: Option<String>,

    /// Target schema
    #[arg(long)]
    schema: Option<String>,

    /// Dry run: read and check every CSV file without connecting
    #[arg(long)]
    dry_run: bool,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SeedError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(SeedError::Config)?;

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };
    config = match &cli.env_file {
        Some(path) => config.with_env_file(path)?,
        None => config.with_env()?,
    };

    // Command-line overrides
    if let Some(dir) = cli.csv_dir {
        config.source.dir = Some(dir);
    }
    if let Some(url) = cli.db_url {
        config.target.url = Some(url);
    }
    if let Some(schema) = cli.schema {
        config.target.schema = schema;
    }

    // Pre-flight: configuration and CSV directory are checked before connecting
    let orchestrator = Orchestrator::new(config)?;

    let result = if cli.dry_run {
        orchestrator.dry_run().await?
    } else {
        orchestrator.run().await?
    };

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn print_summary(result: &SeedResult) {
    let status_msg = if result.dry_run { "Dry run completed!" } else { "Seed completed!" };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  CSV directory: {}", result.csv_dir.display());
    println!("  Duration: {:.2}s", result.duration_seconds);

    for stage in &result.stages {
        print!(
            "  {}: {} read, {} inserted",
            stage.table, stage.rows_read, stage.inserted
        );
        if stage.updated > 0 {
            print!(", {} updated", stage.updated);
        }
        if stage.skipped_existing > 0 {
            print!(", {} already present", stage.skipped_existing);
        }
        if stage.skipped_short > 0 {
            print!(", {} short rows skipped", stage.skipped_short);
        }
        println!();
    }

    for seq in &result.sequences {
        println!("  Sequence {}.id at {}", seq.table, seq.last_value);
    }
    println!("  Rows written: {}", result.rows_written());
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // Logs go to stderr so --output-json keeps stdout machine-readable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
