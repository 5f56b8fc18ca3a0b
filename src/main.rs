use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use csvgeocoder::{
    config::{AddressColumns, Config, FileConfig, Overrides},
    geocode::AzureMapsClient,
    pipeline::{FixedDelay, Pipeline},
    table::{output_file_name, read_table, write_table},
};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

const RULE_WIDTH: usize = 50;

/// Geocode the address columns of a CSV file with Azure Maps.
#[derive(Debug, Parser)]
#[command(name = "csvgeocoder", version)]
struct Cli {
    /// Input CSV; prompted for when omitted
    input: Option<PathBuf>,

    /// Output CSV (default: geocoded_<timestamp>.csv in the current directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Optional YAML file with endpoint, api_version, delay_ms, timeout_secs, columns
    #[arg(long)]
    config: Option<PathBuf>,

    /// Azure Maps subscription key
    #[arg(long, env = "AZURE_MAPS_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Search Address endpoint
    #[arg(long, env = "AZURE_MAPS_URL")]
    endpoint: Option<String>,

    /// Pause between requests in milliseconds
    #[arg(long, env = "GEOCODE_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, env = "GEOCODE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Zero-based street1,street2,city,postal_code column indices
    #[arg(long, value_name = "A,B,C,D")]
    columns: Option<AddressColumns>,
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Ask for the input path on stdin; surrounding quotes from drag-and-drop are dropped.
fn prompt_for_input() -> Result<String> {
    println!("Azure Maps CSV Geocoder");
    println!("{}", rule());
    print!("Enter CSV file path: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading input path")?;
    Ok(line.trim().trim_matches('"').to_string())
}

fn run(cli: Cli) -> Result<()> {
    let input = match cli.input {
        Some(p) => p,
        None => PathBuf::from(prompt_for_input()?),
    };
    if input.as_os_str().is_empty() {
        println!("Error: No file specified");
        return Ok(());
    }

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = Config::resolve(
        Overrides {
            api_key: cli.api_key,
            endpoint: cli.endpoint,
            delay_ms: cli.delay_ms,
            timeout_secs: cli.timeout_secs,
            columns: cli.columns,
        },
        file,
    )?;
    info!(?config, "resolved configuration");

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(output_file_name(Local::now())));

    println!("\nReading: {}", input.display());
    println!("Output will be saved to: {}", output.display());
    println!("{}", rule());

    let table = read_table(&input)?;
    println!("Found {} rows to process\n", table.rows.len());

    let geocoder = AzureMapsClient::from_config(&config)?;
    let mut pipeline = Pipeline::new(geocoder, FixedDelay::new(config.delay), config.columns);
    let done = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        pipeline.run(&table, &mut out)?
    };

    println!("\nWriting results to {}...", output.display());
    write_table(&output, &done.headers, &done.rows)?;

    println!("\n{}", rule());
    println!("GEOCODING COMPLETE!");
    println!("{}", rule());
    print!("{}", done.summary);
    println!("\nOutput saved to: {}", output.display());
    println!("{}", rule());
    Ok(())
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) configuration ───────────────────────────────────────────
    // .env must be loaded before clap reads env-backed flags
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ─── 3) run; errors are reported, not turned into exit codes ─────
    if let Err(e) = run(cli) {
        debug!(error = ?e, "run aborted");
        println!("Error: {:#}", e);
    }
    Ok(())
}
