use clap::Parser;
use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use tracing::{info, warn};

mod config;
mod discovery;
mod extract;
mod parser;
mod report;
mod syncml;

use config::Config;
use discovery::{DdfFile, FileFinder};
use extract::{dedupe, CommandCollector, CommandRecord};
use parser::DdfParser;
use report::Reporter;

/// ddfscan - Extract executable MDM commands from Windows CSP DDF schemas
#[derive(Parser, Debug)]
#[command(name = "ddfscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the extracted DDF XML files
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Output format (defaults to json, or the config file's report.format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format; stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not inherit Description/OsBuildVersion from ancestor nodes
    #[arg(long)]
    no_inherit: bool,

    /// Attach a rendered SyncML <Exec> fragment to every record
    #[arg(long)]
    payloads: bool,

    /// Parse files in parallel (output order stays deterministic)
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => report::ReportFormat::Json,
            OutputFormat::Terminal => report::ReportFormat::Terminal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("ddfscan v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    // Run extraction once over the input directory
    run_extraction(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so a JSON catalog on stdout stays clean
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations in the input directory
        Config::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if cli.no_inherit {
        config.extraction.inherit_properties = false;
    }
    if cli.payloads {
        config.extraction.render_payloads = true;
    }

    Ok(config)
}

fn resolve_format(config: &Config, cli: &Cli) -> report::ReportFormat {
    match cli.format {
        Some(format) => format.into(),
        None => match config.report.format.as_str() {
            "terminal" => report::ReportFormat::Terminal,
            _ => report::ReportFormat::Json,
        },
    }
}

fn run_extraction(config: &Config, cli: &Cli) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Instant;

    let start_time = Instant::now();
    let format = resolve_format(config, cli);

    // Step 1: Discover files (missing input directory is the fatal case)
    info!("Discovering DDF files...");
    let finder = FileFinder::new(config);
    let files = finder.find_files(&cli.path)?;

    info!("Found {} XML files to process", files.len());
    if files.is_empty() && !cli.quiet {
        eprintln!("{}", "No DDF XML files found.".yellow());
    }

    // Step 2: Parse each file and collect its command records. A file that
    // fails to parse is reported and skipped; the batch continues.
    let parser = DdfParser::new();
    let collector = CommandCollector::new()
        .with_inheritance(config.extraction.inherit_properties)
        .with_payloads(config.extraction.render_payloads);

    let mut records: Vec<CommandRecord> = Vec::new();
    let mut skipped = 0usize;

    if cli.parallel {
        use rayon::prelude::*;

        info!("Parallel mode: parsing {} files...", files.len());
        // par_iter + collect keeps results in file order, so the merged
        // record order matches a sequential run
        let results: Vec<Result<Vec<CommandRecord>>> = files
            .par_iter()
            .map(|file| extract_file(&parser, &collector, file))
            .collect();

        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(file_records) => records.extend(file_records),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping {}: {}", file.name(), e);
                }
            }
        }
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        for file in &files {
            match extract_file(&parser, &collector, file) {
                Ok(file_records) => records.extend(file_records),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping {}: {}", file.name(), e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    // Step 3: Collapse duplicate (OMA_URI, SourceFile) pairs
    let collected = records.len();
    let records = dedupe(records);
    info!(
        "Collected {} commands ({} after dedup, {} files skipped)",
        collected,
        records.len(),
        skipped
    );

    // Step 4: Emit the catalog
    let reporter = Reporter::new(format, cli.output.clone());
    reporter.report(&records)?;

    let elapsed = start_time.elapsed();
    info!(
        "Processed {} files in {:.2}s",
        files.len(),
        elapsed.as_secs_f64()
    );

    Ok(())
}

/// Parse one file and return its command records in document order
fn extract_file(
    parser: &DdfParser,
    collector: &CommandCollector,
    file: &DdfFile,
) -> Result<Vec<CommandRecord>> {
    let contents = file.read_contents()?;
    let tree = parser.parse(&file.name(), &contents)?;

    let mut records = Vec::new();
    collector.collect(&tree, &mut records);
    Ok(records)
}
