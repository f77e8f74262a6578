use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use wikigraph::config::{
    DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FILENAME, DEFAULT_TRUNC_SIZE, REPORT_SAMPLE_SIZE,
};
use wikigraph::edges::EdgeListSink;
use wikigraph::inspect::InspectionSink;
use wikigraph::pipeline::{self, PageSink};
use wikigraph::report::ReportSink;
use wikigraph::{FilterConfig, RunSummary, WikiReader};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikigraph")]
#[command(about = "Extract the link graph of a compressed Wikipedia dump")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print pages as nested records for manual exploration
    Peek(PeekArgs),
    /// Print link counts and sample targets per page
    Report(ReportArgs),
    /// Write a source,target edge list as CSV
    Export(ExportArgs),
    /// Run any combination of sinks over a single pass
    Run(RunArgs),
}

#[derive(Args)]
struct FilterArgs {
    /// Path to the Wikipedia dump file (.xml.bz2)
    #[arg(short, long)]
    input: PathBuf,

    /// Include pages outside the article namespace
    #[arg(long)]
    all_namespaces: bool,

    /// Include article redirects
    #[arg(long)]
    include_redirects: bool,
}

#[derive(Args)]
struct PeekArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Number of qualifying pages to print
    #[arg(long, default_value_t = 1)]
    limit: u64,

    /// Maximum characters shown per text field
    #[arg(long, default_value_t = DEFAULT_TRUNC_SIZE)]
    trunc_size: usize,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Number of qualifying pages to report on
    #[arg(long, default_value_t = 100)]
    limit: u64,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Number of qualifying pages to export
    #[arg(long, default_value_t = 1000)]
    limit: u64,

    /// Export every qualifying page, ignoring --limit
    #[arg(long)]
    no_limit: bool,

    /// Output directory for the edge list
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Edge list file name
    #[arg(long, default_value = DEFAULT_OUTPUT_FILENAME)]
    output_filename: String,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Stop after this many qualifying pages (default: whole dump)
    #[arg(long)]
    limit: Option<u64>,

    /// Maximum characters shown per text field
    #[arg(long, default_value_t = DEFAULT_TRUNC_SIZE)]
    trunc_size: usize,

    /// Print inspection records
    #[arg(long)]
    inspect: bool,

    /// Print link reports
    #[arg(long)]
    report: bool,

    /// Write the edge list to this CSV file
    #[arg(long)]
    edges: Option<PathBuf>,
}

fn filter_config(args: &FilterArgs, trunc_size: usize, limit: Option<u64>) -> Result<FilterConfig> {
    FilterConfig::new(
        !args.all_namespaces,
        !args.include_redirects,
        trunc_size,
        limit,
    )
    .context("Invalid filter settings")
}

fn run_peek(args: PeekArgs) -> Result<RunSummary> {
    let config = filter_config(&args.filter, args.trunc_size, Some(args.limit))?;
    let summary = pipeline::inspect(&args.filter.input, &config, io::stdout())
        .with_context(|| format!("Failed to inspect {}", args.filter.input.display()))?;
    Ok(summary)
}

fn run_report(args: ReportArgs) -> Result<RunSummary> {
    let config = filter_config(&args.filter, DEFAULT_TRUNC_SIZE, Some(args.limit))?;
    let summary = pipeline::report(&args.filter.input, &config, io::stdout())
        .with_context(|| format!("Failed to report on {}", args.filter.input.display()))?;
    Ok(summary)
}

fn run_export(args: ExportArgs) -> Result<RunSummary> {
    let limit = (!args.no_limit).then_some(args.limit);
    let config = filter_config(&args.filter, DEFAULT_TRUNC_SIZE, limit)?;

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;
    let output_path = args.output_dir.join(&args.output_filename);

    println!("Starting extraction... Saving to: {}", output_path.display());
    let summary = pipeline::export_edges(&args.filter.input, &config, &output_path)
        .with_context(|| format!("Failed to export edges from {}", args.filter.input.display()))?;
    println!(
        "Finished! Saved {} pages of relationships to {}",
        summary.pages_processed(),
        args.output_filename
    );
    Ok(summary)
}

fn run_combined(args: RunArgs) -> Result<RunSummary> {
    let config = filter_config(&args.filter, args.trunc_size, args.limit)?;

    let mut inspect = args
        .inspect
        .then(|| InspectionSink::new(io::stdout(), config.trunc_size));
    let mut report = args
        .report
        .then(|| ReportSink::new(io::stdout(), REPORT_SAMPLE_SIZE));
    let mut edges = match &args.edges {
        Some(path) => Some(EdgeListSink::create(path)?),
        None => None,
    };

    let mut sinks: Vec<&mut dyn PageSink> = Vec::new();
    if let Some(sink) = inspect.as_mut() {
        sinks.push(sink);
    }
    if let Some(sink) = report.as_mut() {
        sinks.push(sink);
    }
    if let Some(sink) = edges.as_mut() {
        sinks.push(sink);
    }
    if sinks.is_empty() {
        anyhow::bail!("Nothing to do: pass at least one of --inspect, --report, --edges");
    }

    let reader = WikiReader::open(&args.filter.input)
        .with_context(|| format!("Failed to open wiki dump at: {}", args.filter.input.display()))?;
    let summary = pipeline::run(reader, &config, &mut sinks)
        .with_context(|| format!("Failed to process {}", args.filter.input.display()))?;
    Ok(summary)
}

fn print_summary(input: &Path, summary: &RunSummary, elapsed_secs: f64) {
    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Dump:               {}", input.display());
    eprintln!("Elapsed time:       {:.2}s", elapsed_secs);
    eprintln!("Pages scanned:      {}", summary.scanned());
    eprintln!("Pages processed:    {}", summary.pages_processed());
    eprintln!("Articles seen:      {}", summary.articles);
    eprintln!("Redirects seen:     {}", summary.article_redirects);
    eprintln!("Other pages seen:   {}", summary.other_pages);
    eprintln!("Edges extracted:    {}", summary.edges());
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let start = Instant::now();
    let (input, result) = match cli.command {
        Commands::Peek(args) => (args.filter.input.clone(), run_peek(args)),
        Commands::Report(args) => (args.filter.input.clone(), run_report(args)),
        Commands::Export(args) => (args.filter.input.clone(), run_export(args)),
        Commands::Run(args) => (args.filter.input.clone(), run_combined(args)),
    };

    match result {
        Ok(summary) => {
            if cli.verbose > 0 {
                print_summary(&input, &summary, start.elapsed().as_secs_f64());
            }
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
