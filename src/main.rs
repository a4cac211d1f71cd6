//! Command-line front end for the sensor windowing pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use sensor_windower::{
    ingest, pipeline, IngestCounters, NormalizePolicy, Normalizer, OutputFormat, OutputTarget,
    SharedCounters, SharedSink, SystemClock, TracingSink, Watcher, WatcherConfig, WindowSpec,
    WriteMode, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sensor-windower")]
#[command(version = VERSION)]
#[command(about = "Sliding-window statistics over time-stamped sensor records", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Path to the JSON record file
    #[arg(short, long)]
    file: PathBuf,

    /// List the source tags present in the input and exit
    #[arg(
        long,
        conflicts_with_all = ["length", "step", "output_csv", "output_json", "watch"]
    )]
    list_sources: bool,

    /// Window length in seconds
    #[arg(short, long, required_unless_present = "list_sources")]
    length: Option<f64>,

    /// Advance between window starts in seconds (defaults to the length)
    #[arg(short, long)]
    step: Option<f64>,

    /// Only keep records from this source (case-insensitive, repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Reject a record if any payload entry is non-numeric
    #[arg(long)]
    strict: bool,

    /// Write windows as semicolon-delimited CSV to this path
    #[arg(long, value_name = "PATH")]
    output_csv: Option<PathBuf>,

    /// Write windows as JSON to this path
    #[arg(long, value_name = "PATH")]
    output_json: Option<PathBuf>,

    /// Write the normalized records themselves as JSON to this path
    #[arg(long, value_name = "PATH")]
    records_json: Option<PathBuf>,

    /// Write output in chunks of this many items instead of one shot
    #[arg(long, value_name = "ITEMS")]
    chunk_size: Option<usize>,

    /// Keep polling the input for appended records
    #[arg(long)]
    watch: bool,

    /// Seconds between polls in watch mode
    #[arg(long, default_value_t = 1.0, value_name = "SECONDS")]
    watch_interval: f64,

    /// Only log errors
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,

    /// Log per-record skip reasons
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.list_sources {
        return cmd_list_sources(&cli.file);
    }

    let Some(length) = cli.length else {
        bail!("--length is required unless --list-sources is given");
    };
    let spec = WindowSpec::new(length, cli.step)?;

    let mode = match cli.chunk_size {
        Some(chunk_size) => WriteMode::buffered(chunk_size)?,
        None => WriteMode::SingleShot,
    };

    let mut targets = Vec::new();
    if let Some(path) = &cli.output_csv {
        targets.push(OutputTarget::new(path.clone(), OutputFormat::Csv));
    }
    if let Some(path) = &cli.output_json {
        targets.push(OutputTarget::new(path.clone(), OutputFormat::Json));
    }
    if targets.is_empty() && cli.records_json.is_none() {
        bail!("no output target; pass --output-csv, --output-json or --records-json");
    }

    let events: SharedSink = Arc::new(TracingSink);
    let counters: SharedCounters = Arc::new(IngestCounters::new());
    let filter = (!cli.sources.is_empty()).then(|| cli.sources.clone());
    let policy = if cli.strict {
        NormalizePolicy::Strict
    } else {
        NormalizePolicy::Lenient
    };
    let normalizer = Normalizer::new(filter, policy, events.clone(), counters.clone());

    if cli.watch {
        run_watch(&cli, spec, targets, mode, normalizer, events, &counters)?;
    } else {
        run_batch(&cli, spec, &targets, mode, &normalizer, &events, &counters)?;
    }

    println!("{}", counters.summary());
    Ok(())
}

/// Batch mode: one synchronous pass over the whole input file.
fn run_batch(
    cli: &Cli,
    spec: WindowSpec,
    targets: &[OutputTarget],
    mode: WriteMode,
    normalizer: &Normalizer,
    events: &SharedSink,
    counters: &SharedCounters,
) -> anyhow::Result<()> {
    let raws = ingest::read_records(&cli.file)?;
    let records = pipeline::normalize_records(&raws, normalizer);

    if let Some(path) = &cli.records_json {
        let record_target = [OutputTarget::new(path.clone(), OutputFormat::Json)];
        pipeline::write_outputs(&records, &record_target, mode, events, counters)?;
    }

    let windows = pipeline::window_records(records, raws.len(), &spec, events, counters);
    pipeline::write_outputs(&windows, targets, mode, events, counters)?;
    Ok(())
}

/// Watch mode: poll the input for appended records until Ctrl+C.
fn run_watch(
    cli: &Cli,
    spec: WindowSpec,
    targets: Vec<OutputTarget>,
    mode: WriteMode,
    normalizer: Normalizer,
    events: SharedSink,
    counters: &SharedCounters,
) -> anyhow::Result<()> {
    if !cli.watch_interval.is_finite() || cli.watch_interval <= 0.0 {
        bail!("--watch-interval must be a positive number of seconds");
    }

    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = cancel_tx.try_send(());
    })
    .context("failed to install Ctrl+C handler")?;

    let config = WatcherConfig {
        source: cli.file.clone(),
        spec,
        targets,
        mode,
        interval: Duration::from_secs_f64(cli.watch_interval),
    };

    println!("Watching {} (Ctrl+C to stop)", cli.file.display());
    let mut watcher = Watcher::new(
        config,
        normalizer,
        Arc::new(SystemClock),
        events,
        counters.clone(),
    );
    watcher.run(&cancel_rx);

    println!();
    println!("Stopped watching.");
    Ok(())
}

/// Print the unique source tags found in the input, one per line.
fn cmd_list_sources(file: &Path) -> anyhow::Result<()> {
    let raws = ingest::read_records(file)?;
    for name in ingest::unique_sources(&raws) {
        println!("{name}");
    }
    Ok(())
}

/// Map the verbosity flags onto the tracing subscriber, honoring an
/// explicit RUST_LOG when one is set.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
