mod config;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use config::{OutputOptions, RunConfig};
use env_logger::Env;
use geotrace_geo::{Credentials, GeoLocator, IpInfoLocator};
use geotrace_model::{LocationResult, RunOutcome};
use geotrace_render::{atomic_write, ColorPolicy, RouteMap, RouteReport};
use geotrace_route::{CancelToken, EnrichmentPipeline, RouteSummary};
use geotrace_trace::{spawn_traceroute_stream, TraceEvent, TraceSettings, TraceTool};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "geotrace", version, about = "Traceroute with hop geolocation and a route map")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Trace(TraceArgs),
    Locate(LocateArgs),
}

#[derive(Args)]
#[command(
    about = "Trace the path to a destination, geolocate each hop and map it. Only target networks you have permission to test."
)]
struct TraceArgs {
    #[arg(default_value = "youtube.com")]
    destination: String,

    /// Trace utility to run (defaults to tracert on Windows, traceroute elsewhere)
    #[arg(long)]
    tool: Option<TraceTool>,

    #[arg(long)]
    max_hops: Option<u32>,

    /// Write the hop table (CSV) and a run receipt when the trace ends
    #[arg(long)]
    report: bool,

    /// Skip the HTML map
    #[arg(long)]
    no_map: bool,

    #[arg(long, default_value = "latency")]
    color_by: ColorPolicy,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, env = "GEOTRACE_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,
}

#[derive(Args)]
#[command(about = "Geolocate addresses and print the results as JSON")]
struct LocateArgs {
    #[arg(required = true)]
    addresses: Vec<String>,

    #[arg(long, env = "GEOTRACE_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,
}

#[derive(Serialize)]
struct RunOutputs {
    report: Option<PathBuf>,
    map: Option<PathBuf>,
}

#[derive(Serialize)]
struct HostInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct RunReceipt {
    version: String,
    started_at_utc: String,
    finished_at_utc: String,
    destination: String,
    tool: String,
    outcome: RunOutcome,
    outputs: RunOutputs,
    host: HostInfo,
    summary: RouteSummary,
}

#[derive(Serialize)]
struct LocatedAddress<'a> {
    address: &'a str,
    #[serde(flatten)]
    location: LocationResult,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Trace(args) => run_trace(args),
        Commands::Locate(args) => run_locate(args),
    }
}

fn run_trace(args: TraceArgs) -> Result<()> {
    let started_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    if args.destination.trim().is_empty() {
        return Err(anyhow!("no destination provided"));
    }

    let config = RunConfig::new(
        &args.destination,
        TraceSettings {
            tool: args.tool.unwrap_or_else(TraceTool::platform_default),
            max_hops: args.max_hops,
        },
        args.token_file,
        args.color_by,
        OutputOptions {
            out_dir: &args.out_dir,
            report: args.report,
            map: !args.no_map,
        },
    );

    // credential problems are fatal and must surface before any tracing
    let credentials = Credentials::load(&config.token_file)?;
    let locator = IpInfoLocator::new(credentials).context("failed to build lookup client")?;

    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();
    // The handler's sender lives for the whole process, so the channel never
    // closes and the consumer only stops on `Done` or cancellation. The
    // producer sends `Done` on every exit path, unwinding included.
    {
        let cancel = cancel.clone();
        let tx = tx.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
            let _ = tx.send(TraceEvent::Interrupted);
        })
        .context("failed to install interrupt handler")?;
    }

    let producer = spawn_traceroute_stream(&config.destination, &config.trace, tx);

    let mut map = config
        .map_path
        .as_ref()
        .map(|path| RouteMap::new(path, config.color_policy));
    let mut report = config.report_path.as_ref().map(RouteReport::new);

    let mut pipeline = EnrichmentPipeline::new(locator, cancel);
    if let Some(map) = map.as_mut() {
        pipeline = pipeline.with_sink(map);
    }
    if let Some(report) = report.as_mut() {
        pipeline = pipeline.with_sink(report);
    }

    let run = pipeline.run(&rx);

    if run.outcome == RunOutcome::Interrupted {
        eprintln!("interrupted: waiting for {} to exit", config.trace.tool);
    }
    if producer.join().is_err() {
        warn!("trace producer thread panicked");
    }

    let summary = RouteSummary::from_records(run.state.records());
    eprintln!("{summary}");
    print_outputs(&config);

    if let Some(receipt_path) = &config.receipt_path {
        let receipt = RunReceipt {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at_utc,
            finished_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            destination: config.destination.clone(),
            tool: config.trace.tool.to_string(),
            outcome: run.outcome,
            outputs: RunOutputs {
                report: config.report_path.clone(),
                map: config.map_path.clone(),
            },
            host: HostInfo {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            },
            summary,
        };
        write_json(receipt_path, &receipt)?;
    }

    info!("{} run {}", config.destination, run.outcome);
    Ok(())
}

fn run_locate(args: LocateArgs) -> Result<()> {
    let credentials = Credentials::load(&args.token_file)?;
    let locator = IpInfoLocator::new(credentials).context("failed to build lookup client")?;

    let located: Vec<LocatedAddress> = args
        .addresses
        .iter()
        .map(|address| LocatedAddress {
            address,
            location: locator.locate(address),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&located)?);
    Ok(())
}

fn print_outputs(config: &RunConfig) {
    if let Some(path) = &config.map_path {
        eprintln!("map: {}", path.display());
    }
    if let Some(path) = &config.report_path {
        eprintln!("report: {}", path.display());
    }
}

fn write_json<T: Serialize>(path: &PathBuf, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}
