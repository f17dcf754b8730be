use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use threatcore::interface::RfDetection;
use threatcore::telemetry::BatchReport;
use threatcore::{DarkVesselCorrelator, Scheduler, ScreeningQuery};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::watch;
use workflow::config::DaemonConfig;
use workflow::sink::JsonLinesSink;
use workflow::store::JsonFileStore;

mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Vessel threat-scoring batch daemon")]
struct Args {
    /// Load daemon settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file of track points
    #[arg(long)]
    tracks: Option<PathBuf>,
    /// JSON file of smuggling areas
    #[arg(long)]
    areas: Option<PathBuf>,
    /// JSON-lines file receiving threat results
    #[arg(long)]
    results: Option<PathBuf>,
    #[arg(long)]
    interval_minutes: Option<u64>,
    /// Run a single batch and exit instead of scheduling
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Restrict the single batch to these vessels (repeatable, implies --once)
    #[arg(long)]
    mmsi: Vec<String>,
    /// Screen RF detections from this JSON file for dark vessels and exit
    #[arg(long)]
    rf_detections: Option<PathBuf>,
    #[arg(long, requires = "rf_detections")]
    screen_lat: Option<f64>,
    #[arg(long, requires = "rf_detections")]
    screen_lon: Option<f64>,
    /// Screening radius in nautical miles
    #[arg(long, default_value_t = 20.0)]
    screen_radius_nm: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    }
    .with_overrides(
        args.tracks.clone(),
        args.areas.clone(),
        args.results.clone(),
        args.interval_minutes,
    );

    let store = Arc::new(
        JsonFileStore::open(&config.tracks, config.areas.clone())
            .with_context(|| format!("opening track store {}", config.tracks.display()))?,
    );

    if let Some(path) = &args.rf_detections {
        return screen(&args, path, &config, store.as_ref());
    }

    let sink = Arc::new(
        JsonLinesSink::open(&config.results)
            .with_context(|| format!("opening result file {}", config.results.display()))?,
    );
    let scheduler = Arc::new(Scheduler::new(store, sink, config.scheduler.clone()));

    if args.once || !args.mmsi.is_empty() {
        let report = if args.mmsi.is_empty() {
            scheduler.run_batch()
        } else {
            scheduler.run_batch_for(&args.mmsi)
        }
        .context("running threat batch")?;

        println!(
            "Batch run -> vessels {}, processed {}, skipped {}, failed {}, results {}",
            report.vessels_seen,
            report.vessels_processed,
            report.vessels_skipped,
            report.vessels_failed,
            report.results_persisted
        );
        append_batch_log(Path::new("tools/data/threat_batches.log"), &report)?;
        return Ok(());
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating scheduler runtime")?;
    runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        info!("shutdown requested, finishing the current vessel");
        shutdown_tx
            .send(true)
            .context("signalling scheduler shutdown")?;
        task.await.context("joining scheduler task")?;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn screen(
    args: &Args,
    path: &Path,
    config: &DaemonConfig,
    store: &JsonFileStore,
) -> anyhow::Result<()> {
    let (Some(center_lat), Some(center_lon)) = (args.screen_lat, args.screen_lon) else {
        anyhow::bail!("--screen-lat and --screen-lon are required with --rf-detections");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading RF detections {}", path.display()))?;
    let detections: Vec<RfDetection> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing RF detections {}", path.display()))?;

    let query = ScreeningQuery {
        center_lat,
        center_lon,
        radius_nm: args.screen_radius_nm,
    };
    let correlator = DarkVesselCorrelator::new(config.scheduler.correlator.clone());
    let reports = correlator
        .screen(&detections, store, &query)
        .context("screening RF detections")?;

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    info!(
        "screened {} detections, {} candidates in area, {} dark",
        detections.len(),
        reports.len(),
        reports.iter().filter(|r| !r.ais_flag).count()
    );
    Ok(())
}

fn append_batch_log(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening batch log {}", path.display()))?;
    let line = format!("{} {}\n", Utc::now().to_rfc3339(), serde_json::to_string(report)?);
    file.write_all(line.as_bytes())?;
    Ok(())
}
