//! Segmesh - Clip, color and export segment meshes
//!
//! Reads per-segment surface meshes from a source directory, keeps the part
//! inside an optional bounding box, and writes one OBJ/MTL pair per segment.

mod report;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use segmesh_assets::FileMeshSource;
use segmesh_batch::{BatchConfig, BatchOrchestrator, CancelToken};
use segmesh_core::SegmentId;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use report::{format_elapsed, write_report};
use settings::{ExportSettings, Overrides};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "segmesh", version, about)]
struct Cli {
    /// Segment ids to export (replaces `segment_ids` from the settings file)
    #[arg(value_name = "ID")]
    ids: Vec<SegmentId>,

    /// Settings file (TOML)
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory receiving the OBJ/MTL pairs
    #[arg(long, short = 'o', value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Directory holding `<id>.glb`, `<id>.gltf` or `<id>.obj` meshes
    #[arg(long, short = 's', value_name = "DIR")]
    source_dir: Option<PathBuf>,

    /// Multiplier applied to source positions on load
    #[arg(long, value_name = "FACTOR")]
    unit_scale: Option<f64>,

    /// Number of worker threads (1 = sequential)
    #[arg(long, short = 'j', value_name = "N")]
    workers: Option<usize>,

    /// Bounding box minimum corner, as x,y,z
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_triple, allow_hyphen_values = true)]
    min: Option<[f64; 3]>,

    /// Bounding box maximum corner, as x,y,z
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_triple, allow_hyphen_values = true)]
    max: Option<[f64; 3]>,

    /// Offset subtracted from every kept vertex, as x,y,z
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_triple, allow_hyphen_values = true)]
    offset: Option<[f64; 3]>,

    /// Write the batch report as JSON to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            segment_ids: self.ids.clone(),
            output_dir: self.output_dir.clone(),
            source_dir: self.source_dir.clone(),
            unit_scale: self.unit_scale,
            workers: self.workers,
            min: self.min,
            max: self.max,
            offset: self.offset,
        }
    }
}

/// Parse "x,y,z" into three floats.
fn parse_triple(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got {:?}", s));
    };
    let parse = |v: &str| {
        v.parse::<f64>()
            .map_err(|e| format!("invalid number {:?}: {}", v, e))
    };
    Ok([parse(*x)?, parse(*y)?, parse(*z)?])
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

/// Cancel `token` on Ctrl-C. Runs a small tokio runtime on a side thread.
fn spawn_interrupt_listener(token: CancelToken) {
    let spawned = std::thread::Builder::new()
        .name("segmesh-signal".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to create signal runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing segments already in progress");
                    token.cancel();
                }
            });
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn signal listener: {}", e);
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("Starting segmesh...");

    let settings = ExportSettings::load(cli.config.as_deref())?.with_overrides(cli.overrides())?;
    let colors = settings.color_map()?;

    if settings.segment_ids.is_empty() {
        warn!("No segment ids given; nothing to export");
    }

    let mut config = BatchConfig::new(&settings.output_dir)
        .with_offset(settings.offset())
        .with_workers(settings.workers);
    config.bounds = settings.bounding_box();

    let mut orchestrator = BatchOrchestrator::new(config).with_colors(colors);
    if let Some(dir) = &settings.source_dir {
        orchestrator = orchestrator
            .with_source(FileMeshSource::new(dir).with_unit_scale(settings.unit_scale));
    }

    spawn_interrupt_listener(orchestrator.cancel_token());

    let report = orchestrator
        .run(&settings.segment_ids)
        .context("Batch aborted before processing any segment")?;

    info!(
        "Finished in {}: {}",
        format_elapsed(report.elapsed_ms),
        report
    );

    if let Some(path) = &cli.report {
        write_report(path, &settings.output_dir, &report)?;
    }

    Ok(if report.is_complete_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
