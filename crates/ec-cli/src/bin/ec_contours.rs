use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ec_contour::{
    ContourParams, DetectionMode, EdgeMap, FusionEngine, FusionOptions, ScaleConfig,
    ScaleSchedule, extract_segments,
};
use ec_io::Raster;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ec_contours")]
#[command(about = "Multi-scale contour fusion and edge segment extraction")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fused contour strength raster.
    #[command(name = "soft")]
    Soft(SoftArgs),
    /// Fused, thresholded and traced into segments.
    #[command(name = "bw")]
    Bw(BwArgs),
    /// Thresholds and traces an existing strength raster.
    #[command(name = "extract")]
    Extract(ExtractArgs),
    /// Soft and binary outputs for a list of images.
    #[command(name = "batch")]
    Batch(BatchArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Colour files use DiZenzo, gray files the gray schedule.
    Auto,
    Gray,
    Color,
}

#[derive(Args, Debug, Clone)]
struct FuseArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// PGM output, or PNG when the name ends in `.png`.
    #[arg(long, required = true)]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,
    /// Base gradient threshold; defaults to 30 (gray) or 32 (colour).
    #[arg(long)]
    grad_thresh: Option<i32>,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Writes a JSON run summary.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct SoftArgs {
    #[command(flatten)]
    fuse: FuseArgs,
}

#[derive(Args, Debug, Clone)]
struct BwArgs {
    #[command(flatten)]
    fuse: FuseArgs,
    /// Strength cutoff in 0..=255; defaults to 252 (gray) or 200 (colour).
    #[arg(long)]
    cutoff: Option<i32>,
    /// Writes the traced segments as JSON.
    #[arg(long)]
    segments: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, required = true)]
    output: PathBuf,
    #[arg(long, default_value_t = 128)]
    cutoff: i32,
    #[arg(long)]
    segments: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct BatchArgs {
    #[arg(long = "input", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    /// Receives `<stem>-soft.pgm` and `<stem>-bw.pgm` per input.
    #[arg(long, required = true)]
    out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,
    #[arg(long)]
    grad_thresh: Option<i32>,
    #[arg(long)]
    cutoff: Option<i32>,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Writes one JSON summary entry per input.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    input: PathBuf,
    output: PathBuf,
    mode: Option<DetectionMode>,
    width: usize,
    height: usize,
    grad_thresh: Option<i32>,
    cutoff: Option<i32>,
    scales: Vec<ScaleConfig>,
    edge_pixels: usize,
    num_segments: usize,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Soft(args) => run_soft(args),
        Command::Bw(args) => run_bw(args),
        Command::Extract(args) => run_extract(args),
        Command::Batch(args) => run_batch(args),
    }
}

fn run_soft(args: SoftArgs) -> Result<()> {
    let (raster, mode) = load_input(&args.fuse.input, args.fuse.mode)?;
    let grad_thresh = args
        .fuse
        .grad_thresh
        .unwrap_or(ContourParams::for_mode(mode).grad_thresh);
    let mut engine = build_engine(mode, grad_thresh, args.fuse.parallel)?;

    let start = Instant::now();
    let map = engine
        .fuse(&raster.channels())
        .context("fusing contour scales")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    info!(?mode, grad_thresh, elapsed_ms, "fused soft contour map");

    save_map(&args.fuse.output, &map)?;

    if let Some(path) = &args.fuse.report {
        let report = RunReport {
            input: args.fuse.input.clone(),
            output: args.fuse.output.clone(),
            mode: Some(mode),
            width: map.width(),
            height: map.height(),
            grad_thresh: Some(grad_thresh),
            cutoff: None,
            scales: engine.schedule().scales().to_vec(),
            edge_pixels: count_nonzero(&map),
            num_segments: 0,
            elapsed_ms,
        };
        write_json(path, &report)?;
    }
    Ok(())
}

fn run_bw(args: BwArgs) -> Result<()> {
    let (raster, mode) = load_input(&args.fuse.input, args.fuse.mode)?;
    let defaults = ContourParams::for_mode(mode);
    let grad_thresh = args.fuse.grad_thresh.unwrap_or(defaults.grad_thresh);
    let cutoff = args.cutoff.unwrap_or(defaults.cutoff);
    let mut engine = build_engine(mode, grad_thresh, args.fuse.parallel)?;

    let start = Instant::now();
    let map = engine
        .fuse_bw(&raster.channels(), cutoff)
        .context("fusing and tracing contours")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    info!(
        ?mode,
        grad_thresh,
        cutoff,
        segments = map.num_segments(),
        elapsed_ms,
        "extracted edge segments"
    );

    save_map(&args.fuse.output, &map)?;
    if let Some(path) = &args.segments {
        write_json(path, &map)?;
    }

    if let Some(path) = &args.fuse.report {
        let report = RunReport {
            input: args.fuse.input.clone(),
            output: args.fuse.output.clone(),
            mode: Some(mode),
            width: map.width(),
            height: map.height(),
            grad_thresh: Some(grad_thresh),
            cutoff: Some(cutoff),
            scales: engine.schedule().scales().to_vec(),
            edge_pixels: count_nonzero(&map),
            num_segments: map.num_segments(),
            elapsed_ms,
        };
        write_json(path, &report)?;
    }
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    ensure_file_exists(&args.input, "strength")?;
    let strength = ec_io::read_gray(&args.input)
        .with_context(|| format!("reading strength raster {}", args.input.display()))?;

    let start = Instant::now();
    let map = extract_segments(&strength.as_view(), args.cutoff).context("tracing segments")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    info!(
        cutoff = args.cutoff,
        segments = map.num_segments(),
        elapsed_ms,
        "extracted edge segments"
    );

    save_map(&args.output, &map)?;
    if let Some(path) = &args.segments {
        write_json(path, &map)?;
    }
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut engines: Vec<(DetectionMode, FusionEngine)> = Vec::new();
    let mut reports = Vec::with_capacity(args.inputs.len());

    for input in &args.inputs {
        let (raster, mode) = load_input(input, args.mode)?;
        let defaults = ContourParams::for_mode(mode);
        let grad_thresh = args.grad_thresh.unwrap_or(defaults.grad_thresh);
        let cutoff = args.cutoff.unwrap_or(defaults.cutoff);

        let slot = match engines.iter().position(|(m, _)| *m == mode) {
            Some(i) => i,
            None => {
                engines.push((mode, build_engine(mode, grad_thresh, args.parallel)?));
                engines.len() - 1
            }
        };
        let engine = &mut engines[slot].1;

        let start = Instant::now();
        let soft = engine
            .fuse(&raster.channels())
            .with_context(|| format!("fusing {}", input.display()))?;
        let bw = soft
            .threshold(cutoff)
            .with_context(|| format!("tracing {}", input.display()))?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

        let (soft_path, bw_path) = batch_outputs(&args.out_dir, input)?;
        save_map(&soft_path, &soft)?;
        save_map(&bw_path, &bw)?;
        info!(
            input = %input.display(),
            segments = bw.num_segments(),
            elapsed_ms,
            "processed image"
        );

        reports.push(RunReport {
            input: input.clone(),
            output: bw_path,
            mode: Some(mode),
            width: bw.width(),
            height: bw.height(),
            grad_thresh: Some(grad_thresh),
            cutoff: Some(cutoff),
            scales: engine.schedule().scales().to_vec(),
            edge_pixels: count_nonzero(&bw),
            num_segments: bw.num_segments(),
            elapsed_ms,
        });
    }

    info!(images = reports.len(), "batch finished");
    if let Some(path) = &args.report {
        write_json(path, &reports)?;
    }
    Ok(())
}

/// `<out_dir>/<stem>-soft.pgm` and `<out_dir>/<stem>-bw.pgm` for `input`.
fn batch_outputs(out_dir: &Path, input: &Path) -> Result<(PathBuf, PathBuf)> {
    let Some(stem) = input.file_stem().and_then(|s| s.to_str()) else {
        bail!("input has no usable file name: {}", input.display());
    };
    Ok((
        out_dir.join(format!("{stem}-soft.pgm")),
        out_dir.join(format!("{stem}-bw.pgm")),
    ))
}

fn load_input(path: &Path, mode: ModeArg) -> Result<(Raster, DetectionMode)> {
    ensure_file_exists(path, "input")?;
    let ctx = || format!("reading image {}", path.display());

    let raster = match mode {
        ModeArg::Auto => ec_io::read(path).with_context(ctx)?,
        ModeArg::Gray => Raster::Gray(ec_io::read_gray(path).with_context(ctx)?),
        ModeArg::Color => Raster::Rgb(ec_io::read_rgb(path).with_context(ctx)?),
    };
    let mode = if raster.is_color() {
        DetectionMode::DiZenzo
    } else {
        DetectionMode::Gray
    };
    info!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        ?mode,
        "loaded input"
    );
    Ok((raster, mode))
}

fn build_engine(mode: DetectionMode, grad_thresh: i32, parallel: bool) -> Result<FusionEngine> {
    let schedule = ScaleSchedule::for_mode(mode, grad_thresh)
        .with_context(|| format!("building {mode:?} schedule"))?;
    let engine = FusionEngine::new(schedule).context("preparing detector")?;
    Ok(engine.with_options(FusionOptions { parallel }))
}

fn save_map(path: &Path, map: &EdgeMap) -> Result<()> {
    ec_io::save_edge_map(path, map)
        .with_context(|| format!("writing edge raster {}", path.display()))
}

fn count_nonzero(map: &EdgeMap) -> usize {
    let img = map.edge_image();
    (0..img.height())
        .map(|y| img.row(y).iter().filter(|&&v| v != 0).count())
        .sum()
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
