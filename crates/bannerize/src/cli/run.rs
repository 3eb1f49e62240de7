//! The `bannerize run` command: one batch over a source directory.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};

use bannerize_core::{Axis, Config, OutputFormat, OutputWriter, RunReport, Scheduler};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory of source images (non-recursive)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory for crops (defaults to the configured directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Which scale pass(es) to run
    #[arg(short, long, value_enum)]
    pub axis: Option<AxisArg>,

    /// Target width for the x-axis scale pass
    #[arg(long)]
    pub scale_width: Option<u32>,

    /// Target height for the y-axis scale pass
    #[arg(long)]
    pub scale_height: Option<u32>,

    /// Gaussian blur sigma
    #[arg(long)]
    pub blur_sigma: Option<f32>,

    /// Crop band size in pixels
    #[arg(long)]
    pub crop_size: Option<u32>,

    /// Number of parallel workers (0 = available CPU parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Write a manifest of saved crops to this file
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Manifest format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Load configuration from this file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Axis selector, mirroring the core `Axis` for clap.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AxisArg {
    /// Scale to a target width, crop top/vmiddle/bottom bands
    X,
    /// Scale to a target height, crop left/hmiddle/right bands
    Y,
    /// Both passes on the same source image
    Both,
}

impl From<AxisArg> for Axis {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Both => Axis::Both,
        }
    }
}

/// Manifest format, mirroring the core `OutputFormat` for clap.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    if !args.input.is_dir() {
        anyhow::bail!(
            "Input directory does not exist: {:?}\n\n  Hint: `run` takes a directory of images.",
            args.input
        );
    }

    let config = load_config(&args)?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir());
    let manifest_format = args
        .format
        .map(OutputFormat::from)
        .or_else(|| OutputFormat::parse(&config.output.format))
        .unwrap_or(OutputFormat::JsonLines);
    let pretty = config.output.pretty;

    tracing::info!(
        "Axis {} with {} worker(s); writing crops to {:?}",
        config.banner.axis,
        config.worker_count(),
        output_dir
    );

    // Progress over stage executions; the scheduler reports the exact
    // total once seeding is done.
    let progress = create_progress_bar();
    let progress_hook = {
        let progress = progress.clone();
        Arc::new(move |done: usize, total: usize| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        })
    };

    let scheduler = Scheduler::new(config)?.with_progress(progress_hook);
    let report = scheduler.run(&args.input, &output_dir).await?;

    progress.finish_and_clear();
    print_summary(&report);

    if let Some(manifest_path) = &args.manifest {
        write_manifest(&report, manifest_path, manifest_format, pretty)?;
        tracing::info!("Manifest written to {:?}", manifest_path);
    }

    if !report.fully_succeeded() {
        anyhow::bail!(
            "{} image(s) failed; see errors above",
            report.decode_failures + report.stage_failures.len()
        );
    }
    Ok(())
}

/// Load configuration and fold the CLI overrides into it.
fn load_config(args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(axis) = args.axis {
        config.banner.axis = axis.into();
    }
    if let Some(width) = args.scale_width {
        config.banner.scale_width = width;
    }
    if let Some(height) = args.scale_height {
        config.banner.scale_height = height;
    }
    if let Some(sigma) = args.blur_sigma {
        config.banner.blur_sigma = sigma;
    }
    if let Some(size) = args.crop_size {
        config.banner.crop_size = size;
    }
    if let Some(workers) = args.workers {
        config.processing.parallel_workers = workers;
    }

    if config.banner.scale_width == 0 || config.banner.scale_height == 0 {
        anyhow::bail!("Scale targets must be > 0");
    }
    if config.banner.crop_size == 0 {
        anyhow::bail!("Crop size must be > 0");
    }
    Ok(config)
}

/// Write the crop manifest, sorted by path for stable output.
fn write_manifest(
    report: &RunReport,
    path: &PathBuf,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let mut crops = report.crops.clone();
    crops.sort_by(|a, b| a.path.cmp(&b.path));

    let file = File::create(path)?;
    let mut writer = OutputWriter::new(BufWriter::new(file), format, pretty);
    writer.write_all(&crops)?;
    writer.flush()?;
    Ok(())
}

/// Create the progress bar for stage executions.
fn create_progress_bar() -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stage executions",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(report: &RunReport) {
    let elapsed = report.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        report.crops_written() as f64 / elapsed
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Images:         {:>8}", report.seeded);
    eprintln!("    Crops written:  {:>8}", report.crops_written());
    if report.decode_failures > 0 {
        eprintln!("    Decode errors:  {:>8}", report.decode_failures);
    }
    if !report.stage_failures.is_empty() {
        eprintln!("    Stage errors:   {:>8}", report.stage_failures.len());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Stage units:    {:>8}", report.executed_units);
    eprintln!("    Duration:       {:>7.1}s", elapsed);
    eprintln!("    Rate:           {:>7.1} crops/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> RunArgs {
        RunArgs {
            input: PathBuf::from("."),
            output: None,
            axis: None,
            scale_width: None,
            scale_height: None,
            blur_sigma: None,
            crop_size: None,
            workers: None,
            manifest: None,
            format: None,
            config: None,
        }
    }

    #[test]
    fn axis_arg_maps_to_core_axis() {
        assert_eq!(Axis::from(AxisArg::X), Axis::X);
        assert_eq!(Axis::from(AxisArg::Y), Axis::Y);
        assert_eq!(Axis::from(AxisArg::Both), Axis::Both);
    }

    #[test]
    fn overrides_are_applied() {
        let mut args = base_args();
        args.axis = Some(AxisArg::Both);
        args.crop_size = Some(120);
        args.workers = Some(2);

        let config = load_config(&args).unwrap();
        assert_eq!(config.banner.axis, Axis::Both);
        assert_eq!(config.banner.crop_size, 120);
        assert_eq!(config.processing.parallel_workers, 2);
    }

    #[test]
    fn zero_crop_size_is_rejected() {
        let mut args = base_args();
        args.crop_size = Some(0);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn manifest_is_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.jsonl");

        let report = RunReport {
            crops: vec![
                bannerize_core::SavedCrop {
                    source: "b".into(),
                    path: PathBuf::from("out/b-top.png"),
                    width: 10,
                    height: 5,
                },
                bannerize_core::SavedCrop {
                    source: "a".into(),
                    path: PathBuf::from("out/a-top.png"),
                    width: 10,
                    height: 5,
                },
            ],
            ..RunReport::default()
        };

        write_manifest(&report, &path, OutputFormat::JsonLines, false).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("a-top.png"));
        assert!(lines[1].contains("b-top.png"));
    }
}
