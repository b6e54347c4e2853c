//! The `archivist run` command: archive every image under a scan root.

use std::path::PathBuf;

use archivist_core::{
    Archiver, BatchRoots, BatchSummary, Config, FileDiscovery, PreflightError, StopSignal,
};
use clap::Args;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory to scan for source images
    #[arg(required = true)]
    pub scan_root: PathBuf,

    /// Where processed originals are moved (default: <SCAN_ROOT>_review)
    #[arg(short, long)]
    pub review: Option<PathBuf>,

    /// Number of parallel workers (overrides config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Encoder quality, 1-100 (overrides config)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Encoder compression effort, 0-10 (overrides config)
    #[arg(long)]
    pub compression: Option<u8>,
}

/// Execute the run command with the already-loaded config.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args)?;

    let review = args.review.clone().or_else(|| config.review_dir());
    let roots = BatchRoots::resolve(&args.scan_root, review.as_deref()).map_err(|e| match e {
        PreflightError::OverlappingRoots { .. } => anyhow::anyhow!(
            "{e}\n\n  Hint: Pick a review directory outside the scan root with --review."
        ),
        other => anyhow::anyhow!("{other}\n\n  Hint: Check the path and try again."),
    })?;

    let archiver = Archiver::new(config, roots).map_err(|e| {
        anyhow::anyhow!("{e}\n\n  Hint: Run `archivist check` to see which tool is missing.")
    })?;

    tracing::info!("Scanning {:?}", archiver.roots().scan);
    let files = archiver.discover();
    if files.is_empty() {
        tracing::warn!(
            "No {} files found under {:?}",
            archiver.config().processing.extensions.join("/"),
            archiver.roots().scan
        );
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s); originals will move to {:?}",
        files.len(),
        archiver.roots().review
    );

    let total_bytes = FileDiscovery::total_size(&files);
    let stop = StopSignal::new();
    spawn_interrupt_handler(stop.clone());

    let progress = create_progress_bar(files.len() as u64);
    let summary = archiver
        .run(files, &stop, |report, done| {
            progress.set_position(done.completed as u64);
            if let Some(name) = report.path.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
        })
        .await?;
    progress.finish_and_clear();

    print_summary(&summary, total_bytes);
    Ok(())
}

/// Apply command-line overrides and re-validate.
fn apply_overrides(mut config: Config, args: &RunArgs) -> anyhow::Result<Config> {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(quality) = args.quality {
        config.encoder.quality = quality;
    }
    if let Some(compression) = args.compression {
        config.encoder.compression = compression;
    }

    config.validate()?;
    Ok(config)
}

/// What a Ctrl-C means at this point in the run.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Stop dispatching and let in-flight files finish
    Drain,
    /// Already draining; leave now
    Exit,
}

fn on_interrupt(stop: &StopSignal) -> Interrupt {
    if stop.is_stopped() {
        Interrupt::Exit
    } else {
        stop.stop();
        Interrupt::Drain
    }
}

/// First Ctrl-C drains, the second exits immediately.
fn spawn_interrupt_handler(stop: StopSignal) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&stop) {
                Interrupt::Drain => tracing::warn!(
                    "Interrupted; finishing in-flight files, no new files will start \
                     (press Ctrl-C again to exit now)"
                ),
                Interrupt::Exit => {
                    eprintln!("\nInterrupted again; exiting without waiting for in-flight files");
                    std::process::exit(130);
                }
            }
        }
    });
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    match ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Using default progress style: {e}"),
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(summary: &BatchSummary, total_bytes: u64) {
    let secs = summary.elapsed.as_secs_f64();
    let (rate, throughput) = if secs > 0.0 {
        (
            summary.processed() as f64 / secs,
            total_bytes as f64 / 1_000_000.0 / secs,
        )
    } else {
        (0.0, 0.0)
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.conversion_failed > 0 {
        eprintln!("    Not converted:{:>8}", summary.conversion_failed);
    }
    if summary.errored > 0 {
        eprintln!("    Errors:       {:>8}", summary.errored);
    }
    if summary.not_started > 0 {
        eprintln!("    Not started:  {:>8}", summary.not_started);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Processed:    {:>8}", summary.processed());
    eprintln!("    Failed:       {:>8}", summary.failed());
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}
