//! `recording-editor` command-line front end.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG` overrides the `info` default).
//! 2. Parse the command line.
//! 3. Load [`EditorConfig`] from disk (defaults on first run).
//! 4. Create the tokio runtime, the [`WavCodec`] and the shared
//!    [`AnalysisCache`].
//! 5. Run the requested subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recording_editor::{
    audio::{AudioCodec, WavCodec},
    cache::AnalysisCache,
    config::EditorConfig,
    edit::{EditResult, EditSession},
    silence::{total_silence, SilenceDetector},
    waveform::level_points_per_second,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "recording-editor")]
#[command(about = "Waveforms, silence detection and lossless edits for WAV recordings")]
#[command(version)]
struct Cli {
    /// Directory for edited files (overrides `editing.output_dir`)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show waveform points for a zoom level or a time window
    Waveform {
        file: PathBuf,

        /// Zoom factor (1.0 = whole file fits the view)
        #[arg(long, default_value = "1.0")]
        zoom: f64,

        /// View width in points
        #[arg(long, default_value = "300")]
        width: f64,

        /// Window start in seconds (with --end and --points)
        #[arg(long, requires_all = ["end", "points"])]
        start: Option<f64>,

        /// Window end in seconds
        #[arg(long)]
        end: Option<f64>,

        /// Number of points for the window
        #[arg(long)]
        points: Option<usize>,

        /// Print points as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect silent parts
    Silence {
        file: PathBuf,

        /// Threshold in dBFS (defaults to settings)
        #[arg(long, allow_hyphen_values = true)]
        threshold_db: Option<f64>,

        /// Minimum silence length in seconds (defaults to settings)
        #[arg(long)]
        min_duration: Option<f64>,

        /// Use the editor's sharper highlight thresholds
        #[arg(long)]
        highlight: bool,

        /// Print intervals as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep only START..END seconds
    Trim {
        file: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
    },

    /// Remove START..END seconds
    Cut {
        file: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
    },

    /// Detect and remove every silent part in one pass
    StripSilence {
        file: PathBuf,

        /// Threshold in dBFS (defaults to the highlight threshold)
        #[arg(long, allow_hyphen_values = true)]
        threshold_db: Option<f64>,

        /// Minimum silence length in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Seconds kept on each side of a silence
        #[arg(long)]
        padding: Option<f64>,
    },
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

struct Shared {
    config: EditorConfig,
    codec: Arc<dyn AudioCodec>,
    cache: Arc<AnalysisCache>,
}

async fn run(cli: Cli, ctx: Shared) -> Result<()> {
    match cli.command {
        Commands::Waveform {
            file,
            zoom,
            width,
            start,
            end,
            points,
            json,
        } => {
            let pyramid = ctx.cache.get_pyramid(&file).await?;
            let (label, values) = match (start, end, points) {
                (Some(s), Some(e), Some(n)) => (format!("{s:.3}s..{e:.3}s"), pyramid.slice(s, e, n)),
                _ => {
                    let (level, values) = pyramid.level_for_zoom_with(
                        zoom,
                        width,
                        ctx.config.waveform.ideal_samples_per_point,
                    );
                    (
                        format!("level {level} ({} pts/s)", level_points_per_second(level)),
                        values.to_vec(),
                    )
                }
            };

            if json {
                println!("{}", serde_json::to_string(&values)?);
            } else {
                println!(
                    "{}: {:.3}s, {} points, {label}",
                    file.display(),
                    pyramid.duration_seconds(),
                    values.len()
                );
            }
        }

        Commands::Silence {
            file,
            threshold_db,
            min_duration,
            highlight,
            json,
        } => {
            let detector = detector_for(&ctx.config, highlight, threshold_db, min_duration);
            let found = ctx.cache.get_silence(&file, detector).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(found.as_slice())?);
            } else {
                for interval in found.iter() {
                    println!(
                        "{:>9.3}  {:>9.3}  ({:.3}s)",
                        interval.start,
                        interval.end,
                        interval.duration()
                    );
                }
                println!(
                    "{} silent part(s), {:.3}s total",
                    found.len(),
                    total_silence(&found)
                );
            }
        }

        Commands::Trim { file, start, end } => {
            let mut session = open_session(&ctx, &file).await?;
            session.set_selection(start, end);
            let result = session.trim_selection().await;
            finish(&mut session, &result)?;
        }

        Commands::Cut { file, start, end } => {
            let mut session = open_session(&ctx, &file).await?;
            session.set_selection(start, end);
            let result = session.cut_selection().await;
            finish(&mut session, &result)?;
        }

        Commands::StripSilence {
            file,
            threshold_db,
            min_duration,
            padding,
        } => {
            let mut config = ctx.config.clone();
            if let Some(padding) = padding {
                config.editing.silence_padding_secs = padding;
            }
            let ctx = Shared { config, ..ctx };

            let mut session = open_session(&ctx, &file)
                .await?
                .with_highlight_detector(detector_for(&ctx.config, true, threshold_db, min_duration));
            let selection = session.highlight_silence().await?;
            log::info!(
                "{} silent part(s), {:.3}s",
                selection.selected_count(),
                selection.selected_duration()
            );
            let result = session.remove_silence(&selection.selected_ranges()).await;
            finish(&mut session, &result)?;
        }
    }
    Ok(())
}

fn detector_for(
    config: &EditorConfig,
    highlight: bool,
    threshold_db: Option<f64>,
    min_duration: Option<f64>,
) -> SilenceDetector {
    let base = if highlight {
        SilenceDetector::highlight_from_config(&config.silence)
    } else {
        SilenceDetector::from_config(&config.silence)
    };
    SilenceDetector::new(
        threshold_db.unwrap_or(base.threshold_db()),
        min_duration.unwrap_or(base.min_duration_secs()),
    )
}

async fn open_session(ctx: &Shared, file: &Path) -> Result<EditSession> {
    let pyramid = ctx
        .cache
        .get_pyramid(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    Ok(EditSession::from_config(
        file,
        pyramid.duration_seconds(),
        Vec::new(),
        Arc::clone(&ctx.codec),
        Arc::clone(&ctx.cache),
        &ctx.config,
    ))
}

fn finish(session: &mut EditSession, result: &EditResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        bail!(
            "edit failed, nothing changed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    let committed = session.commit();
    log::info!(
        "wrote {} ({:.3}s)",
        committed.file.display(),
        committed.duration
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Command line
    let mut cli = Cli::parse();

    // 3. Configuration
    let loaded = match &cli.config {
        Some(path) => EditorConfig::load_from(path),
        None => EditorConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        EditorConfig::default()
    });
    if let Some(dir) = cli.output_dir.take() {
        config.editing.output_dir = Some(dir);
    }

    // 4. Runtime and shared components
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let output_dir = config.editing.resolved_output_dir();
    log::debug!("edited files go to {}", output_dir.display());
    let codec: Arc<dyn AudioCodec> = Arc::new(WavCodec::new(output_dir));
    let cache = Arc::new(AnalysisCache::new(Arc::clone(&codec)));

    // 5. Subcommand
    rt.block_on(run(
        cli,
        Shared {
            config,
            codec,
            cache,
        },
    ))
}
