//! CLI binary for images2docx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the document.

use anyhow::{Context, Result};
use clap::Parser;
use images2docx::{
    convert_to_file, BatchProgressCallback, ConversionConfig, EmptyBatchPolicy, Footprint,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar at the bottom and one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_item_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, encoded_len: usize) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>7} bytes", encoded_len)),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            bold(name),
            red(error),
        ));
        self.bar.abandon();
    }

    fn on_batch_complete(&self, _total: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Three 4.5 cm × 6 cm photos per row → images.docx
  img2docx IMG_0001.HEIC IMG_0002.jpg IMG_0003.png

  # Four landscape tiles per row, written elsewhere
  img2docx --columns 4 --width 160 --height 120 -o sheet.docx *.jpg

  # Smaller file: cap at 600 px, quality 0.5
  img2docx --max-dimension 600 --quality 0.5 photos/*.jpg

  # Machine-readable summary
  img2docx --json *.png

SIZES:
  --width/--height are display pixels at 72 dpi: cm ÷ 2.54 × 72.
  4.5 cm → 128 px, 6 cm → 170 px (the defaults).

HEIC:
  Build with `--features heif` (needs libheif) to decode HEIC/HEIF. Without
  it, HEIC files are tried as ordinary images and fail if they really are HEIC.
"#;

/// Lay out image files as a uniform grid in a Word document.
#[derive(Parser, Debug)]
#[command(
    name = "img2docx",
    version,
    about = "Lay out image files as a uniform grid in a Word document",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files, placed in the grid in the order given. May be empty (an
    /// unmatched glob), which writes an empty document unless
    /// `--reject-empty` is set.
    inputs: Vec<PathBuf>,

    /// Output path. Default: the configured file name in the current directory.
    #[arg(short, long, env = "IMAGES2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// Display width of each image, in pixels.
    #[arg(long, env = "IMAGES2DOCX_WIDTH", default_value_t = 128,
          value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Display height of each image, in pixels.
    #[arg(long, env = "IMAGES2DOCX_HEIGHT", default_value_t = 170,
          value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Longest side kept before recompression.
    #[arg(long, env = "IMAGES2DOCX_MAX_DIMENSION", default_value_t = 800)]
    max_dimension: u32,

    /// JPEG quality factor (0.01–1.0).
    #[arg(long, env = "IMAGES2DOCX_QUALITY", default_value_t = 0.7)]
    quality: f32,

    /// Images per row.
    #[arg(short, long, env = "IMAGES2DOCX_COLUMNS", default_value_t = 3)]
    columns: usize,

    /// Fail instead of writing an empty document when no inputs are given.
    #[arg(long, env = "IMAGES2DOCX_REJECT_EMPTY")]
    reject_empty: bool,

    /// Print conversion statistics as JSON on stdout.
    #[arg(long, env = "IMAGES2DOCX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMAGES2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMAGES2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMAGES2DOCX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_file_name));

    let stats = convert_to_file(&cli.inputs, &output_path, &config)
        .await
        .with_context(|| format!("Failed to convert into {}", output_path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} images in {} rows  {}ms  →  {}",
            green("✔"),
            stats.images,
            stats.rows,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} input  /  {} document",
            dim(&format!("{} bytes", stats.input_bytes)),
            dim(&format!("{} bytes", stats.document_bytes)),
        );
        if stats.fallbacks > 0 {
            eprintln!(
                "   {} HEIC file(s) decoded as ordinary images",
                stats.fallbacks
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .footprint(Footprint::new(cli.width, cli.height))
        .max_dimension(cli.max_dimension)
        .quality(cli.quality)
        .columns(cli.columns)
        .empty_batch(if cli.reject_empty {
            EmptyBatchPolicy::Reject
        } else {
            EmptyBatchPolicy::EmptyDocument
        });

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
