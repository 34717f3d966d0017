//! CLI binary for pdf2jpg.
//!
//! `pdf2jpg serve` runs the web service; `pdf2jpg convert` does the same
//! conversion on a local file. Both make sure a PDFium library is available
//! first, downloading it on the very first run.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2jpg::{
    convert_file, serve, ConversionParams, ConversionStats, PdfiumRenderer, ServerConfig,
};
use pdfium_auto::LibraryLocator;
use serde::Serialize;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web service on port 8000, serving ./static
  pdf2jpg serve

  # Custom port and asset directory
  pdf2jpg serve --port 9000 --static-dir /srv/pdf2jpg/static

  # Convert a local file (writes report_images.zip next to it)
  pdf2jpg convert report.pdf

  # Higher resolution, smaller files
  pdf2jpg convert --dpi 300 --quality 70 report.pdf -o pages.zip

  # Machine-readable summary on stdout
  pdf2jpg convert --json report.pdf

HTTP API:
  POST /api/convert   multipart: file (PDF), dpi (72-600, default 150),
                      quality (1-100, default 85) → application/zip
  GET  /api/health    {"status": "ok"}
  GET  /              static/index.html
  GET  /static/*      files under --static-dir

ENVIRONMENT VARIABLES:
  PDF2JPG_HOST, PDF2JPG_PORT, PDF2JPG_STATIC_DIR, PDF2JPG_MAX_UPLOAD_MB
  PDF2JPG_DPI, PDF2JPG_QUALITY
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, overrides --verbose / --quiet
"#;

/// Convert PDF documents into ZIP archives of per-page JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2jpg",
    version,
    about = "Convert PDF documents into ZIP archives of per-page JPEG images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to an existing libpdfium; skips lookup and download.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2JPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2JPG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Convert a local PDF file.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long, env = "PDF2JPG_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// TCP port.
    #[arg(short, long, env = "PDF2JPG_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory with index.html and static assets.
    #[arg(long, env = "PDF2JPG_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "PDF2JPG_MAX_UPLOAD_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_upload_mb: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF file to convert.
    input: PathBuf,

    /// Write the archive here instead of `{stem}_images.zip` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2JPG_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDF2JPG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,

    /// Print a JSON summary (output path, parameters, stats) to stdout.
    #[arg(long)]
    json: bool,
}

/// `convert --json` output.
#[derive(Serialize)]
struct ConvertReport<'a> {
    output: &'a Path,
    params: ConversionParams,
    stats: &'a ConversionStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Ensure PDFium engine is available ───────────────────────────────
    let lib_path = ensure_pdfium(cli.pdfium_lib.clone(), cli.quiet)?;
    debug!("Using PDFium at {}", lib_path.display());
    let renderer = Arc::new(PdfiumRenderer::new(&lib_path));

    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig::builder()
                .host(args.host)
                .port(args.port)
                .static_dir(args.static_dir)
                .max_upload_bytes((args.max_upload_mb * 1024 * 1024) as usize)
                .build()
                .context("Invalid configuration")?;

            serve(config, renderer).await.context("Server error")?;
        }
        Command::Convert(args) => {
            let params =
                ConversionParams::new(args.dpi, args.quality).context("Invalid parameters")?;
            let (path, stats) = convert_file(&args.input, args.output.as_deref(), params, renderer)
                .await
                .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

            if args.json {
                let report = ConvertReport {
                    output: &path,
                    params,
                    stats: &stats,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if !cli.quiet {
                eprintln!(
                    "{} {} pages  →  {}",
                    green("✔"),
                    bold(&stats.page_count.to_string()),
                    bold(&path.display().to_string()),
                );
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "{} bytes, render {}ms, package {}ms",
                        stats.archive_bytes, stats.render_duration_ms, stats.package_duration_ms
                    )),
                );
            }
        }
    }

    Ok(())
}

/// Locate libpdfium, downloading it (with a progress bar unless quiet) on
/// first use.
fn ensure_pdfium(explicit: Option<PathBuf>, quiet: bool) -> Result<PathBuf> {
    let mut locator = LibraryLocator::from_env();
    if let Some(p) = explicit {
        locator = locator.with_explicit_path(p);
    }

    if let Some(path) = locator.cached() {
        return Ok(path);
    }

    if quiet {
        return tokio::task::block_in_place(|| locator.ensure(None))
            .context("Failed to download PDFium engine");
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix("PDF engine");
    bar.enable_steady_tick(Duration::from_millis(80));

    // block_in_place keeps the borrowed callback valid without a 'static bound.
    let path = tokio::task::block_in_place(|| {
        locator.ensure(Some(&|downloaded: u64, total: Option<u64>| {
            if let Some(t) = total {
                if bar.length() != Some(t) {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    bar.finish_with_message("ready ✓");
    Ok(path)
}
