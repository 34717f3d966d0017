//! Conversion entry points.
//!
//! [`convert_upload`] runs the whole pipeline on an in-memory upload and is
//! what the HTTP handler calls. [`convert_file`] wraps it for local files and
//! writes the archive next to the input (or wherever the caller says).
//!
//! Either the complete archive is produced or an error is returned; no
//! partial archive ever leaves this module.

use crate::config::ConversionParams;
use crate::error::Pdf2JpgError;
use crate::pipeline::archive::{self, build_archive};
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::input::Upload;
use crate::pipeline::render::{render_pages, PageRenderer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Timing and size figures for one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub page_count: usize,
    pub archive_bytes: usize,
    pub render_duration_ms: u64,
    pub package_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A finished conversion: the ZIP bytes plus what is needed to name them.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Upload filename without directories or extension.
    pub stem: String,
    /// The ZIP archive, one JPEG entry per page.
    pub archive: Vec<u8>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Suggested download name, `{stem}_images.zip`.
    pub fn archive_name(&self) -> String {
        archive::archive_name(&self.stem)
    }

    /// RFC 5987 `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        archive::content_disposition(&self.stem)
    }
}

/// Render, encode and zip a validated upload.
///
/// # Errors
/// Client-side problems with the document (no header, malformed structure,
/// no pages) and server-side failures (engine, encoder, archive) are all
/// reported as [`Pdf2JpgError`]; see [`Pdf2JpgError::is_client_error`].
pub async fn convert_upload(
    upload: Upload,
    params: ConversionParams,
    renderer: Arc<dyn PageRenderer>,
) -> Result<ConversionOutput, Pdf2JpgError> {
    let total_start = Instant::now();
    let stem = upload.stem().to_string();
    info!(
        "Starting conversion: {} ({} bytes, dpi={}, quality={})",
        upload.filename(),
        upload.data().len(),
        params.dpi,
        params.quality
    );

    // ── Step 1: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let pages = render_pages(renderer, upload.into_data(), params.dpi).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let page_count = pages.len();
    info!("Rendered {} pages in {}ms", page_count, render_duration_ms);

    // ── Step 2: Encode + archive (CPU-bound, off the async workers) ──────
    let package_start = Instant::now();
    let quality = params.quality;
    let zip_stem = stem.clone();
    let archive = tokio::task::spawn_blocking(move || {
        let jpegs = pages
            .iter()
            .enumerate()
            .map(|(idx, img)| encode_jpeg(img, quality, idx + 1))
            .collect::<Result<Vec<_>, _>>()?;
        build_archive(&zip_stem, jpegs)
    })
    .await
    .map_err(|e| Pdf2JpgError::Internal(format!("Packaging task panicked: {}", e)))??;
    let package_duration_ms = package_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        page_count,
        archive_bytes: archive.len(),
        render_duration_ms,
        package_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} bytes, {}ms total",
        stats.page_count, stats.archive_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        stem,
        archive,
        stats,
    })
}

/// Convert a local PDF and write the archive to disk.
///
/// Without `output` the archive lands next to the input as
/// `{stem}_images.zip`. Uses atomic write (temp file + rename) so a failed
/// run never leaves a truncated archive behind.
pub async fn convert_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    params: ConversionParams,
    renderer: Arc<dyn PageRenderer>,
) -> Result<(PathBuf, ConversionStats), Pdf2JpgError> {
    let input = input.as_ref();
    let data = tokio::fs::read(input)
        .await
        .map_err(|e| Pdf2JpgError::InputReadFailed {
            path: input.to_path_buf(),
            source: e,
        })?;

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = Upload::new(filename, data)?;

    let out = convert_upload(upload, params, renderer).await?;

    let path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(out.archive_name()),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2JpgError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("zip.tmp");
    tokio::fs::write(&tmp_path, &out.archive)
        .await
        .map_err(|e| Pdf2JpgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| Pdf2JpgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok((path, out.stats))
}
