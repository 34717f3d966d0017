//! # pdf2jpg
//!
//! Upload a PDF, get back a ZIP with one JPEG per page.
//!
//! The heavy lifting (PDF parsing and rasterisation) is PDFium's job, reached
//! through `pdfium-render`. This crate validates the upload, runs the
//! renderer off the async workers, JPEG-encodes each page, zips the results
//! and maps every failure onto a 400 or a 500.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload
//!  │
//!  ├─ 1. Input    filename / extension / parameters / non-empty
//!  ├─ 2. Render   rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode   RGB → JPEG at the requested quality
//!  ├─ 4. Archive  deflated ZIP, `{stem}_{page:03}.jpg`
//!  └─ 5. Respond  application/zip + RFC 5987 Content-Disposition
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2jpg::{serve, PdfiumRenderer, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::builder().port(8000).build().unwrap();
//!     serve(config, Arc::new(PdfiumRenderer::system())).await
//! }
//! ```
//!
//! Converting without HTTP:
//!
//! ```rust,no_run
//! use pdf2jpg::{convert_file, ConversionParams, PdfiumRenderer};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = ConversionParams::new(200, 90)?;
//! let (zip_path, stats) =
//!     convert_file("report.pdf", None, params, Arc::new(PdfiumRenderer::system())).await?;
//! eprintln!("{} pages → {}", stats.page_count, zip_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Builds the `pdf2jpg` binary and its CLI-only dependencies |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionParams, ServerConfig, ServerConfigBuilder};
pub use convert::{convert_file, convert_upload, ConversionOutput, ConversionStats};
pub use error::{Pdf2JpgError, RenderError};
pub use pipeline::input::Upload;
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use server::{router, serve, AppState};
