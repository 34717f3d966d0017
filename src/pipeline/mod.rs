//! Pipeline stages for PDF-to-JPEG conversion.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ archive
//! (checks)  (pdfium)   (jpeg)     (zip)
//! ```
//!
//! 1. [`input`]  filename/extension/emptiness checks on the upload
//! 2. [`render`]  rasterise every page; runs in `spawn_blocking`
//! 3. [`encode`]  JPEG-encode each page at the requested quality
//! 4. [`archive`]  deflated ZIP with `{stem}_{page:03}.jpg` entries

pub mod archive;
pub mod encode;
pub mod input;
pub mod render;
