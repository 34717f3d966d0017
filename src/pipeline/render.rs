//! PDF rasterisation: document bytes → one `DynamicImage` per page.
//!
//! The engine sits behind [`PageRenderer`] so the HTTP layer and the
//! pipeline never name PDFium directly. [`PdfiumRenderer`] is the production
//! implementation; tests plug in deterministic fakes.
//!
//! Rendering is CPU-bound and PDFium is not async-aware, so
//! [`render_pages`] always runs the renderer on `spawn_blocking`.

use crate::error::{Pdf2JpgError, RenderError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Leading bytes searched for the `%PDF-` marker.
///
/// Some producers prepend junk before the header; readers conventionally
/// tolerate up to 1 KiB of it.
pub const HEADER_SEARCH_WINDOW: usize = 1024;

const PDF_MARKER: &[u8] = b"%PDF-";

/// The rendering collaborator: rasterise every page of a document.
///
/// Implementations return pages in document order and must be usable from
/// several blocking threads at once.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, RenderError>;
}

/// [`PageRenderer`] backed by PDFium.
///
/// Each call binds the library afresh, the same way every conversion opens
/// its own document. No PDFium state outlives a request.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Use the PDFium shared library at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(path.into()),
        }
    }

    /// Use whatever PDFium the dynamic loader finds on the system path.
    pub fn system() -> Self {
        Self { library: None }
    }

    fn bind(&self) -> Result<Pdfium, RenderError> {
        match &self.library {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path)
                .map_err(|e| RenderError::Failed(e.to_string())),
            None => Pdfium::bind_to_system_library()
                .map(Pdfium::new)
                .map_err(|e| RenderError::Failed(format!("Failed to bind system PDFium: {e}"))),
        }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, RenderError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| classify_load_error(format!("{:?}", e)))?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
        let mut images = Vec::with_capacity(pages.len() as usize);

        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RenderError::Failed(format!("page {}: {:?}", idx + 1, e)))?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// Sort a PDFium open failure into the three render outcomes.
///
/// PDFium reports a structural problem as `FormatError`; an unreadable or
/// unrecognisable file as `FileError` / `Unknown`. Password and security
/// errors, and anything unexpected, stay generic failures.
pub fn classify_load_error(detail: String) -> RenderError {
    if detail.contains("FormatError") {
        RenderError::Syntax(detail)
    } else if detail.contains("FileError") || detail.contains("Unknown") {
        RenderError::PageCount(detail)
    } else {
        RenderError::Failed(detail)
    }
}

/// `true` when a `%PDF-` marker appears within the leading
/// [`HEADER_SEARCH_WINDOW`] bytes.
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(PDF_MARKER.len()).any(|w| w == PDF_MARKER)
}

/// Rasterise every page of `pdf` at `dpi`.
///
/// A document without a PDF header never reaches the renderer: its page
/// count cannot be read. A document that renders to nothing is rejected
/// with [`Pdf2JpgError::NoPages`].
pub async fn render_pages(
    renderer: Arc<dyn PageRenderer>,
    pdf: Vec<u8>,
    dpi: u32,
) -> Result<Vec<DynamicImage>, Pdf2JpgError> {
    if !has_pdf_header(&pdf) {
        return Err(Pdf2JpgError::PageCountUnavailable {
            detail: format!("no PDF header in the first {HEADER_SEARCH_WINDOW} bytes"),
        });
    }

    let images = tokio::task::spawn_blocking(move || renderer.render(&pdf, dpi))
        .await
        .map_err(|e| Pdf2JpgError::Internal(format!("Render task panicked: {}", e)))??;

    if images.is_empty() {
        return Err(Pdf2JpgError::NoPages);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct Fixed(Result<usize, RenderError>);

    impl PageRenderer for Fixed {
        fn render(&self, _pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, RenderError> {
            let n = self.0.clone()?;
            Ok((0..n)
                .map(|_| {
                    let side = dpi / 72;
                    DynamicImage::ImageRgb8(RgbImage::from_pixel(side, side, Rgb([255, 255, 255])))
                })
                .collect())
        }
    }

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec()
    }

    #[test]
    fn header_found_after_leading_junk() {
        let mut data = vec![b' '; 100];
        data.extend_from_slice(b"%PDF-1.4");
        assert!(has_pdf_header(&data));
    }

    #[test]
    fn header_outside_window_is_ignored() {
        let mut data = vec![0u8; HEADER_SEARCH_WINDOW];
        data.extend_from_slice(b"%PDF-1.4");
        assert!(!has_pdf_header(&data));
        assert!(!has_pdf_header(b"%PD"));
        assert!(!has_pdf_header(b""));
    }

    #[test]
    fn load_errors_are_classified() {
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(FormatError)".into()),
            RenderError::Syntax(_)
        ));
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(FileError)".into()),
            RenderError::PageCount(_)
        ));
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(PasswordError)".into()),
            RenderError::Failed(_)
        ));
    }

    #[tokio::test]
    async fn headerless_bytes_never_reach_renderer() {
        let renderer: Arc<dyn PageRenderer> = Arc::new(Fixed(Ok(3)));
        let err = render_pages(renderer, b"not a pdf".to_vec(), 150).await.unwrap_err();
        assert!(matches!(err, Pdf2JpgError::PageCountUnavailable { .. }));
    }

    #[tokio::test]
    async fn zero_pages_is_an_error() {
        let renderer: Arc<dyn PageRenderer> = Arc::new(Fixed(Ok(0)));
        let err = render_pages(renderer, pdf_bytes(), 150).await.unwrap_err();
        assert!(matches!(err, Pdf2JpgError::NoPages));
    }

    #[tokio::test]
    async fn renderer_errors_are_mapped() {
        let renderer: Arc<dyn PageRenderer> =
            Arc::new(Fixed(Err(RenderError::Syntax("bad xref".into()))));
        let err = render_pages(renderer, pdf_bytes(), 150).await.unwrap_err();
        assert!(matches!(err, Pdf2JpgError::MalformedDocument { .. }));
    }

    #[tokio::test]
    async fn pages_come_back_in_order_at_requested_dpi() {
        let renderer: Arc<dyn PageRenderer> = Arc::new(Fixed(Ok(2)));
        let pages = render_pages(renderer, pdf_bytes(), 144).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].width(), 2);
    }
}
