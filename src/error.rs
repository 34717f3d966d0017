//! Error types for the pdf2jpg library.
//!
//! * [`Pdf2JpgError`]: a conversion cannot complete. Every variant maps to
//!   exactly one outcome for the caller: [`Pdf2JpgError::is_client_error`]
//!   separates "fix your request" (HTTP 4xx) from "the service failed"
//!   (HTTP 5xx). There is no partial success: either the whole archive is
//!   produced or one of these is returned.
//!
//! * [`RenderError`]: what the rendering collaborator reports. It is kept
//!   separate so alternative renderers (and test doubles) only have to pick
//!   one of three outcomes; the pipeline converts it into a
//!   [`Pdf2JpgError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2jpg library.
#[derive(Debug, Error)]
pub enum Pdf2JpgError {
    // ── Upload validation ────────────────────────────────────────────────
    /// The upload carried no filename (or no file part at all).
    #[error("no filename provided")]
    MissingFilename,

    /// The filename does not end in `.pdf`.
    #[error("only PDF files accepted")]
    UnsupportedFileType { filename: String },

    /// The request body could not be read.
    #[error("failed to read file: {0}")]
    ReadFailed(String),

    /// The upload is zero bytes long.
    #[error("file is empty")]
    EmptyFile,

    /// `dpi` or `quality` is missing its integer form or out of bounds.
    #[error("invalid parameter '{name}': expected an integer in {min}..={max}, got '{value}'")]
    InvalidParameter {
        name: &'static str,
        value: String,
        min: u32,
        max: u32,
    },

    // ── Rendering ────────────────────────────────────────────────────────
    /// The renderer could not determine how many pages the document has.
    #[error("unable to read PDF page count, the file may be corrupt")]
    PageCountUnavailable { detail: String },

    /// The renderer rejected the document structure.
    #[error("PDF format error")]
    MalformedDocument { detail: String },

    /// The document rendered to zero pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Any other renderer failure. The underlying reason is part of the message.
    #[error("PDF conversion failed: {0}")]
    RenderFailed(String),

    // ── Packaging / I/O ──────────────────────────────────────────────────
    /// A page could not be JPEG-encoded.
    #[error("JPEG encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The ZIP archive could not be written.
    #[error("failed to build archive: {0}")]
    ArchiveFailed(String),

    /// Input file for [`crate::convert::convert_file`] could not be read.
    #[error("failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output archive for [`crate::convert::convert_file`] could not be written.
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ───────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2JpgError {
    /// `true` when the caller's input is at fault (HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Pdf2JpgError::MissingFilename
                | Pdf2JpgError::UnsupportedFileType { .. }
                | Pdf2JpgError::ReadFailed(_)
                | Pdf2JpgError::EmptyFile
                | Pdf2JpgError::InvalidParameter { .. }
                | Pdf2JpgError::PageCountUnavailable { .. }
                | Pdf2JpgError::MalformedDocument { .. }
                | Pdf2JpgError::NoPages
        )
    }
}

/// Outcome of a failed render, as reported by a [`crate::pipeline::render::PageRenderer`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The document could not be opened far enough to count its pages.
    #[error("page count unavailable: {0}")]
    PageCount(String),

    /// The document structure is malformed.
    #[error("malformed document: {0}")]
    Syntax(String),

    /// Anything else: engine missing, encrypted input, page render failure.
    #[error("{0}")]
    Failed(String),
}

impl From<RenderError> for Pdf2JpgError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::PageCount(detail) => Pdf2JpgError::PageCountUnavailable { detail },
            RenderError::Syntax(detail) => Pdf2JpgError::MalformedDocument { detail },
            RenderError::Failed(reason) => Pdf2JpgError::RenderFailed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_message() {
        let e = Pdf2JpgError::UnsupportedFileType {
            filename: "notes.txt".into(),
        };
        assert_eq!(e.to_string(), "only PDF files accepted");
        assert!(e.is_client_error());
    }

    #[test]
    fn invalid_parameter_names_bounds() {
        let e = Pdf2JpgError::InvalidParameter {
            name: "dpi",
            value: "700".into(),
            min: 72,
            max: 600,
        };
        let msg = e.to_string();
        assert!(msg.contains("dpi"), "got: {msg}");
        assert!(msg.contains("72..=600"), "got: {msg}");
        assert!(msg.contains("700"), "got: {msg}");
    }

    #[test]
    fn render_failure_exposes_reason_and_is_server_side() {
        let reason = "PdfiumLibraryInternalError(PasswordError)";
        let e: Pdf2JpgError = RenderError::Failed(reason.into()).into();
        assert!(e.to_string().contains("PasswordError"));
        assert!(!e.is_client_error());
    }

    #[test]
    fn render_error_classes_map_to_client_errors() {
        let page_count: Pdf2JpgError = RenderError::PageCount("no header".into()).into();
        let syntax: Pdf2JpgError = RenderError::Syntax("FormatError".into()).into();
        assert!(matches!(page_count, Pdf2JpgError::PageCountUnavailable { .. }));
        assert!(matches!(syntax, Pdf2JpgError::MalformedDocument { .. }));
        assert!(page_count.is_client_error());
        assert!(syntax.is_client_error());
    }

    #[test]
    fn packaging_failures_are_server_side() {
        assert!(!Pdf2JpgError::ArchiveFailed("disk".into()).is_client_error());
        assert!(!Pdf2JpgError::Internal("panic".into()).is_client_error());
        assert!(!Pdf2JpgError::EncodeFailed {
            page: 1,
            detail: "x".into()
        }
        .is_client_error());
    }
}
