//! Upload validation: turn a client-supplied filename and body into an
//! [`Upload`] the rest of the pipeline can trust.
//!
//! Checks run in a fixed order and the first failure wins:
//! filename present → `.pdf` extension → (parameters, checked by the caller)
//! → non-empty body. Content is not inspected here; deciding whether the
//! bytes are a readable PDF belongs to the render stage.

use crate::error::Pdf2JpgError;
use tracing::debug;

/// Extension accepted on upload filenames, compared case-insensitively.
pub const PDF_EXTENSION: &str = ".pdf";

/// A validated upload: non-empty `.pdf` filename and non-empty content.
#[derive(Debug, Clone)]
pub struct Upload {
    filename: String,
    data: Vec<u8>,
}

impl Upload {
    /// Validate filename and content in one go.
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Result<Self, Pdf2JpgError> {
        let filename = filename.into();
        check_filename(Some(&filename))?;
        check_not_empty(&data)?;
        debug!("Accepted upload '{}' ({} bytes)", filename, data.len());
        Ok(Self { filename, data })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The filename with directories and its final extension removed.
    pub fn stem(&self) -> &str {
        file_stem(&self.filename)
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Steps 1 and 2: a filename must be present and end in `.pdf`.
pub fn check_filename(filename: Option<&str>) -> Result<&str, Pdf2JpgError> {
    let name = match filename {
        Some(n) if !n.is_empty() => n,
        _ => return Err(Pdf2JpgError::MissingFilename),
    };
    if !name.to_lowercase().ends_with(PDF_EXTENSION) {
        return Err(Pdf2JpgError::UnsupportedFileType {
            filename: name.to_string(),
        });
    }
    Ok(name)
}

/// Step 4: zero-length uploads are rejected regardless of filename.
pub fn check_not_empty(data: &[u8]) -> Result<(), Pdf2JpgError> {
    if data.is_empty() {
        Err(Pdf2JpgError::EmptyFile)
    } else {
        Ok(())
    }
}

/// Final path component without its last extension.
///
/// Both `/` and `\` count as separators since some clients send full
/// Windows paths. A leading dot alone is not an extension, so `.pdf`
/// stays `.pdf`.
pub fn file_stem(filename: &str) -> &str {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
