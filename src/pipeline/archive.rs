//! Packaging: JPEG pages → an in-memory ZIP, plus the names the client sees.
//!
//! Entry names are `{stem}_{page:03}.jpg`, pages counted from 1. The archive
//! itself is offered as `{stem}_images.zip` through an RFC 5987
//! `filename*` parameter so non-ASCII stems survive the trip through an
//! HTTP header.

use crate::error::Pdf2JpgError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bytes left unescaped in the disposition filename: RFC 3986 unreserved.
const FILENAME_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// ZIP entry name for a 1-indexed page.
pub fn entry_name(stem: &str, page: usize) -> String {
    format!("{stem}_{page:03}.jpg")
}

/// Suggested download name for the whole archive.
pub fn archive_name(stem: &str) -> String {
    format!("{stem}_images.zip")
}

/// `Content-Disposition` value advertising `{stem}_images.zip`.
pub fn content_disposition(stem: &str) -> String {
    let name = archive_name(stem);
    let encoded = utf8_percent_encode(&name, FILENAME_ESCAPE);
    format!("attachment; filename*=UTF-8''{encoded}")
}

/// Write one deflated entry per page, in the order given.
pub fn build_archive<I>(stem: &str, pages: I) -> Result<Vec<u8>, Pdf2JpgError>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (idx, jpeg) in pages.into_iter().enumerate() {
        let name = entry_name(stem, idx + 1);
        zip.start_file(name.as_str(), options)
            .map_err(|e| Pdf2JpgError::ArchiveFailed(format!("{name}: {e}")))?;
        zip.write_all(&jpeg)
            .map_err(|e| Pdf2JpgError::ArchiveFailed(format!("{name}: {e}")))?;
        debug!("Archived {} ({} bytes)", name, jpeg.len());
    }

    let cursor = zip
        .finish()
        .map_err(|e| Pdf2JpgError::ArchiveFailed(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn entry_names_are_zero_padded_and_one_indexed() {
        assert_eq!(entry_name("report", 1), "report_001.jpg");
        assert_eq!(entry_name("report", 42), "report_042.jpg");
        assert_eq!(entry_name("report", 1234), "report_1234.jpg");
    }

    #[test]
    fn ascii_disposition() {
        assert_eq!(
            content_disposition("report"),
            "attachment; filename*=UTF-8''report_images.zip"
        );
    }

    #[test]
    fn spaces_and_reserved_bytes_are_escaped() {
        assert_eq!(
            content_disposition("Q3 report;v2"),
            "attachment; filename*=UTF-8''Q3%20report%3Bv2_images.zip"
        );
    }

    #[test]
    fn non_ascii_disposition_round_trips() {
        let stem = "會議記錄";
        let header = content_disposition(stem);
        assert!(header.is_ascii(), "header must be plain ASCII: {header}");

        let encoded = header.split("UTF-8''").nth(1).unwrap();
        let decoded = percent_decode_str(encoded).decode_utf8().unwrap();
        assert_eq!(decoded, "會議記錄_images.zip");
    }

    #[test]
    fn archive_holds_pages_in_order() {
        let pages = vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()];
        let bytes = build_archive("report", pages).unwrap();

        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 3);
        for (i, expected) in ["one", "two", "three"].iter().enumerate() {
            let mut entry = zip.by_index(i).unwrap();
            assert_eq!(entry.name(), entry_name("report", i + 1));
            assert_eq!(entry.compression(), CompressionMethod::Deflated);
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            assert_eq!(&body, expected);
        }
    }

    #[test]
    fn empty_page_list_gives_empty_archive() {
        let bytes = build_archive("x", Vec::<Vec<u8>>::new()).unwrap();
        assert_eq!(ZipArchive::new(Cursor::new(bytes)).unwrap().len(), 0);
    }
}
