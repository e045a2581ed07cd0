//! MIME type detection from file contents.

use crate::FileDescriptor;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the head of a file for content matching
const HEADER_LEN: u64 = 8192;

/// Detects the MIME type of a file on disk.
///
/// `Ok(None)` means the type could not be determined; `Err` means the file
/// could not be read.
pub trait MimeDetector: fmt::Debug + Send + Sync {
    fn detect(&self, file: &FileDescriptor) -> io::Result<Option<String>>;
}

/// Identify binary content by its leading bytes.
///
/// Text is never matched against binary signatures, so a text file that
/// happens to start with `BM` or `ID3` stays unidentified here.
pub fn sniff(header: &[u8]) -> Option<&'static str> {
    if looks_like_text(header) {
        return None;
    }
    infer::get(header).map(|kind| kind.mime_type())
}

/// UTF-8 without control bytes other than common whitespace and escape.
/// A multi-byte character cut off at the end of the buffer is allowed.
pub fn looks_like_text(header: &[u8]) -> bool {
    if header.is_empty() {
        return false;
    }
    let valid = match std::str::from_utf8(header) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    };
    valid
        && !header
            .iter()
            .any(|&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c | 0x1b)) || b == 0x7f)
}

/// Content first, then the file name.
///
/// Binary content is identified with `infer`. Text content and
/// unrecognised binaries fall back to `mime_guess` on the client filename
/// and then the stored path; text with no telling name is `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureDetector;

impl SignatureDetector {
    fn read_header(path: &Path) -> io::Result<Vec<u8>> {
        let mut header = Vec::new();
        File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
        Ok(header)
    }

    fn guess(file: &FileDescriptor) -> Option<String> {
        let by_name: Option<mime::Mime> = mime_guess::from_path(&file.filename).first();
        by_name
            .or_else(|| mime_guess::from_path(&file.file).first())
            .map(|m| m.essence_str().to_string())
    }
}

impl MimeDetector for SignatureDetector {
    fn detect(&self, file: &FileDescriptor) -> io::Result<Option<String>> {
        let header = Self::read_header(&file.file)?;
        if let Some(mime) = sniff(&header) {
            tracing::trace!(mime, "detected type from file content");
            return Ok(Some(mime.to_string()));
        }

        let guessed = Self::guess(file)
            .or_else(|| looks_like_text(&header).then(|| mime::TEXT_PLAIN.to_string()));
        if let Some(mime) = &guessed {
            tracing::trace!(mime = %mime, "guessed type without a content signature");
        }
        Ok(guessed)
    }
}
