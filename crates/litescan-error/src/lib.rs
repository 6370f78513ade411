//! Error types for the litescan SQLite image decoder.
//!
//! One enum covers every way a database image can fail to decode, from the
//! file header down to a single column value. Variants carry the page number
//! and byte offset where the failure was observed whenever those are known,
//! so a forensic caller can locate the damage in the raw image.

use thiserror::Error;

/// Primary error type for litescan operations.
///
/// Structural errors at the file level (`Io`, `BadHeader`) abort a load.
/// Page-scoped errors are normally contained by the loader and surfaced as
/// diagnostics instead; they appear here when a caller decodes a page or
/// record directly.
#[derive(Error, Debug)]
pub enum LitescanError {
    /// Reading the image file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The 100-byte file header is not a SQLite header.
    #[error("bad database header: {detail}")]
    BadHeader { detail: String },

    /// A page failed structural decoding.
    #[error("corrupt page {page} at offset {offset}: {detail}")]
    CorruptPage {
        page: u32,
        offset: usize,
        detail: String,
    },

    /// A varint ran past the end of its buffer. The offset is relative to
    /// the buffer being decoded; the page number is filled in by callers
    /// that know it (the record decoder sees only a payload slice).
    #[error("truncated varint{} at byte offset {offset}", page_suffix(.page))]
    TruncatedVarint { page: Option<u32>, offset: usize },

    /// A value's serial type promised more bytes than the buffer holds.
    #[error("not enough bytes for value: needed {needed}, have {have}")]
    NotEnoughBytes { needed: usize, have: usize },

    /// A record's decoded width disagrees with its payload length.
    #[error("record length mismatch: decoded {actual} bytes of a {expected}-byte payload")]
    RecordLengthMismatch { expected: usize, actual: usize },

    /// A cell's payload spills to overflow pages, which litescan does not
    /// follow.
    #[error("cell payload overflows page {page} (rowid {rowid}, {payload_size} bytes)")]
    OverflowUnsupported {
        page: u32,
        rowid: u64,
        payload_size: usize,
    },

    /// The `sqlite_master` table could not be interpreted.
    #[error("invalid schema catalog: {detail}")]
    CatalogInvalid { detail: String },
}

impl LitescanError {
    /// Create a `BadHeader` error.
    pub fn bad_header(detail: impl Into<String>) -> Self {
        Self::BadHeader {
            detail: detail.into(),
        }
    }

    /// Create a `CorruptPage` error.
    pub fn corrupt_page(page: u32, offset: usize, detail: impl Into<String>) -> Self {
        Self::CorruptPage {
            page,
            offset,
            detail: detail.into(),
        }
    }

    /// Create a `CatalogInvalid` error.
    pub fn catalog(detail: impl Into<String>) -> Self {
        Self::CatalogInvalid {
            detail: detail.into(),
        }
    }

    /// Whether the error is scoped to a single page and can be contained
    /// without abandoning the rest of the image.
    ///
    /// The loader consults this to decide between degrading a page into a
    /// placeholder plus a diagnostic and aborting the whole load.
    pub const fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Self::CorruptPage { .. }
                | Self::TruncatedVarint { .. }
                | Self::NotEnoughBytes { .. }
                | Self::RecordLengthMismatch { .. }
                | Self::OverflowUnsupported { .. }
        )
    }

    /// The page number the error was observed on, if known.
    ///
    /// Diagnostic reporting prefers this over the page the caller was
    /// working on, so damage deeper in a tree is attributed to the page
    /// that actually holds it.
    pub const fn page(&self) -> Option<u32> {
        match self {
            Self::CorruptPage { page, .. } | Self::OverflowUnsupported { page, .. } => Some(*page),
            Self::TruncatedVarint { page, .. } => *page,
            _ => None,
        }
    }
}

fn page_suffix(page: &Option<u32>) -> String {
    match page {
        Some(page) => format!(" on page {page}"),
        None => String::new(),
    }
}

/// Result type alias using `LitescanError`.
pub type Result<T> = std::result::Result<T, LitescanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_bad_header() {
        let err = LitescanError::bad_header("magic mismatch");
        assert_eq!(err.to_string(), "bad database header: magic mismatch");
    }

    #[test]
    fn display_corrupt_page() {
        let err = LitescanError::corrupt_page(7, 512, "cell pointer out of range");
        assert_eq!(
            err.to_string(),
            "corrupt page 7 at offset 512: cell pointer out of range"
        );
    }

    #[test]
    fn display_overflow() {
        let err = LitescanError::OverflowUnsupported {
            page: 3,
            rowid: 42,
            payload_size: 5000,
        };
        assert_eq!(
            err.to_string(),
            "cell payload overflows page 3 (rowid 42, 5000 bytes)"
        );
    }

    #[test]
    fn display_truncated_varint() {
        let err = LitescanError::TruncatedVarint {
            page: None,
            offset: 9,
        };
        assert_eq!(err.to_string(), "truncated varint at byte offset 9");

        let err = LitescanError::TruncatedVarint {
            page: Some(2),
            offset: 9,
        };
        assert_eq!(
            err.to_string(),
            "truncated varint on page 2 at byte offset 9"
        );
    }

    #[test]
    fn page_scoping() {
        assert!(
            LitescanError::TruncatedVarint {
                page: None,
                offset: 9
            }
            .is_page_scoped()
        );
        assert!(
            LitescanError::RecordLengthMismatch {
                expected: 10,
                actual: 8
            }
            .is_page_scoped()
        );
        assert!(!LitescanError::bad_header("x").is_page_scoped());
        assert!(!LitescanError::catalog("x").is_page_scoped());
    }

    #[test]
    fn page_accessor() {
        assert_eq!(
            LitescanError::corrupt_page(5, 0, "broken cell").page(),
            Some(5)
        );
        assert_eq!(
            LitescanError::TruncatedVarint {
                page: Some(7),
                offset: 3
            }
            .page(),
            Some(7)
        );
        assert_eq!(
            LitescanError::TruncatedVarint {
                page: None,
                offset: 3
            }
            .page(),
            None
        );
        assert_eq!(LitescanError::bad_header("x").page(), None);
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: LitescanError = io_err.into();
        assert!(matches!(err, LitescanError::Io(_)));
    }
}
