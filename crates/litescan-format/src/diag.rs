//! Recoverable-anomaly reporting.
//!
//! Decoding a damaged image should degrade, not abort. Anything worth
//! telling the caller about that does not stop the load is recorded as a
//! [`Diagnostic`] and mirrored as a `tracing` warning, so callers get the
//! full picture whether or not they installed a subscriber.

use tracing::warn;

/// One recoverable anomaly observed while decoding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// Page number the anomaly was observed on, if page-scoped.
    pub page: Option<u32>,
    /// Byte offset within that page (or the file, for file-scoped entries).
    pub offset: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// A page-scoped diagnostic.
    pub fn on_page(page: u32, offset: usize, message: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            offset: Some(offset),
            message: message.into(),
        }
    }

    /// A file-scoped diagnostic.
    pub fn on_file(message: impl Into<String>) -> Self {
        Self {
            page: None,
            offset: None,
            message: message.into(),
        }
    }

    /// Log this diagnostic and append it to the sink.
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        warn!(page = ?self.page, offset = ?self.offset, "{}", self.message);
        sink.push(self);
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.page, self.offset) {
            (Some(page), Some(offset)) => {
                write!(f, "page {page} offset {offset}: {}", self.message)
            }
            (Some(page), None) => write!(f, "page {page}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}
