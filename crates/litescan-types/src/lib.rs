//! Core types and on-disk codecs for the litescan SQLite image decoder.
//!
//! This crate owns everything below the page level: the two varint flavors,
//! the serial-type table, typed column values, record decoding, and the
//! 100-byte database file header.

pub mod encoding;
pub mod record;
pub mod serial_type;
pub mod size_varint;
pub mod value;

pub use record::Record;
pub use value::{ColumnValue, ValueKind};

use std::fmt;
use std::num::NonZeroU32;

use litescan_error::{LitescanError, Result};

/// A page number in the database file.
///
/// Page numbers are 1-based; page 1 carries the file header and the root of
/// the schema catalog. Decoded structures refer to pages by number, and the
/// page vector on `Storage` is indexed by [`PageNumber::index`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// Page 1: the header page and catalog root.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a page number. Returns `None` for 0, which does not exist.
    #[inline]
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The raw 1-based page number.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The 0-based index of this page in a dense page vector.
    #[inline]
    pub const fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database page size in bytes: a power of two in `[512, 65536]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PageSize(u32);

impl PageSize {
    /// Minimum page size: 512 bytes.
    pub const MIN: Self = Self(512);

    /// Maximum page size: 65536 bytes.
    pub const MAX: Self = Self(65536);

    /// Create a page size, validating the power-of-two range.
    pub const fn new(size: u32) -> Option<Self> {
        if size < 512 || size > 65536 || !size.is_power_of_two() {
            None
        } else {
            Some(Self(size))
        }
    }

    /// Decode the 2-byte header field at offset 16, where the sentinel
    /// value 1 means 65536.
    pub const fn from_header_field(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self(65536)),
            n => Self::new(n as u32),
        }
    }

    /// The page size in bytes.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The page size as a `usize`.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database text encoding, from header offset 56.
///
/// litescan treats text values as opaque bytes either way; the encoding is
/// surfaced so callers can reconstruct strings correctly. Unknown field
/// values are preserved rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextEncoding {
    /// UTF-8 (field value 1).
    Utf8,
    /// UTF-16 little-endian (field value 2).
    Utf16Le,
    /// UTF-16 big-endian (field value 3).
    Utf16Be,
    /// Any other field value, kept verbatim.
    Unknown(u32),
}

impl TextEncoding {
    /// Decode the raw header field.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Utf8,
            2 => Self::Utf16Le,
            3 => Self::Utf16Be,
            other => Self::Unknown(other),
        }
    }
}

/// The magic string at the start of every SQLite database file.
pub const DATABASE_HEADER_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Size of the database file header in bytes.
pub const DATABASE_HEADER_SIZE: usize = 100;

/// The decoded 100-byte database file header.
///
/// Only the magic string and the page size are validated: litescan is a
/// forensic reader and must load images a live engine would refuse. All
/// other fields are surfaced as found.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatabaseHeader {
    /// Page size in bytes (field value 1 decodes as 65536).
    pub page_size: PageSize,
    /// File format write version (1 = legacy, 2 = WAL).
    pub write_version: u8,
    /// File format read version (1 = legacy, 2 = WAL).
    pub read_version: u8,
    /// Bytes reserved at the end of every page.
    pub reserved_bytes: u8,
    /// Maximum embedded payload fraction (always 64 in valid files).
    pub payload_max_fraction: u8,
    /// Minimum embedded payload fraction (always 32 in valid files).
    pub payload_min_fraction: u8,
    /// Leaf payload fraction (always 32 in valid files).
    pub payload_leaf_fraction: u8,
    /// File change counter.
    pub change_counter: u32,
    /// In-header database size in pages (may be stale in old files).
    pub page_count: u32,
    /// Page number of the first freelist trunk page (0 if none).
    pub freelist_trunk: u32,
    /// Total number of freelist pages.
    pub freelist_count: u32,
    /// Schema cookie, incremented on schema changes.
    pub schema_cookie: u32,
    /// Schema format number (1 through 4).
    pub schema_format: u32,
    /// Suggested page cache size.
    pub default_cache_size: i32,
    /// Largest root page number, when vacuum modes are enabled.
    pub largest_root_page: u32,
    /// Text encoding for all text values in the file.
    pub text_encoding: TextEncoding,
    /// The `PRAGMA user_version` value.
    pub user_version: u32,
    /// Non-zero when incremental vacuum is enabled.
    pub incremental_vacuum: u32,
    /// The `PRAGMA application_id` value.
    pub application_id: u32,
    /// The reserved region at offsets 72..92, normally all zero.
    pub reserved: [u8; 20],
    /// Change counter value at which `sqlite_version` was written.
    pub version_valid_for: u32,
    /// `SQLITE_VERSION_NUMBER` of the library that last wrote the file.
    pub sqlite_version: u32,
}

impl DatabaseHeader {
    /// Parse the file header from the first bytes of an image.
    ///
    /// Fails with `BadHeader` when fewer than 100 bytes are available, the
    /// magic string does not match, or the page-size field is invalid.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < DATABASE_HEADER_SIZE {
            return Err(LitescanError::bad_header(format!(
                "file is {} bytes, shorter than the {DATABASE_HEADER_SIZE}-byte header",
                buf.len()
            )));
        }
        if &buf[..16] != DATABASE_HEADER_MAGIC {
            return Err(LitescanError::bad_header("magic string mismatch"));
        }

        let page_size_raw = encoding::read_u16_be(&buf[16..]).expect("fixed u16 field");
        let page_size = PageSize::from_header_field(page_size_raw).ok_or_else(|| {
            LitescanError::bad_header(format!("invalid page size field: {page_size_raw}"))
        })?;

        let mut reserved = [0u8; 20];
        reserved.copy_from_slice(&buf[72..92]);

        Ok(Self {
            page_size,
            write_version: buf[18],
            read_version: buf[19],
            reserved_bytes: buf[20],
            payload_max_fraction: buf[21],
            payload_min_fraction: buf[22],
            payload_leaf_fraction: buf[23],
            change_counter: encoding::read_u32_be(&buf[24..]).expect("fixed u32 field"),
            page_count: encoding::read_u32_be(&buf[28..]).expect("fixed u32 field"),
            freelist_trunk: encoding::read_u32_be(&buf[32..]).expect("fixed u32 field"),
            freelist_count: encoding::read_u32_be(&buf[36..]).expect("fixed u32 field"),
            schema_cookie: encoding::read_u32_be(&buf[40..]).expect("fixed u32 field"),
            schema_format: encoding::read_u32_be(&buf[44..]).expect("fixed u32 field"),
            default_cache_size: encoding::read_i32_be(&buf[48..]).expect("fixed i32 field"),
            largest_root_page: encoding::read_u32_be(&buf[52..]).expect("fixed u32 field"),
            text_encoding: TextEncoding::from_raw(
                encoding::read_u32_be(&buf[56..]).expect("fixed u32 field"),
            ),
            user_version: encoding::read_u32_be(&buf[60..]).expect("fixed u32 field"),
            incremental_vacuum: encoding::read_u32_be(&buf[64..]).expect("fixed u32 field"),
            application_id: encoding::read_u32_be(&buf[68..]).expect("fixed u32 field"),
            reserved,
            version_valid_for: encoding::read_u32_be(&buf[92..]).expect("fixed u32 field"),
            sqlite_version: encoding::read_u32_be(&buf[96..]).expect("fixed u32 field"),
        })
    }
}
