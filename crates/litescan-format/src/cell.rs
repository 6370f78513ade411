//! Per-variant cell decoding.
//!
//! The four page variants share a dispatch point but carry different cell
//! layouts:
//!
//! - *Table leaf* (0x0D): payload-size (size varint), rowid (standard
//!   varint), record payload, and a 4-byte overflow page number when the
//!   payload spills. litescan detects the spill and stops; it never follows
//!   overflow chains.
//! - *Table interior* (0x05): 4-byte left-child page number, rowid varint.
//! - *Index leaf* (0x0A): payload-size varint, payload. Recognized but not
//!   decoded.
//! - *Index interior* (0x02): 4-byte left child, payload-size varint,
//!   payload. Recognized but not decoded.

use litescan_error::{LitescanError, Result};
use litescan_types::serial_type::read_varint;
use litescan_types::size_varint::read_size_varint;
use litescan_types::{PageNumber, Record};
use tracing::debug;

/// One decoded table-page cell.
///
/// A row is either a leaf row carrying column data or an interior separator
/// carrying a child pointer, never both.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Row {
    /// A table-leaf cell: the rowid and its decoded record.
    Leaf {
        /// The 64-bit rowid key.
        rowid: u64,
        /// The decoded column payload.
        record: Record,
    },
    /// A table-interior cell: a rowid separator and the child holding keys
    /// at or below it.
    Interior {
        /// The separator rowid.
        rowid: u64,
        /// The left-child page.
        left_child: PageNumber,
    },
}

impl Row {
    /// The rowid key or separator.
    pub const fn rowid(&self) -> u64 {
        match self {
            Self::Leaf { rowid, .. } | Self::Interior { rowid, .. } => *rowid,
        }
    }

    /// The record, for leaf rows.
    pub const fn record(&self) -> Option<&Record> {
        match self {
            Self::Leaf { record, .. } => Some(record),
            Self::Interior { .. } => None,
        }
    }

    /// The left-child page, for interior rows.
    pub const fn left_child(&self) -> Option<PageNumber> {
        match self {
            Self::Interior { left_child, .. } => Some(*left_child),
            Self::Leaf { .. } => None,
        }
    }
}

/// Decode a table-leaf cell at `cell_offset` into a [`Row::Leaf`].
#[allow(clippy::cast_possible_truncation)]
pub fn parse_table_leaf_cell(page: &[u8], page_no: u32, cell_offset: usize) -> Result<Row> {
    let (payload_size, size_len) = read_size_varint(&page[cell_offset.min(page.len())..]).ok_or(
        LitescanError::TruncatedVarint {
            page: Some(page_no),
            offset: cell_offset,
        },
    )?;
    let rowid_offset = cell_offset + size_len;
    let (rowid, rowid_len) =
        read_varint(&page[rowid_offset.min(page.len())..]).ok_or(LitescanError::TruncatedVarint {
            page: Some(page_no),
            offset: rowid_offset,
        })?;

    let payload_start = rowid_offset + rowid_len;
    if payload_start as u64 + payload_size > page.len() as u64 {
        return Err(LitescanError::OverflowUnsupported {
            page: page_no,
            rowid,
            payload_size: payload_size as usize,
        });
    }

    let payload = &page[payload_start..payload_start + payload_size as usize];
    let record = Record::decode(payload)?;
    debug!(
        page = page_no,
        rowid,
        payload_len = payload_size,
        columns = record.len(),
        "decoded table leaf cell"
    );
    Ok(Row::Leaf { rowid, record })
}

/// Decode a table-interior cell at `cell_offset` into a [`Row::Interior`].
pub fn parse_table_interior_cell(page: &[u8], page_no: u32, cell_offset: usize) -> Result<Row> {
    let left_child = read_child_pointer(page, page_no, cell_offset)?;
    let rowid_offset = cell_offset + 4;
    let (rowid, _) =
        read_varint(&page[rowid_offset.min(page.len())..]).ok_or(LitescanError::TruncatedVarint {
            page: Some(page_no),
            offset: rowid_offset,
        })?;
    debug!(
        page = page_no,
        rowid,
        child = left_child.get(),
        "decoded table interior cell"
    );
    Ok(Row::Interior { rowid, left_child })
}

/// Validate the envelope of an index cell without decoding its payload.
///
/// Interior index cells open with a 4-byte left child; both variants then
/// carry a standard-varint payload size. Returns that size.
pub fn probe_index_cell(
    page: &[u8],
    page_no: u32,
    cell_offset: usize,
    interior: bool,
) -> Result<u64> {
    let size_offset = if interior {
        read_child_pointer(page, page_no, cell_offset)?;
        cell_offset + 4
    } else {
        cell_offset
    };
    let (payload_size, _) =
        read_varint(&page[size_offset.min(page.len())..]).ok_or(LitescanError::TruncatedVarint {
            page: Some(page_no),
            offset: size_offset,
        })?;
    Ok(payload_size)
}

fn read_child_pointer(page: &[u8], page_no: u32, offset: usize) -> Result<PageNumber> {
    let raw = litescan_types::encoding::read_u32_be(&page[offset.min(page.len())..]).ok_or_else(
        || LitescanError::corrupt_page(page_no, offset, "cell runs past the page end"),
    )?;
    PageNumber::new(raw)
        .ok_or_else(|| LitescanError::corrupt_page(page_no, offset, "cell has a zero child pointer"))
}
