//! B-tree page decoding.
//!
//! A page is a `page_size`-byte window at offset `(page_no - 1) * page_size`
//! in the image. Page 1 is special: its first 100 bytes are the database
//! file header, and the B-tree page header starts at byte 100.
//!
//! Page header layout (big-endian):
//!
//! | offset | size | field                                        |
//! |--------|------|----------------------------------------------|
//! | 0      | 1    | variant flag (2/5/10/13, or 0 = empty)       |
//! | 1      | 2    | first freeblock offset (0 = none)            |
//! | 3      | 2    | cell count                                   |
//! | 5      | 2    | cell content area start (0 = 65536)          |
//! | 7      | 1    | fragmented free bytes                        |
//! | 8      | 4    | rightmost child (interior variants only)     |
//!
//! The cell pointer array of 2-byte page-relative offsets follows the
//! header; cells decode in pointer order, which is key order on disk.

use litescan_error::{LitescanError, Result};
use litescan_types::encoding::{read_u16_be, read_u32_be};
use litescan_types::{PageNumber, PageSize, DATABASE_HEADER_SIZE};
use tracing::debug;

use crate::cell::{parse_table_interior_cell, parse_table_leaf_cell, probe_index_cell, Row};
use crate::diag::Diagnostic;
use crate::freeblock::{walk_freeblocks, FreeBlock};

/// The five page variants, identified by the flag byte at offset 0 of the
/// page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum PageKind {
    /// An unused or freelist page (flag byte 0). No B-tree content.
    Empty = 0x00,
    /// Interior index page: index keys and child pointers.
    InteriorIndex = 0x02,
    /// Interior table page: rowid separators and child pointers.
    InteriorTable = 0x05,
    /// Leaf index page: index keys only.
    LeafIndex = 0x0A,
    /// Leaf table page: rowids and record payloads.
    LeafTable = 0x0D,
}

impl PageKind {
    /// Parse a page kind from the flag byte.
    pub const fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0x00 => Some(Self::Empty),
            0x02 => Some(Self::InteriorIndex),
            0x05 => Some(Self::InteriorTable),
            0x0A => Some(Self::LeafIndex),
            0x0D => Some(Self::LeafTable),
            _ => None,
        }
    }

    /// Whether this is an interior (non-leaf) variant.
    pub const fn is_interior(self) -> bool {
        matches!(self, Self::InteriorIndex | Self::InteriorTable)
    }

    /// Whether this is a table (intkey) variant.
    pub const fn is_table(self) -> bool {
        matches!(self, Self::InteriorTable | Self::LeafTable)
    }

    /// Size of the page header: 12 bytes for interior variants, 8 for the
    /// rest.
    pub const fn header_size(self) -> usize {
        if self.is_interior() {
            12
        } else {
            8
        }
    }
}

/// The header offset for a page: 100 on page 1, 0 elsewhere.
pub const fn header_offset_for_page(page_no: PageNumber) -> usize {
    if page_no.get() == 1 {
        DATABASE_HEADER_SIZE
    } else {
        0
    }
}

/// One decoded B-tree page.
///
/// Cell decoding stops at the first corrupt or overflowing cell; the rows
/// decoded up to that point are kept and [`Page::truncated`] reports the
/// early stop. Pages the parser cannot even frame become `Empty`
/// placeholders so the page vector stays dense.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Page {
    page_no: PageNumber,
    kind: PageKind,
    first_freeblock: u16,
    cell_count: u16,
    cell_content_start: u32,
    fragmented_bytes: u8,
    right_child: Option<PageNumber>,
    rows: Vec<Row>,
    free_blocks: Vec<FreeBlock>,
    children: Vec<PageNumber>,
    truncated: bool,
}

impl Page {
    /// An empty placeholder page.
    pub fn empty(page_no: PageNumber) -> Self {
        Self {
            page_no,
            kind: PageKind::Empty,
            first_freeblock: 0,
            cell_count: 0,
            cell_content_start: 0,
            fragmented_bytes: 0,
            right_child: None,
            rows: Vec::new(),
            free_blocks: Vec::new(),
            children: Vec::new(),
            truncated: false,
        }
    }

    /// Decode one page from its byte window.
    ///
    /// `bytes` is the page's slice of the image (shorter than `page_size`
    /// only when the file itself is truncated). Recoverable anomalies are
    /// emitted into `diags`; a hard failure to frame the page returns an
    /// error for the caller to contain.
    pub fn parse(
        bytes: &[u8],
        page_no: PageNumber,
        page_size: PageSize,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<Self> {
        debug_assert!(bytes.len() <= page_size.as_usize());
        let no = page_no.get();
        let header_offset = header_offset_for_page(page_no);

        let flag = *bytes.get(header_offset).ok_or_else(|| {
            LitescanError::corrupt_page(no, header_offset, "page too small for a header")
        })?;
        let kind = PageKind::from_flag(flag).ok_or_else(|| {
            LitescanError::corrupt_page(
                no,
                header_offset,
                format!("unknown page variant flag {flag:#04x}"),
            )
        })?;
        if kind == PageKind::Empty {
            return Ok(Self::empty(page_no));
        }

        let header_end = header_offset + kind.header_size();
        if bytes.len() < header_end {
            return Err(LitescanError::corrupt_page(
                no,
                header_offset,
                "page too small for its header variant",
            ));
        }
        let h = &bytes[header_offset..];

        let first_freeblock = read_u16_be(&h[1..]).expect("header bounds checked");
        let cell_count = read_u16_be(&h[3..]).expect("header bounds checked");
        let raw_content_start = read_u16_be(&h[5..]).expect("header bounds checked");
        let cell_content_start = if raw_content_start == 0 {
            65536
        } else {
            u32::from(raw_content_start)
        };
        let fragmented_bytes = h[7];

        let right_child = if kind.is_interior() {
            let raw = read_u32_be(&h[8..]).expect("interior header bounds checked");
            Some(PageNumber::new(raw).ok_or_else(|| {
                LitescanError::corrupt_page(no, header_offset + 8, "zero rightmost pointer")
            })?)
        } else {
            None
        };

        let pointers = read_cell_pointers(bytes, no, header_end, cell_count)?;
        let free_blocks = walk_freeblocks(bytes, no, first_freeblock, diags);

        let mut page = Self {
            page_no,
            kind,
            first_freeblock,
            cell_count,
            cell_content_start,
            fragmented_bytes,
            right_child,
            rows: Vec::with_capacity(usize::from(cell_count)),
            free_blocks,
            children: Vec::new(),
            truncated: false,
        };
        page.parse_cells(bytes, &pointers, diags);

        debug!(
            page = no,
            kind = ?page.kind,
            cells = page.cell_count,
            rows = page.rows.len(),
            freeblocks = page.free_blocks.len(),
            "decoded page"
        );
        Ok(page)
    }

    fn parse_cells(&mut self, bytes: &[u8], pointers: &[u16], diags: &mut Vec<Diagnostic>) {
        let no = self.page_no.get();
        for &pointer in pointers {
            let at = usize::from(pointer);
            if let Some(block) = self.free_blocks.iter().find(|b| b.contains(at)) {
                Diagnostic::on_page(
                    no,
                    at,
                    format!(
                        "cell pointer lands inside the freeblock at offset {}",
                        block.offset
                    ),
                )
                .emit(diags);
            }

            let parsed = match self.kind {
                PageKind::LeafTable => parse_table_leaf_cell(bytes, no, at).map(Some),
                PageKind::InteriorTable => parse_table_interior_cell(bytes, no, at).map(Some),
                PageKind::LeafIndex => probe_index_cell(bytes, no, at, false).map(|_| None),
                PageKind::InteriorIndex => probe_index_cell(bytes, no, at, true).map(|_| None),
                PageKind::Empty => unreachable!("empty pages return before cell parsing"),
            };

            match parsed {
                Ok(Some(row)) => self.rows.push(row),
                Ok(None) => {}
                Err(err) => {
                    Diagnostic::on_page(err.page().unwrap_or(no), at, err.to_string()).emit(diags);
                    self.truncated = true;
                    return;
                }
            }
        }
    }

    /// The 1-based page number.
    pub const fn page_no(&self) -> PageNumber {
        self.page_no
    }

    /// The page variant.
    pub const fn kind(&self) -> PageKind {
        self.kind
    }

    /// Offset of the first freeblock, 0 when the page has none.
    pub const fn first_freeblock(&self) -> u16 {
        self.first_freeblock
    }

    /// The header's cell count.
    pub const fn cell_count(&self) -> u16 {
        self.cell_count
    }

    /// Start of the cell content area (a stored 0 decodes as 65536).
    pub const fn cell_content_start(&self) -> u32 {
        self.cell_content_start
    }

    /// Fragmented free bytes within the content area.
    pub const fn fragmented_bytes(&self) -> u8 {
        self.fragmented_bytes
    }

    /// The rightmost child pointer, on interior pages.
    pub const fn right_child(&self) -> Option<PageNumber> {
        self.right_child
    }

    /// Decoded rows, in cell-pointer order. Empty on index and empty pages.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Free blocks found on the page, in chain order.
    pub fn free_blocks(&self) -> &[FreeBlock] {
        &self.free_blocks
    }

    /// Child pages linked from this page, filled by [`link_children`]:
    /// one per interior-table row plus the rightmost pointer.
    pub fn children(&self) -> &[PageNumber] {
        &self.children
    }

    /// Whether cell decoding stopped before `cell_count` cells.
    pub const fn truncated(&self) -> bool {
        self.truncated
    }
}

fn read_cell_pointers(
    bytes: &[u8],
    page_no: u32,
    array_start: usize,
    cell_count: u16,
) -> Result<Vec<u16>> {
    let array_end = array_start + usize::from(cell_count) * 2;
    if array_end > bytes.len() {
        return Err(LitescanError::corrupt_page(
            page_no,
            array_start,
            format!("cell pointer array of {cell_count} entries runs past the page end"),
        ));
    }
    Ok((array_start..array_end)
        .step_by(2)
        .map(|at| read_u16_be(&bytes[at..]).expect("array bounds checked"))
        .collect())
}

/// Fill every page's child list: one entry per interior-table row plus the
/// rightmost pointer of any interior page. Children pointing outside
/// `1..=pages.len()` are reported and skipped.
pub fn link_children(pages: &mut [Page], diags: &mut Vec<Diagnostic>) {
    let total = u32::try_from(pages.len()).unwrap_or(u32::MAX);
    for page in pages.iter_mut() {
        let no = page.page_no.get();
        let mut children = Vec::new();

        let mut link = |child: PageNumber, diags: &mut Vec<Diagnostic>| {
            if child.get() <= total {
                children.push(child);
            } else {
                Diagnostic::on_page(
                    no,
                    0,
                    format!(
                        "child pointer {} is outside the {total}-page file",
                        child.get()
                    ),
                )
                .emit(diags);
            }
        };

        if page.kind == PageKind::InteriorTable {
            let row_children: Vec<PageNumber> =
                page.rows.iter().filter_map(Row::left_child).collect();
            for child in row_children {
                link(child, diags);
            }
        }
        if let Some(right) = page.right_child {
            link(right, diags);
        }

        page.children = children;
    }
}
