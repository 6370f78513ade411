//! Free-block chain decoding.
//!
//! Deleted cells leave unallocated ranges inside a page's content area,
//! linked in a chain of ascending offsets starting from the page header's
//! first-freeblock field. Each block begins with a 4-byte header: a 2-byte
//! pointer to the next block (0 terminates the chain) and a 2-byte size
//! that includes the header itself.
//!
//! Live cells never overlap free blocks in a well-formed page, so cell
//! decoding can read straight through the cell-pointer array; the walked
//! chain serves forensic callers and lets the page parser flag any cell
//! pointer that lands inside freed space.

use litescan_types::encoding::read_u16_be;

use crate::diag::Diagnostic;

/// One free block carved out of a page's content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FreeBlock {
    /// Page-relative byte offset of the block.
    pub offset: u16,
    /// Size of the block in bytes, header included.
    pub size: u16,
    /// Offset of the next block in the chain, 0 for the last.
    pub next: u16,
}

impl FreeBlock {
    /// Whether a page-relative offset falls inside this block.
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.offset as usize && offset < self.offset as usize + self.size as usize
    }
}

/// Walk the free-block chain starting at `first_freeblock`.
///
/// The chain must run in ascending offsets; a backwards or out-of-bounds
/// link ends the walk with a diagnostic rather than looping or reading
/// outside the page.
pub fn walk_freeblocks(
    page: &[u8],
    page_no: u32,
    first_freeblock: u16,
    diags: &mut Vec<Diagnostic>,
) -> Vec<FreeBlock> {
    let mut blocks = Vec::new();
    let mut cursor = first_freeblock;
    let mut previous = 0u16;

    while cursor != 0 {
        let at = cursor as usize;
        if cursor <= previous {
            Diagnostic::on_page(
                page_no,
                at,
                format!("freeblock chain goes backwards: {previous} -> {cursor}"),
            )
            .emit(diags);
            break;
        }
        if at + 4 > page.len() {
            Diagnostic::on_page(page_no, at, "freeblock header runs past the page end")
                .emit(diags);
            break;
        }
        let next = read_u16_be(&page[at..]).expect("bounds checked above");
        let size = read_u16_be(&page[at + 2..]).expect("bounds checked above");

        if size < 4 {
            Diagnostic::on_page(
                page_no,
                at,
                format!("freeblock size {size} is below the 4-byte header"),
            )
            .emit(diags);
            break;
        }
        if at + size as usize > page.len() {
            Diagnostic::on_page(
                page_no,
                at,
                format!("freeblock of {size} bytes runs past the page end"),
            )
            .emit(diags);
            break;
        }

        blocks.push(FreeBlock {
            offset: cursor,
            size,
            next,
        });
        previous = cursor;
        cursor = next;
    }

    blocks
}
