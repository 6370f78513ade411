//! Table B-tree walking.
//!
//! A table's rows live in the leaf-table pages of the B-tree under its root.
//! The walk is in-order: each interior row's left child first, the rightmost
//! child last, which yields leaf records in rowid-ascending order. A visited
//! set guards against pointer cycles in corrupt images.

use std::collections::HashSet;

use litescan_format::{Diagnostic, Page, PageKind, Row};
use litescan_types::{PageNumber, Record};

/// Collect the records of every leaf-table page reachable from `root`, in
/// rowid order. Structural problems along the way (dangling pointers,
/// cycles, unexpected page kinds) are reported and the affected subtree is
/// skipped.
pub fn collect_table_records(
    pages: &[Page],
    root: PageNumber,
    diags: &mut Vec<Diagnostic>,
) -> Vec<Record> {
    let mut records = Vec::new();
    let mut visited = HashSet::new();
    walk(pages, root, &mut visited, &mut records, diags);
    records
}

fn walk(
    pages: &[Page],
    page_no: PageNumber,
    visited: &mut HashSet<u32>,
    records: &mut Vec<Record>,
    diags: &mut Vec<Diagnostic>,
) {
    if page_no.index() >= pages.len() {
        Diagnostic::on_file(format!(
            "table tree points at page {page_no} beyond the {}-page file",
            pages.len()
        ))
        .emit(diags);
        return;
    }
    if !visited.insert(page_no.get()) {
        Diagnostic::on_page(page_no.get(), 0, "page cycle in table tree").emit(diags);
        return;
    }

    let page = &pages[page_no.index()];
    match page.kind() {
        PageKind::LeafTable => {
            records.extend(page.rows().iter().filter_map(|row| match row {
                Row::Leaf { record, .. } => Some(record.clone()),
                Row::Interior { .. } => None,
            }));
        }
        PageKind::InteriorTable => {
            for row in page.rows() {
                if let Row::Interior { left_child, .. } = row {
                    walk(pages, *left_child, visited, records, diags);
                }
            }
            if let Some(right) = page.right_child() {
                walk(pages, right, visited, records, diags);
            }
        }
        other => {
            Diagnostic::on_page(
                page_no.get(),
                0,
                format!("expected a table page in the tree, found {other:?}"),
            )
            .emit(diags);
        }
    }
}
