//! Load orchestration: bytes in, [`Storage`] out.
//!
//! `load` reads the whole file into memory and hands it to `load_bytes`,
//! which does everything else: parse the header, decode pages `1..=N`,
//! link parent/child pointers, walk the catalog, and materialize every
//! table. Only `Io` and `BadHeader` abort; page-scoped damage degrades into
//! diagnostics and partially-decoded pages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use litescan_error::Result;
use litescan_format::{link_children, Diagnostic, Page};
use litescan_types::{DatabaseHeader, PageNumber};
use tracing::debug;

use crate::catalog::{ObjectKind, SchemaEntry, CATALOG_TABLE_NAME};
use crate::storage::{Storage, Table};
use crate::walker::collect_table_records;

/// Load a database image from disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Storage> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    load_bytes(path.to_path_buf(), bytes)
}

/// Decode a database image already held in memory.
///
/// `path` only labels the resulting [`Storage`]; nothing is read from disk.
pub fn load_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Storage> {
    let path = path.into();
    let mut diags = Vec::new();

    let header = DatabaseHeader::parse(&bytes)?;
    let page_size = header.page_size;

    if bytes.len() % page_size.as_usize() != 0 {
        Diagnostic::on_file(format!(
            "file size {} is not a multiple of the {page_size}-byte page size",
            bytes.len()
        ))
        .emit(&mut diags);
    }

    let page_count = bytes
        .len()
        .div_ceil(page_size.as_usize())
        .min(u32::MAX as usize);
    let mut pages = Vec::with_capacity(page_count);
    for number in 1..=page_count {
        #[allow(clippy::cast_possible_truncation)]
        let page_no = PageNumber::new(number as u32).expect("page numbers start at 1");
        let start = (number - 1) * page_size.as_usize();
        let end = (start + page_size.as_usize()).min(bytes.len());

        match Page::parse(&bytes[start..end], page_no, page_size, &mut diags) {
            Ok(page) => pages.push(page),
            Err(err) if err.is_page_scoped() => {
                Diagnostic::on_page(err.page().unwrap_or(page_no.get()), 0, err.to_string())
                    .emit(&mut diags);
                pages.push(Page::empty(page_no));
            }
            Err(err) => return Err(err),
        }
    }

    link_children(&mut pages, &mut diags);
    let tables = assemble_tables(&pages, &mut diags);

    debug!(
        path = %path.display(),
        pages = pages.len(),
        tables = tables.len(),
        diagnostics = diags.len(),
        "loaded database image"
    );
    Ok(Storage::new(path, header, pages, tables, diags))
}

/// Build the catalog from page 1, then materialize every table it names.
fn assemble_tables(pages: &[Page], diags: &mut Vec<Diagnostic>) -> BTreeMap<String, Table> {
    let mut tables = BTreeMap::new();
    if pages.is_empty() {
        return tables;
    }

    if !pages[0].kind().is_table() {
        Diagnostic::on_page(
            1,
            0,
            format!("catalog root has page kind {:?}", pages[0].kind()),
        )
        .emit(diags);
    }
    let catalog_records = collect_table_records(pages, PageNumber::ONE, diags);

    for record in &catalog_records {
        let entry = match SchemaEntry::from_record(record) {
            Ok(entry) => entry,
            Err(err) => {
                Diagnostic::on_page(1, 0, err.to_string()).emit(diags);
                continue;
            }
        };
        // Indexes, views and triggers are listed but carry no table rows;
        // materializing an index under its tbl_name would shadow the table.
        if entry.kind != ObjectKind::Table {
            continue;
        }
        let Some(root) = entry.root_page else {
            continue;
        };
        let records = collect_table_records(pages, root, diags);
        tables.insert(entry.tbl_name, Table::new(records));
    }

    tables.insert(
        CATALOG_TABLE_NAME.to_owned(),
        Table::new(catalog_records),
    );
    tables
}
