//! litescan: a read-only decoder for SQLite database images.
//!
//! Give [`load`] the path of a SQLite file (or [`load_bytes`] its raw
//! contents) and get back a [`Storage`]: the decoded file header, every
//! B-tree page, and each table's rows as typed column values. No SQL engine
//! is involved and nothing is ever written; the crate exists for tools that
//! inspect or extract data from an image without trusting it, such as
//! forensic viewers, migration helpers, and diagnostics.
//!
//! ```no_run
//! # fn main() -> litescan::Result<()> {
//! let storage = litescan::load("app.db")?;
//! for (name, table) in storage.tables() {
//!     println!("{name}: {} rows", table.len());
//!     for record in table.entries() {
//!         for value in record.values() {
//!             print!("{} ", value.render());
//!         }
//!         println!();
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Damage tolerance: only a failed read or an invalid file header aborts a
//! load. Corrupt pages and cells that spill to overflow pages degrade into
//! [`Diagnostic`]s, partially-decoded pages, and omitted or truncated
//! tables, so one bad page never hides the rest of the image.

pub mod catalog;
mod loader;
mod storage;
mod walker;

pub use catalog::{ObjectKind, SchemaEntry, CATALOG_TABLE_NAME};
pub use loader::{load, load_bytes};
pub use storage::{Storage, Table};

pub use litescan_error::{LitescanError, Result};
pub use litescan_format::{Diagnostic, FreeBlock, Page, PageKind, Row};
pub use litescan_types::{
    ColumnValue, DatabaseHeader, PageNumber, PageSize, Record, TextEncoding, ValueKind,
};
