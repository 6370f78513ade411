//! The `sqlite_master` catalog.
//!
//! Page 1 roots a self-describing table listing every object in the file:
//!
//! ```sql
//! CREATE TABLE sqlite_master(
//!     type text,      -- 'table', 'index', 'view' or 'trigger'
//!     name text,
//!     tbl_name text,
//!     rootpage integer,
//!     sql text
//! );
//! ```
//!
//! The catalog tells the table assembler which root page belongs to which
//! table; everything else in the file is only reachable through it.

use litescan_error::{LitescanError, Result};
use litescan_types::{ColumnValue, PageNumber, Record};

/// The catalog's own name in the table map.
pub const CATALOG_TABLE_NAME: &str = "sqlite_master";

/// Kind of object a catalog row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ObjectKind {
    /// An ordinary rowid table.
    Table,
    /// An index B-tree.
    Index,
    /// A view; carries no storage.
    View,
    /// A trigger; carries no storage.
    Trigger,
}

impl ObjectKind {
    /// Parse the catalog's textual tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "table" => Some(Self::Table),
            "index" => Some(Self::Index),
            "view" => Some(Self::View),
            "trigger" => Some(Self::Trigger),
            _ => None,
        }
    }
}

/// One parsed catalog row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchemaEntry {
    /// What the row describes.
    pub kind: ObjectKind,
    /// The object's own name.
    pub name: String,
    /// The table the object belongs to (for tables, the table itself).
    pub tbl_name: String,
    /// Root page of the object's B-tree; `None` for storage-less objects
    /// (views, triggers) whose rootpage column is 0 or NULL.
    pub root_page: Option<PageNumber>,
    /// The SQL text that created the object, when present.
    pub sql: Option<String>,
}

impl SchemaEntry {
    /// Interpret a catalog record.
    ///
    /// Fails with `CatalogInvalid` when the record does not have the
    /// five-column `sqlite_master` shape.
    pub fn from_record(record: &Record) -> Result<Self> {
        if record.len() < 5 {
            return Err(LitescanError::catalog(format!(
                "catalog row has {} columns, expected 5",
                record.len()
            )));
        }

        let tag = text_column(&record[0], "type")?;
        let kind = ObjectKind::from_tag(&tag)
            .ok_or_else(|| LitescanError::catalog(format!("unknown object type '{tag}'")))?;
        let name = text_column(&record[1], "name")?;
        let tbl_name = text_column(&record[2], "tbl_name")?;

        let root_page = match record[3].as_integer() {
            Some(n) => {
                let n = u32::try_from(n).map_err(|_| {
                    LitescanError::catalog(format!("rootpage {n} of '{name}' is out of range"))
                })?;
                PageNumber::new(n)
            }
            None if record[3].is_null() => None,
            None => {
                return Err(LitescanError::catalog(format!(
                    "rootpage of '{name}' is not an integer"
                )));
            }
        };

        let sql = if record[4].is_null() {
            None
        } else {
            Some(text_column(&record[4], "sql")?)
        };

        Ok(Self {
            kind,
            name,
            tbl_name,
            root_page,
            sql,
        })
    }
}

fn text_column(value: &ColumnValue, column: &str) -> Result<String> {
    value
        .as_text()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .ok_or_else(|| LitescanError::catalog(format!("catalog column '{column}' is not text")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use litescan_types::serial_type::{varint_len, write_varint};

    fn encode_record(columns: &[(u64, Vec<u8>)]) -> Record {
        let types_len: usize = columns.iter().map(|(st, _)| varint_len(*st)).sum();
        let header_size = types_len + 1;
        let mut out = vec![0u8; 9];
        let n = write_varint(&mut out, header_size as u64);
        out.truncate(n);
        let mut scratch = [0u8; 9];
        for (st, _) in columns {
            let n = write_varint(&mut scratch, *st);
            out.extend_from_slice(&scratch[..n]);
        }
        for (_, body) in columns {
            out.extend_from_slice(body);
        }
        Record::decode(&out).unwrap()
    }

    fn text(s: &str) -> (u64, Vec<u8>) {
        (13 + 2 * s.len() as u64, s.as_bytes().to_vec())
    }

    fn catalog_record(kind: &str, name: &str, tbl: &str, root: i64, sql: &str) -> Record {
        encode_record(&[
            text(kind),
            text(name),
            text(tbl),
            (1, vec![u8::try_from(root).unwrap()]),
            text(sql),
        ])
    }

    #[test]
    fn table_entry() {
        let record = catalog_record("table", "person", "person", 2, "CREATE TABLE person(id)");
        let entry = SchemaEntry::from_record(&record).unwrap();
        assert_eq!(entry.kind, ObjectKind::Table);
        assert_eq!(entry.name, "person");
        assert_eq!(entry.tbl_name, "person");
        assert_eq!(entry.root_page.map(PageNumber::get), Some(2));
        assert_eq!(entry.sql.as_deref(), Some("CREATE TABLE person(id)"));
    }

    #[test]
    fn index_entry() {
        let record = catalog_record("index", "idx_name", "person", 3, "CREATE INDEX ...");
        let entry = SchemaEntry::from_record(&record).unwrap();
        assert_eq!(entry.kind, ObjectKind::Index);
        assert_eq!(entry.tbl_name, "person");
    }

    #[test]
    fn zero_rootpage_means_no_storage() {
        // Serial type 8 is the integer constant 0.
        let record = encode_record(&[
            text("view"),
            text("v"),
            text("v"),
            (8, Vec::new()),
            text("CREATE VIEW v AS SELECT 1"),
        ]);
        let entry = SchemaEntry::from_record(&record).unwrap();
        assert_eq!(entry.kind, ObjectKind::View);
        assert_eq!(entry.root_page, None);
    }

    #[test]
    fn null_sql_is_allowed() {
        let record = encode_record(&[
            text("table"),
            text("t"),
            text("t"),
            (9, Vec::new()),
            (0, Vec::new()),
        ]);
        let entry = SchemaEntry::from_record(&record).unwrap();
        assert_eq!(entry.root_page.map(PageNumber::get), Some(1));
        assert_eq!(entry.sql, None);
    }

    #[test]
    fn short_record_rejected() {
        let record = encode_record(&[text("table"), text("t")]);
        let err = SchemaEntry::from_record(&record).unwrap_err();
        assert!(matches!(err, LitescanError::CatalogInvalid { .. }));
        assert!(err.to_string().contains("2 columns"));
    }

    #[test]
    fn unknown_tag_rejected() {
        let record = catalog_record("gizmo", "g", "g", 2, "");
        let err = SchemaEntry::from_record(&record).unwrap_err();
        assert!(err.to_string().contains("unknown object type"));
    }

    #[test]
    fn non_integer_rootpage_rejected() {
        let record = encode_record(&[
            text("table"),
            text("t"),
            text("t"),
            text("two"),
            (0, Vec::new()),
        ]);
        let err = SchemaEntry::from_record(&record).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn negative_rootpage_rejected() {
        let record = encode_record(&[
            text("table"),
            text("t"),
            text("t"),
            (1, vec![0xFF]),
            (0, Vec::new()),
        ]);
        let err = SchemaEntry::from_record(&record).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
