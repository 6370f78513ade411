//! End-to-end tests against real database images.
//!
//! Each fixture is produced by SQLite itself (through rusqlite) in a temp
//! directory, then decoded from the raw bytes by litescan. What SQLite
//! wrote is the ground truth for what the decoder must reconstruct.

use litescan::{PageKind, Storage, CATALOG_TABLE_NAME};
use rusqlite::Connection;
use tempfile::TempDir;

/// Build a database at a temp path with `setup`, close it, and load the
/// resulting image.
fn fixture(setup: impl FnOnce(&Connection)) -> (TempDir, Storage) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("fixture.db");
    let conn = Connection::open(&path).expect("create database");
    setup(&conn);
    drop(conn);
    let storage = litescan::load(&path).expect("load image");
    (dir, storage)
}

#[test]
fn three_row_person_table() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "CREATE TABLE person(id integer, name text);
             INSERT INTO person VALUES (1, 'hoge');
             INSERT INTO person VALUES (2, 'foo');
             INSERT INTO person VALUES (3, 'bar');",
        )
        .unwrap();
    });

    let person = storage.table("person").expect("person table");
    assert_eq!(person.len(), 3);

    let expected_names = ["hoge", "foo", "bar"];
    for (i, record) in person.entries().iter().enumerate() {
        assert_eq!(record.len(), 2);
        assert_eq!(record[0].render(), (i + 1).to_string());
        assert_eq!(record[1].render(), expected_names[i]);
    }
    assert!(storage.diagnostics().is_empty());
}

#[test]
fn fresh_image_has_empty_catalog_and_no_tables() {
    let (_dir, storage) = fixture(|conn| {
        // Force SQLite to materialize page 1 without creating any object.
        conn.execute_batch("PRAGMA user_version = 7;").unwrap();
    });

    assert_eq!(storage.tables().len(), 1);
    let catalog = storage.table(CATALOG_TABLE_NAME).expect("catalog");
    assert_eq!(catalog.len(), 0);
    assert_eq!(storage.header().user_version, 7);
}

#[test]
fn float_column_renders_scientific() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "CREATE TABLE measurement(value real);
             INSERT INTO measurement VALUES (1.5);",
        )
        .unwrap();
    });

    let table = storage.table("measurement").unwrap();
    assert_eq!(table.len(), 1);
    let value = &table.entries()[0][0];
    assert_eq!(value.serial_type(), 7);
    assert_eq!(value.as_float(), Some(1.5));
    assert_eq!(value.render(), "1.50000000e+00");
}

#[test]
fn blob_column_previews_nine_bytes() {
    let blob: Vec<u8> = (10u8..30).collect();
    let (_dir, storage) = fixture(|conn| {
        conn.execute("CREATE TABLE bin(data blob)", []).unwrap();
        conn.execute("INSERT INTO bin VALUES (?1)", [&blob])
            .unwrap();
    });

    let table = storage.table("bin").unwrap();
    let value = &table.entries()[0][0];
    assert_eq!(value.as_blob(), Some(blob.as_slice()));
    assert_eq!(value.len(), 20);
    assert_eq!(value.render(), "[10,11,12,13,14,15,16,17,18,...]");
}

#[test]
fn large_insert_spans_an_interior_root() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch("PRAGMA page_size = 512; CREATE TABLE person(id integer, name text);")
            .unwrap();
        for i in 1..=128i64 {
            conn.execute("INSERT INTO person VALUES (?1, 'abc')", [i])
                .unwrap();
        }
    });

    assert_eq!(storage.header().page_size.get(), 512);
    // 128 rows cannot fit one 512-byte leaf, so the tree must have split.
    assert!(storage
        .pages()
        .iter()
        .any(|p| p.kind() == PageKind::InteriorTable));

    let person = storage.table("person").expect("person table");
    assert_eq!(person.len(), 128);
    for (i, record) in person.entries().iter().enumerate() {
        assert_eq!(record[0].render(), (i + 1).to_string());
        assert_eq!(record[1].render(), "abc");
    }
}

#[test]
fn page_size_sentinel_decodes_as_65536() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "PRAGMA page_size = 65536;
             CREATE TABLE t(x integer);
             INSERT INTO t VALUES (99);",
        )
        .unwrap();
    });

    assert_eq!(storage.header().page_size.get(), 65536);
    let table = storage.table("t").unwrap();
    assert_eq!(table.entries()[0][0].render(), "99");
}

#[test]
fn deleted_row_leaves_a_freeblock() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "CREATE TABLE person(id integer, name text);
             INSERT INTO person VALUES (1, 'first');
             INSERT INTO person VALUES (2, 'second');
             INSERT INTO person VALUES (3, 'third');
             INSERT INTO person VALUES (4, 'fourth');
             DELETE FROM person WHERE id = 2;",
        )
        .unwrap();
    });

    let person = storage.table("person").unwrap();
    let ids: Vec<String> = person
        .entries()
        .iter()
        .map(|r| r[0].render())
        .collect();
    assert_eq!(ids, vec!["1", "3", "4"]);

    // The freed middle cell must survive as a freeblock on some page.
    assert!(storage
        .pages()
        .iter()
        .any(|p| p.first_freeblock() != 0 && !p.free_blocks().is_empty()));
}

#[test]
fn index_is_recognized_but_not_materialized() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "CREATE TABLE person(id integer, name text);
             CREATE INDEX idx_person_name ON person(name);
             INSERT INTO person VALUES (1, 'hoge');
             INSERT INTO person VALUES (2, 'foo');",
        )
        .unwrap();
    });

    // The index's B-tree exists in the image...
    assert!(storage
        .pages()
        .iter()
        .any(|p| p.kind() == PageKind::LeafIndex));
    // ...and the catalog lists it...
    let catalog = storage.table(CATALOG_TABLE_NAME).unwrap();
    assert_eq!(catalog.len(), 2);
    let kinds: Vec<String> = catalog.entries().iter().map(|r| r[0].render()).collect();
    assert!(kinds.contains(&"table".to_owned()));
    assert!(kinds.contains(&"index".to_owned()));
    // ...but only the table is materialized, with its rows intact.
    assert!(storage.table("idx_person_name").is_none());
    assert_eq!(storage.table("person").unwrap().len(), 2);
}

#[test]
fn catalog_rows_expose_schema_sql() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch("CREATE TABLE widget(name text, mass real);")
            .unwrap();
    });

    let catalog = storage.table(CATALOG_TABLE_NAME).unwrap();
    assert_eq!(catalog.len(), 1);
    let row = &catalog.entries()[0];
    assert_eq!(row[0].render(), "table");
    assert_eq!(row[1].render(), "widget");
    assert_eq!(row[2].render(), "widget");
    assert!(row[3].as_integer().unwrap() >= 2);
    assert!(row[4].render().starts_with("CREATE TABLE widget"));
}

#[test]
fn structural_invariants_hold() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch("PRAGMA page_size = 512; CREATE TABLE t(x integer);")
            .unwrap();
        for i in 1..=128i64 {
            conn.execute("INSERT INTO t VALUES (?1)", [i]).unwrap();
        }
    });

    // Dense, ordered page vector.
    for (i, page) in storage.pages().iter().enumerate() {
        assert_eq!(page.page_no().index(), i);
    }

    let total = u32::try_from(storage.pages().len()).unwrap();
    for page in storage.pages() {
        // Table pages decode exactly cell_count rows unless truncated.
        if page.kind().is_table() && !page.truncated() {
            assert_eq!(usize::from(page.cell_count()), page.rows().len());
        }
        // Child links stay inside the file.
        for child in page.children() {
            assert!(child.get() >= 1 && child.get() <= total);
        }
        // Interior-table child lists cover every row plus the rightmost.
        if page.kind() == PageKind::InteriorTable {
            assert_eq!(page.children().len(), page.rows().len() + 1);
        }
    }

    // The in-header page count matches the decoded page vector.
    assert_eq!(storage.header().page_count as usize, storage.pages().len());
}

#[test]
fn header_fields_surface_sqlite_metadata() {
    let (_dir, storage) = fixture(|conn| {
        conn.execute_batch(
            "PRAGMA application_id = -559038737;
             CREATE TABLE t(x integer);",
        )
        .unwrap();
    });

    let header = storage.header();
    assert_eq!(header.application_id, 0xDEAD_BEEF);
    assert_eq!(header.text_encoding, litescan::TextEncoding::Utf8);
    assert_eq!(header.schema_format, 4);
    assert_eq!(header.payload_max_fraction, 64);
    assert_eq!(header.payload_min_fraction, 32);
    assert_eq!(header.payload_leaf_fraction, 32);
    assert!(header.sqlite_version >= 3_000_000);
    assert_eq!(header.reserved, [0u8; 20]);
}

#[test]
fn storage_keeps_the_source_path() {
    let (dir, storage) = fixture(|conn| {
        conn.execute_batch("CREATE TABLE t(x integer);").unwrap();
    });
    assert_eq!(storage.path(), dir.path().join("fixture.db"));
}
