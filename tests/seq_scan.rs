use std::{fs::OpenOptions, io::Write, sync::Arc};

use heapdb::{
    catalog::{
        page::{FileId, PageId},
        schema::Schema,
        ty::Type,
    },
    error::{DbResult, Error},
    exec::{
        query::{OpIterator, SeqScan},
        value::Value,
    },
    io::{heap_file::HeapFile, pager::BufferPool},
    tx::{Permissions, TransactionId},
    Db,
};

mod test_utils;
use test_utils::{add_table, drain_ids, people_rows, people_schema};

fn field_names(schema: &Schema) -> Vec<String> {
    (0..schema.field_count())
        .map(|i| {
            schema
                .field_name(i)
                .unwrap()
                .unwrap_or("<none>")
                .to_owned()
        })
        .collect()
}

#[test]
fn test_scan_schema_is_aliased() -> DbResult<()> {
    let db = Db::new();
    let (people, _f1) = add_table(&db, "people", people_schema(), people_rows(3), 4096)?;
    let (other, _f2) = add_table(&db, "other", people_schema(), people_rows(0), 4096)?;
    let ctx = db.ctx();
    let tid = TransactionId::new();

    let scan = SeqScan::with_alias(&ctx, tid, people, Some("t"))?;
    assert_eq!(field_names(scan.schema()), ["t.id", "t.name"]);
    assert_eq!(scan.table_name(), "people");
    assert_eq!(scan.alias(), Some("t"));

    let scan = scan.reset(&ctx, other, Some("u"))?;
    assert_eq!(field_names(scan.schema()), ["u.id", "u.name"]);
    assert_eq!(scan.table_id(), other);
    assert_eq!(scan.table_name(), "other");

    let scan = SeqScan::new(&ctx, tid, people)?;
    assert_eq!(field_names(scan.schema()), ["people.id", "people.name"]);

    let scan = SeqScan::with_alias(&ctx, tid, people, None)?;
    assert_eq!(field_names(scan.schema()), ["null.id", "null.name"]);
    assert_eq!(scan.schema().field_type(1)?, Type::Text);

    Ok(())
}

#[test]
fn test_unnamed_fields_are_aliased_as_null() -> DbResult<()> {
    let db = Db::new();
    let schema = Schema::unnamed(vec![Type::Int])?;
    let (table, _f) = add_table(&db, "anon", schema, vec![vec![Value::Int(7)]], 4096)?;
    let ctx = db.ctx();

    let scan = SeqScan::with_alias(&ctx, TransactionId::new(), table, Some("a"))?;
    assert_eq!(field_names(scan.schema()), ["a.null"]);

    Ok(())
}

#[test]
fn test_full_scan_over_many_pages() -> DbResult<()> {
    test_utils::setup_tracing(None);

    let db = Db::new();
    // 30 tuples per page; 100 rows span 4 pages.
    let (table, _f) = add_table(&db, "people", people_schema(), people_rows(100), 4096)?;
    let ctx = db.ctx();

    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
    scan.open(&ctx)?;
    let expected: Vec<i32> = (0..100).collect();
    assert_eq!(drain_ids(&mut scan, &ctx)?, expected);
    assert!(!scan.has_next(&ctx)?);
    assert!(matches!(scan.next(&ctx), Err(Error::NoSuchElement)));

    scan.rewind(&ctx)?;
    assert_eq!(drain_ids(&mut scan, &ctx)?, expected);
    scan.close();

    Ok(())
}

#[test]
fn test_scanned_tuples_carry_table_values() -> DbResult<()> {
    let db = Db::new();
    let (table, _f) = add_table(&db, "people", people_schema(), people_rows(2), 4096)?;
    let ctx = db.ctx();

    let mut scan = SeqScan::with_alias(&ctx, TransactionId::new(), table, Some("p"))?;
    scan.open(&ctx)?;
    let tuple = scan.next(&ctx)?;
    assert_eq!(tuple.get(1)?, &Value::Text("person-0".into()));
    assert_eq!(tuple.to_string(), "0\tperson-0");
    let record_id = tuple.record_id().unwrap();
    assert_eq!(record_id.page_id().page_number(), 0);
    assert_eq!(record_id.slot(), 0);

    Ok(())
}

#[test]
fn test_scan_lifecycle_errors() -> DbResult<()> {
    let db = Db::new();
    let (table, _f) = add_table(&db, "people", people_schema(), people_rows(1), 4096)?;
    let ctx = db.ctx();

    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
    assert!(!scan.is_open());
    assert!(matches!(scan.has_next(&ctx), Err(Error::NotOpen)));
    assert!(matches!(scan.next(&ctx), Err(Error::NotOpen)));

    scan.open(&ctx)?;
    assert!(matches!(scan.open(&ctx), Err(Error::AlreadyOpen)));
    assert!(scan.is_open());

    scan.close();
    scan.close();
    assert!(matches!(scan.next(&ctx), Err(Error::NotOpen)));

    // Rewinding a closed scan opens it.
    scan.rewind(&ctx)?;
    assert_eq!(drain_ids(&mut scan, &ctx)?, [0]);

    Ok(())
}

#[test]
fn test_scan_of_unknown_table() {
    let db = Db::new();
    let ctx = db.ctx();
    let missing = FileId::new(42);

    assert!(matches!(
        SeqScan::new(&ctx, TransactionId::new(), missing),
        Err(Error::NoSuchTable(id)) if id == missing
    ));
}

#[test]
fn test_scan_of_empty_table() -> DbResult<()> {
    let db = Db::new();
    let (table, _f) = add_table(&db, "empty", people_schema(), people_rows(0), 4096)?;
    let ctx = db.ctx();

    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
    scan.open(&ctx)?;
    assert!(!scan.has_next(&ctx)?);
    assert!(matches!(scan.next(&ctx), Err(Error::NoSuchElement)));

    Ok(())
}

#[test]
fn test_execute() -> DbResult<()> {
    let db = Db::new();
    let (table, _f) = add_table(&db, "people", people_schema(), people_rows(50), 4096)?;
    let ctx = db.ctx();
    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;

    let mut seen = Vec::new();
    db.execute(&mut scan, |tuple| {
        seen.push(tuple.values()[0].as_int().unwrap());
        Ok::<_, ()>(())
    })?
    .unwrap();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
    assert!(!scan.is_open());

    // The callback may stop the run early; the scan is closed anyway.
    let mut count = 0;
    let result = db.execute(&mut scan, |_| {
        count += 1;
        if count == 5 {
            Err("enough")
        } else {
            Ok(())
        }
    })?;
    assert_eq!(result, Err("enough"));
    assert_eq!(count, 5);
    assert!(!scan.is_open());

    Ok(())
}

#[test]
fn test_concurrent_scans() -> DbResult<()> {
    let db = Db::with_cache_pages(2);
    let (table, _f) = add_table(&db, "people", people_schema(), people_rows(200), 4096)?;
    let expected: Vec<i32> = (0..200).collect();

    let db = &db;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || -> DbResult<Vec<i32>> {
                    let ctx = db.ctx();
                    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
                    scan.open(&ctx)?;
                    drain_ids(&mut scan, &ctx)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), expected);
        }
    });

    Ok(())
}

#[test]
fn test_scan_sees_replaced_schema() -> DbResult<()> {
    let db = Db::new();
    let (table, file) = add_table(&db, "people", people_schema(), people_rows(1), 4096)?;

    let renamed = Schema::new(
        vec![Type::Int, Type::Text],
        vec![Some("key"), Some("label")],
    )?;
    let heap_file = HeapFile::new(file.path(), Arc::new(renamed))?;
    assert_eq!(db.add_table(heap_file, "people")?, table);

    let ctx = db.ctx();
    let scan = SeqScan::with_alias(&ctx, TransactionId::new(), table, Some("p"))?;
    assert_eq!(field_names(scan.schema()), ["p.key", "p.label"]);

    Ok(())
}

fn pairs_schema() -> Schema {
    Schema::new(vec![Type::Int, Type::Int], vec![Some("a"), Some("b")]).unwrap()
}

fn pairs_rows(n: i32) -> Vec<Vec<Value>> {
    (0..n).map(|i| vec![Value::Int(i), Value::Int(-i)]).collect()
}

/// Scans the whole table, checking every tuple against the scan's schema.
fn scan_widths(db: &Db, table: FileId) -> DbResult<Vec<usize>> {
    let ctx = db.ctx();
    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
    let expected = Arc::clone(scan.schema());
    let fields = expected.field_count();
    let mut widths = Vec::new();
    db.execute(&mut scan, |tuple| {
        assert_eq!(**tuple.schema(), *expected);
        widths.push(tuple.values().len());
        Ok::<_, ()>(())
    })?
    .unwrap();
    assert!(widths.iter().all(|&width| width == fields));
    Ok(widths)
}

#[test]
fn test_redefined_table_is_not_served_from_stale_pages() -> DbResult<()> {
    let db = Db::new();
    let (table, file) = add_table(&db, "pairs", pairs_schema(), pairs_rows(3), 4096)?;
    assert_eq!(scan_widths(&db, table)?, [2, 2, 2]);
    assert_eq!(db.pager().cached_pages(), 1);

    let ints = Arc::new(Schema::unnamed(vec![Type::Int])?);
    assert_eq!(db.add_table(HeapFile::new(file.path(), ints)?, "pairs")?, table);
    assert_eq!(db.pager().cached_pages(), 0);

    let widths = scan_widths(&db, table)?;
    assert!(!widths.is_empty());
    assert!(widths.iter().all(|&width| width == 1));

    Ok(())
}

#[test]
fn test_registry_redefinition_bypassing_db_reloads_pages() -> DbResult<()> {
    let db = Db::new();
    let (table, file) = add_table(&db, "pairs", pairs_schema(), pairs_rows(3), 4096)?;
    scan_widths(&db, table)?;
    let stale = db
        .pager()
        .get_page(TransactionId::new(), PageId::new(table, 0), Permissions::ReadOnly)?;

    let ints = Arc::new(Schema::unnamed(vec![Type::Int])?);
    db.catalog()
        .add_table(HeapFile::new(file.path(), ints)?, "pairs")?;

    let fresh = db
        .pager()
        .get_page(TransactionId::new(), PageId::new(table, 0), Permissions::ReadOnly)?;
    assert!(!Arc::ptr_eq(&stale, &fresh));
    assert_eq!(fresh.schema().field_count(), 1);
    assert!(scan_widths(&db, table)?.iter().all(|&width| width == 1));

    Ok(())
}

#[test]
fn test_trailing_partial_page_fails_the_scan() -> DbResult<()> {
    let db = Db::new();
    let (table, file) = add_table(&db, "people", people_schema(), people_rows(30), 4096)?;
    let mut raw = OpenOptions::new().append(true).open(file.path())?;
    raw.write_all(&[0; 100])?;

    let ctx = db.ctx();
    let mut scan = SeqScan::new(&ctx, TransactionId::new(), table)?;
    scan.open(&ctx)?;
    // The whole first page is served before the partial one is reached.
    for expected in 0..30 {
        assert_eq!(scan.next(&ctx)?.values()[0], Value::Int(expected));
    }
    let partial = PageId::new(table, 1);
    assert!(matches!(
        scan.has_next(&ctx),
        Err(Error::PageOutOfBounds(id)) if id == partial
    ));

    Ok(())
}
