#![allow(dead_code)]

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use heapdb::{
    catalog::{page::FileId, schema::Schema, ty::Type},
    error::DbResult,
    exec::{query::OpIterator, value::Value, QueryCtx},
    io::{encoder::HeapFileEncoder, heap_file::HeapFile},
    Db,
};

/// Sets up tracing subscriber. Safe to call more than once.
pub fn setup_tracing(level: Option<&str>) {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or("warn".into()));
    let fmt_layer = layer()
        .with_test_writer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

/// A temporary file, removed on drop.
pub struct TestFile(PathBuf);

impl TestFile {
    /// Creates a file with the given raw contents.
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let path = test_path();
        fs::write(&path, bytes).unwrap();
        TestFile(path)
    }

    /// Creates a heap file holding the given rows, packed into pages.
    pub fn with_rows(schema: &Schema, rows: Vec<Vec<Value>>, page_size: usize) -> Self {
        let path = test_path();
        let out = BufWriter::new(File::create(&path).unwrap());
        HeapFileEncoder::with_page_size(schema, page_size)
            .encode(rows.into_iter().map(Ok), out)
            .unwrap();
        TestFile(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

/// Generates a unique path for a test file.
fn test_path() -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(1);

    let id = COUNTER.fetch_add(1, Ordering::AcqRel);
    let dir = std::env::temp_dir().join("heapdb-tests");
    fs::create_dir_all(&dir).unwrap();
    dir.join(format!("{}-{id}-test.dat", std::process::id()))
}

/// `{id: int, name: string}`.
pub fn people_schema() -> Schema {
    Schema::new(vec![Type::Int, Type::Text], vec![Some("id"), Some("name")]).unwrap()
}

/// Rows `(i, "person-i")` for `i` in `0..n`.
pub fn people_rows(n: i32) -> Vec<Vec<Value>> {
    (0..n)
        .map(|i| vec![Value::Int(i), Value::Text(format!("person-{i}"))])
        .collect()
}

/// Registers a heap file with the given rows in `db`, returning its table id.
/// The backing file must outlive the table.
pub fn add_table(
    db: &Db,
    name: &str,
    schema: Schema,
    rows: Vec<Vec<Value>>,
    page_size: usize,
) -> DbResult<(FileId, TestFile)> {
    let file = TestFile::with_rows(&schema, rows, page_size);
    let heap_file = HeapFile::with_page_size(file.path(), Arc::new(schema), page_size)?;
    let id = db.add_table(heap_file, name)?;
    Ok((id, file))
}

/// Drains an operator, returning the first field of each tuple as an int.
pub fn drain_ids(op: &mut dyn OpIterator, ctx: &QueryCtx<'_>) -> DbResult<Vec<i32>> {
    let mut ids = Vec::new();
    while op.has_next(ctx)? {
        ids.push(op.next(ctx)?.values()[0].as_int().unwrap());
    }
    Ok(ids)
}

