use std::sync::Arc;

use crate::{
    catalog::{page::FileId, Catalog, TableRegistry},
    error::DbResult,
    exec::{query::OpIterator, tuple::Tuple, QueryCtx},
    io::{heap_file::HeapFile, pager::Pager},
};

/// A `heapdb` database instance: an in-memory table registry plus a pager
/// reading through it.
pub struct Db {
    catalog: Arc<TableRegistry>,
    pager: Pager,
}

impl Db {
    /// Creates an empty database with the default pager capacity.
    pub fn new() -> Self {
        let catalog = Arc::new(TableRegistry::new());
        let pager = Pager::new(Arc::clone(&catalog) as Arc<dyn Catalog>);
        Db { catalog, pager }
    }

    /// Creates an empty database whose pager holds up to `pages` pages.
    pub fn with_cache_pages(pages: usize) -> Self {
        let catalog = Arc::new(TableRegistry::new());
        let pager = Pager::with_capacity(Arc::clone(&catalog) as Arc<dyn Catalog>, pages);
        Db { catalog, pager }
    }

    /// Registers `file` under `name` (see [`TableRegistry::add_table`]),
    /// dropping whatever the pager cached for a previous definition of the
    /// same file.
    pub fn add_table(&self, file: HeapFile, name: impl Into<String>) -> DbResult<FileId> {
        let id = self.catalog.add_table(file, name)?;
        self.pager.evict_file(id);
        Ok(id)
    }

    /// Returns the table registry.
    pub fn catalog(&self) -> &TableRegistry {
        &self.catalog
    }

    /// Returns the database pager.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Returns a query context over this database.
    pub fn ctx(&self) -> QueryCtx<'_> {
        QueryCtx {
            catalog: &*self.catalog,
            pager: &self.pager,
        }
    }

    /// Runs the given operator to completion, passing each produced tuple to
    /// the callback. The operator is opened beforehand and closed afterwards,
    /// even if the callback fails.
    pub fn execute<O, E, F>(&self, op: &mut O, mut f: F) -> DbResult<Result<(), E>>
    where
        O: OpIterator + ?Sized,
        F: FnMut(Tuple) -> Result<(), E>,
    {
        let ctx = self.ctx();
        op.open(&ctx)?;
        let result = drain(op, &ctx, &mut f);
        op.close();
        result
    }
}

fn drain<O, E, F>(op: &mut O, ctx: &QueryCtx<'_>, f: &mut F) -> DbResult<Result<(), E>>
where
    O: OpIterator + ?Sized,
    F: FnMut(Tuple) -> Result<(), E>,
{
    while op.has_next(ctx)? {
        if let error @ Err(_) = f(op.next(ctx)?) {
            return Ok(error);
        }
    }
    Ok(Ok(()))
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}
