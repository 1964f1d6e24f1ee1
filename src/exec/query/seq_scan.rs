use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    catalog::{page::FileId, schema::Schema},
    error::{DbResult, Error},
    exec::{
        operations::{heap::HeapFileIterator, DbFileIterator},
        query::OpIterator,
        tuple::Tuple,
        QueryCtx,
    },
    tx::TransactionId,
};

/// A sequential scan over a table: yields every tuple in the order it is laid
/// out on disk.
///
/// The scan's schema is the table's, with each field renamed to
/// `<alias>.<field>`, which keeps field names unambiguous when several tables
/// are combined.
pub struct SeqScan {
    tid: TransactionId,
    table_id: FileId,
    table_name: String,
    alias: Option<String>,
    schema: Arc<Schema>,
    /// `Some` while open.
    iter: Option<HeapFileIterator>,
}

impl SeqScan {
    /// Creates a scan over the given table, aliased by the table name.
    pub fn new(ctx: &QueryCtx<'_>, tid: TransactionId, table_id: FileId) -> DbResult<Self> {
        let table_name = ctx.catalog.table_name(table_id)?;
        let alias = table_name.clone();
        Self::build(ctx, tid, table_id, table_name, Some(alias))
    }

    /// Creates a scan over the given table with an explicit alias. A missing
    /// alias renders as `null` in field names.
    pub fn with_alias(
        ctx: &QueryCtx<'_>,
        tid: TransactionId,
        table_id: FileId,
        alias: Option<&str>,
    ) -> DbResult<Self> {
        let table_name = ctx.catalog.table_name(table_id)?;
        Self::build(ctx, tid, table_id, table_name, alias.map(ToOwned::to_owned))
    }

    fn build(
        ctx: &QueryCtx<'_>,
        tid: TransactionId,
        table_id: FileId,
        table_name: String,
        alias: Option<String>,
    ) -> DbResult<Self> {
        let schema = ctx.catalog.tuple_schema(table_id)?;
        let schema = Arc::new(schema.qualified(alias.as_deref()));

        Ok(SeqScan {
            tid,
            table_id,
            table_name,
            alias,
            schema,
            iter: None,
        })
    }

    /// Rebinds the scan to another table (and alias), returning the new,
    /// closed scan. The current scan is closed and consumed.
    pub fn reset(
        mut self,
        ctx: &QueryCtx<'_>,
        table_id: FileId,
        alias: Option<&str>,
    ) -> DbResult<Self> {
        self.close();
        Self::with_alias(ctx, self.tid, table_id, alias)
    }

    /// Returns the id of the scanned table.
    pub fn table_id(&self) -> FileId {
        self.table_id
    }

    /// Returns the catalog name of the scanned table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the alias of the scanned table.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Checks whether the scan is open.
    pub fn is_open(&self) -> bool {
        self.iter.is_some()
    }

    fn iter(&mut self) -> DbResult<&mut HeapFileIterator> {
        self.iter.as_mut().ok_or(Error::NotOpen)
    }
}

impl OpIterator for SeqScan {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[instrument(name = "SeqScan", level = "debug", skip_all, fields(table = %self.table_name))]
    fn open(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()> {
        if self.iter.is_some() {
            return Err(Error::AlreadyOpen);
        }
        let file = ctx.catalog.database_file(self.table_id)?;
        let mut iter = file.iterator(self.tid);
        iter.open(ctx)?;
        debug!("scan opened");
        self.iter = Some(iter);
        Ok(())
    }

    fn has_next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<bool> {
        self.iter()?.has_next(ctx)
    }

    fn next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<Tuple> {
        self.iter()?.next(ctx)
    }

    fn close(&mut self) {
        if let Some(mut iter) = self.iter.take() {
            iter.close();
        }
    }
}
