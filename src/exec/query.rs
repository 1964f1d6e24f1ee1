use std::sync::Arc;

use crate::{
    catalog::schema::Schema,
    error::DbResult,
    exec::{tuple::Tuple, QueryCtx},
};

mod seq_scan;
pub use seq_scan::*;

/// Query operator trait. It is implemented by all database operators.
///
/// The database execution is based on the iterator model: operators are
/// opened, then `next` may be called arbitrarily to lazily fetch tuples
/// without running out of memory, and finally they are closed.
pub trait OpIterator {
    /// Returns the schema of the tuples produced by this operator.
    fn schema(&self) -> &Arc<Schema>;

    /// Opens the operator.
    fn open(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()>;

    /// Checks whether there are more tuples.
    fn has_next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<bool>;

    /// Produces the next tuple.
    fn next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<Tuple>;

    /// Restarts the operator from its first tuple.
    fn rewind(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()> {
        self.close();
        self.open(ctx)
    }

    /// Closes the operator.
    fn close(&mut self);
}
