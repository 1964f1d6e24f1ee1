use crate::{
    error::DbResult,
    exec::{tuple::Tuple, QueryCtx},
};

pub mod heap {
    mod file_iter;
    pub use file_iter::*;
}

/// A cursor over every tuple of a file.
///
/// Iterators start closed. Once opened, `has_next`/`next` lazily walk the
/// tuples; `rewind` starts over and `close` releases the current page.
pub trait DbFileIterator {
    /// Opens the iterator, positioning it before the first tuple.
    fn open(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()>;

    /// Checks whether there are more tuples.
    fn has_next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<bool>;

    /// Returns the next tuple, failing with
    /// [`Error::NoSuchElement`](crate::error::Error::NoSuchElement) if there is
    /// none.
    fn next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<Tuple>;

    /// Restarts the iteration from the first tuple. Same as a `close`
    /// followed by an `open`.
    fn rewind(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()> {
        self.close();
        self.open(ctx)
    }

    /// Closes the iterator. Closing a closed iterator does nothing.
    fn close(&mut self);
}
