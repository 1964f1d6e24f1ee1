use crate::{catalog::Catalog, io::pager::BufferPool};

pub mod operations;
pub mod query;
pub mod tuple;
pub mod value;

/// Query execution context.
///
/// Bundles the collaborators every iterator needs (the catalog, to resolve
/// tables, and the buffer pool, to fetch pages). It is passed explicitly to
/// each call instead of living in some global.
#[derive(Copy, Clone)]
pub struct QueryCtx<'a> {
    pub catalog: &'a dyn Catalog,
    pub pager: &'a dyn BufferPool,
}
