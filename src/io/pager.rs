use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, instrument, trace};

use crate::{
    catalog::{
        page::{FileId, HeapPage, PageId},
        Catalog,
    },
    config::DEFAULT_CACHE_PAGES,
    error::{DbResult, Error},
    io::heap_file::{DbFile, HeapFile},
    tx::{Permissions, TransactionId},
};

/// The buffer pool interface consumed by the storage layer.
///
/// Implementations must be thread-safe. A call may block (e.g., waiting for a
/// page lock) and may fail with [`Error::TransactionAborted`], which callers
/// propagate untouched.
pub trait BufferPool: Send + Sync {
    /// Returns the requested page, loading it from its file if needed.
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> DbResult<Arc<HeapPage>>;
}

/// The pager, a simple [`BufferPool`] that keeps up to a fixed number of pages
/// in memory.
///
/// Pages are loaded through the catalog's heap files. Since pages handed out
/// here are never modified, any cached page may be evicted at any time: when
/// the pager is full, an arbitrary page makes room for the new one. Page
/// locking and transactions are not handled, so `get_page` never aborts.
///
/// A cached page is only served while the catalog still maps its file id to
/// the very [`HeapFile`] it was decoded through. Once a table is redefined
/// (e.g., with another schema), its stale pages are reloaded.
pub struct Pager {
    catalog: Arc<dyn Catalog>,
    capacity: usize,
    pages: DashMap<PageId, CachedPage>,
}

struct CachedPage {
    file: Arc<HeapFile>,
    page: Arc<HeapPage>,
}

impl Pager {
    /// Constructs a new pager holding up to [`DEFAULT_CACHE_PAGES`] pages.
    pub fn new(catalog: Arc<dyn Catalog>) -> Pager {
        Self::with_capacity(catalog, DEFAULT_CACHE_PAGES)
    }

    /// Constructs a new pager holding up to `capacity` pages.
    pub fn with_capacity(catalog: Arc<dyn Catalog>, capacity: usize) -> Pager {
        Pager {
            catalog,
            capacity,
            pages: DashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }

    /// Checks whether the given page is cached.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.pages.contains_key(&page_id)
    }

    /// Drops the given page from the cache, if present.
    pub fn evict(&self, page_id: PageId) {
        self.pages.remove(&page_id);
    }

    /// Drops every cached page of the given file.
    pub fn evict_file(&self, file_id: FileId) {
        self.pages.retain(|page_id, _| page_id.file_id() != file_id);
    }

    /// Drops every cached page.
    pub fn clear(&self) {
        self.pages.clear();
    }

    fn evict_any(&self) {
        let victim = self.pages.iter().map(|entry| *entry.key()).next();
        if let Some(page_id) = victim {
            trace!(?page_id, "evicting page");
            self.pages.remove(&page_id);
        }
    }
}

impl BufferPool for Pager {
    #[instrument(level = "debug", skip(self))]
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> DbResult<Arc<HeapPage>> {
        let file = self.catalog.database_file(page_id.file_id())?;
        if let Some(cached) = self.pages.get(&page_id) {
            if Arc::ptr_eq(&cached.file, &file) {
                trace!("cache hit");
                return Ok(Arc::clone(&cached.page));
            }
            trace!("cached page is stale");
        }
        if self.capacity == 0 {
            return Err(Error::BufferPoolFull);
        }

        debug!("cache miss, loading page");
        let page = Arc::new(file.read_page(page_id)?);

        while self.pages.len() >= self.capacity {
            self.evict_any();
        }
        // Another thread may have loaded the same page meanwhile; keep theirs
        // unless it is stale too.
        let page = match self.pages.entry(page_id) {
            Entry::Occupied(mut entry) => {
                if !Arc::ptr_eq(&entry.get().file, &file) {
                    entry.insert(CachedPage { file, page });
                }
                Arc::clone(&entry.get().page)
            }
            Entry::Vacant(entry) => Arc::clone(&entry.insert(CachedPage { file, page }).page),
        };
        Ok(page)
    }
}
