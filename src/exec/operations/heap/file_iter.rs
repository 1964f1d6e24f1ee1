use std::sync::Arc;

use tracing::{instrument, trace};

use crate::{
    catalog::page::{HeapPage, PageId},
    error::{DbResult, Error},
    exec::{operations::DbFileIterator, tuple::Tuple, QueryCtx},
    io::{
        heap_file::{DbFile, HeapFile},
        pager::BufferPool,
    },
    tx::{Permissions, TransactionId},
};

/// Iterates over every tuple of a [`HeapFile`], page after page, in file
/// order and then slot order.
///
/// Pages are fetched through the buffer pool (read-only) when the previous one
/// is exhausted. Pages without tuples are skipped, so an empty page in the
/// middle of the file doesn't end the iteration.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    tid: TransactionId,
    /// `None` while closed.
    state: Option<State>,
}

struct State {
    /// The number of the page to fetch once `cursor` runs out.
    next_page: u32,
    /// The page currently being walked, if any was fetched.
    cursor: Option<PageCursor>,
}

struct PageCursor {
    page: Arc<HeapPage>,
    next: usize,
}

impl PageCursor {
    fn has_remaining(&self) -> bool {
        self.next < self.page.tuple_count()
    }

    fn next(&mut self) -> Option<Tuple> {
        let tuple = self.page.tuples().nth(self.next)?.clone();
        self.next += 1;
        Some(tuple)
    }
}

impl State {
    /// Fetches the next page and moves the cursor to its start.
    fn fetch_next(
        &mut self,
        file: &HeapFile,
        tid: TransactionId,
        pager: &dyn BufferPool,
    ) -> DbResult<()> {
        let page_id = PageId::new(file.id(), self.next_page);
        trace!(?page_id, "loading next page of file");
        let page = pager.get_page(tid, page_id, Permissions::ReadOnly)?;
        self.cursor = Some(PageCursor { page, next: 0 });
        self.next_page += 1;
        Ok(())
    }
}

impl HeapFileIterator {
    /// Constructs a closed iterator. See [`HeapFile::iterator`].
    pub(crate) fn new(file: Arc<HeapFile>, tid: TransactionId) -> Self {
        HeapFileIterator {
            file,
            tid,
            state: None,
        }
    }

    /// Checks whether the iterator is open.
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the number of the page the iterator is positioned on, if open
    /// and some page was fetched.
    pub fn current_page(&self) -> Option<u32> {
        let state = self.state.as_ref()?;
        state.cursor.as_ref()?;
        state.next_page.checked_sub(1)
    }
}

impl DbFileIterator for HeapFileIterator {
    #[instrument(level = "debug", skip_all, fields(file_id = ?self.file.id(), tid = ?self.tid))]
    fn open(&mut self, ctx: &QueryCtx<'_>) -> DbResult<()> {
        if self.state.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let mut state = State {
            next_page: 0,
            cursor: None,
        };
        if self.file.page_count()? > 0 {
            state.fetch_next(&self.file, self.tid, ctx.pager)?;
        } else {
            trace!("empty file");
        }
        self.state = Some(state);
        Ok(())
    }

    fn has_next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<bool> {
        let state = self.state.as_mut().ok_or(Error::NotOpen)?;
        loop {
            if state.cursor.as_ref().is_some_and(PageCursor::has_remaining) {
                return Ok(true);
            }
            if state.next_page >= self.file.page_count()? {
                return Ok(false);
            }
            state.fetch_next(&self.file, self.tid, ctx.pager)?;
        }
    }

    fn next(&mut self, ctx: &QueryCtx<'_>) -> DbResult<Tuple> {
        if !self.has_next(ctx)? {
            return Err(Error::NoSuchElement);
        }
        self.state
            .as_mut()
            .and_then(|state| state.cursor.as_mut())
            .and_then(PageCursor::next)
            .ok_or(Error::NoSuchElement)
    }

    fn close(&mut self) {
        self.state = None;
    }
}
