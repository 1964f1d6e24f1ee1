use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, instrument};

use crate::{
    catalog::{
        page::{FileId, HeapPage, PageId},
        schema::Schema,
    },
    config::{check_page_size, DEFAULT_PAGE_SIZE},
    error::{DbResult, Error},
    exec::{operations::heap::HeapFileIterator, tuple::Tuple},
    tx::TransactionId,
};

/// The file interface every table representation exposes to the layers above
/// it (buffer pool, scans).
pub trait DbFile: Send + Sync {
    /// Returns the stable id of this file.
    fn id(&self) -> FileId;

    /// Returns the schema of the tuples stored in this file.
    fn schema(&self) -> &Arc<Schema>;

    /// Returns the number of pages in the file, as of now.
    fn page_count(&self) -> DbResult<u32>;

    /// Reads the given page from the disk.
    fn read_page(&self, page_id: PageId) -> DbResult<HeapPage>;

    /// Writes the given page back to the disk.
    fn write_page(&self, page: &HeapPage) -> DbResult<()>;

    /// Inserts a tuple, returning the pages that were modified.
    fn insert_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<Vec<PageId>>;

    /// Deletes a tuple, returning the page that was modified.
    fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<PageId>;
}

/// A table stored as an unordered collection of tuples, laid out in a file of
/// fixed-size [`HeapPage`]s. There is no file header: page `n` simply lives at
/// byte offset `n * page_size`.
///
/// A heap file doesn't keep the file open, nor does it cache pages; every
/// [`DbFile::read_page`] call goes to the disk. Caching is the job of the
/// buffer pool.
#[derive(Debug)]
pub struct HeapFile {
    /// The canonical path of the file.
    path: PathBuf,
    id: FileId,
    schema: Arc<Schema>,
    page_size: usize,
}

impl HeapFile {
    /// Constructs a heap file over an existing file, using the default page
    /// size.
    pub fn new(path: impl AsRef<Path>, schema: Arc<Schema>) -> DbResult<Self> {
        Self::with_page_size(path, schema, DEFAULT_PAGE_SIZE)
    }

    /// Constructs a heap file over an existing file with a custom page size.
    ///
    /// The file id is derived here, once, from the canonical path. Hence, two
    /// `HeapFile`s over the same file (even if reached through different
    /// relative paths or links) share the same id.
    pub fn with_page_size(
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        page_size: usize,
    ) -> DbResult<Self> {
        let page_size = check_page_size(page_size)?;
        let path = fs::canonicalize(path)?;
        let id = FileId::from_path(&path);
        debug!(?path, ?id, "opened heap file");

        Ok(HeapFile {
            path,
            id,
            schema,
            page_size,
        })
    }

    /// Overrides the file id, to simulate hash collisions.
    #[cfg(test)]
    pub(crate) fn with_id(mut self, id: FileId) -> Self {
        self.id = id;
        self
    }

    /// Returns the canonical path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size of this file.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns a new iterator over every tuple of the file, on behalf of the
    /// given transaction. No I/O is performed until the iterator is opened.
    pub fn iterator(self: &Arc<Self>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), tid)
    }
}

impl DbFile for HeapFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn page_count(&self) -> DbResult<u32> {
        let len = fs::metadata(&self.path)?.len();
        let count = len.div_ceil(self.page_size as u64);
        u32::try_from(count).map_err(|_| Error::Unsupported("files with more than u32::MAX pages"))
    }

    #[instrument(level = "debug", skip(self), fields(file_id = ?self.id))]
    fn read_page(&self, page_id: PageId) -> DbResult<HeapPage> {
        if page_id.file_id() != self.id {
            return Err(Error::InvalidArgument(
                format!("page {page_id:?} doesn't belong to file {:?}", self.id).into(),
            ));
        }

        let mut file = File::open(&self.path)?;
        let size = file.metadata()?.len();
        let offset = page_id.offset(self.page_size);
        if offset.saturating_add(self.page_size as u64) > size {
            return Err(Error::PageOutOfBounds(page_id));
        }

        debug!("reading page from disk");
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0; self.page_size];
        if let Err(error) = file.read_exact(&mut buf) {
            // The file may have been truncated since the size check.
            return Err(if error.kind() == io::ErrorKind::UnexpectedEof {
                Error::ReadIncompletePage(page_id)
            } else {
                error.into()
            });
        }

        HeapPage::from_bytes(page_id, &buf, Arc::clone(&self.schema), self.page_size)
    }

    fn write_page(&self, _page: &HeapPage) -> DbResult<()> {
        Err(Error::Unsupported("heap file page write-back"))
    }

    fn insert_tuple(&self, _tid: TransactionId, _tuple: &Tuple) -> DbResult<Vec<PageId>> {
        Err(Error::Unsupported("heap file tuple insertion"))
    }

    fn delete_tuple(&self, _tid: TransactionId, _tuple: &Tuple) -> DbResult<PageId> {
        Err(Error::Unsupported("heap file tuple deletion"))
    }
}
