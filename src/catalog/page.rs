use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    path::Path,
};

/// The heap page definition.
mod heap;
pub use heap::*;

/// Identifies a heap file (and thus the table stored in it).
///
/// File ids are derived by hashing the file's canonical path. Two handles over
/// the same file always derive the same id, which the buffer pool relies on to
/// find cached pages. Distinct paths may still hash to the same id; the
/// [`TableRegistry`](crate::catalog::TableRegistry) refuses to register such a
/// pair instead of silently mixing their pages up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FileId(u64);

impl FileId {
    /// Constructs a [`FileId`] from its raw value.
    pub const fn new(id: u64) -> Self {
        FileId(id)
    }

    /// Derives the file id of the given (canonical) path.
    pub fn from_path(canonical: &Path) -> Self {
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        FileId(hasher.finish())
    }

    /// Returns the underlying id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Identifies a page within a heap file.
///
/// Page numbers are 0-based: page `n` occupies the byte range
/// `[n * page_size, (n + 1) * page_size)` of its file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageId {
    file_id: FileId,
    page_number: u32,
}

impl PageId {
    /// Constructs a new [`PageId`].
    pub fn new(file_id: FileId, page_number: u32) -> Self {
        PageId {
            file_id,
            page_number,
        }
    }

    /// Returns the id of the file that owns the page.
    pub fn file_id(self) -> FileId {
        self.file_id
    }

    /// Returns the 0-based page number.
    pub fn page_number(self) -> u32 {
        self.page_number
    }

    /// Returns the byte offset of the page, used in disk seek operations.
    #[inline]
    pub fn offset(self, page_size: usize) -> u64 {
        u64::from(self.page_number).saturating_mul(page_size as u64)
    }
}
