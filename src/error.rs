use std::{borrow::Cow, io};

use crate::{
    catalog::page::{FileId, PageId},
    tx::TransactionId,
};

pub type DbResult<T, E = Error> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A schema was built with a contract violation (e.g. no fields).
    #[error("invalid schema: {0}")]
    InvalidSchema(Cow<'static, str>),

    /// A schema lookup by index or by name found nothing.
    #[error("no such field: {0}")]
    NoSuchField(String),

    /// `open` was called on an iterator (or operator) that is already open.
    #[error("iterator is already open")]
    AlreadyOpen,

    /// The iterator (or operator) must be opened before use.
    #[error("iterator is not open")]
    NotOpen,

    /// `next` was called on an exhausted iterator.
    #[error("no more tuples")]
    NoSuchElement,

    /// The given page ID was out of bounds of the heap file.
    #[error("page out of bounds ({0:?})")]
    PageOutOfBounds(PageId),

    /// A caller passed an argument that doesn't belong to the callee (e.g. a
    /// page id of another file).
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// The raw page bytes don't decode under the file's schema.
    #[error("corrupt page ({page_id:?}): {reason}")]
    CorruptPage {
        page_id: PageId,
        reason: Cow<'static, str>,
    },

    /// Read an incomplete raw page, i.e., read less than a page worth of bytes.
    #[error("incomplete page ({0:?})")]
    ReadIncompletePage(PageId),

    /// The catalog doesn't know about the given table.
    #[error("no such table ({0:?})")]
    NoSuchTable(FileId),

    /// Two distinct paths derived the same file id.
    #[error("file id {id:?} of `{path}` collides with an already registered file")]
    FileIdCollision { id: FileId, path: String },

    /// The buffer pool can't hold any page.
    #[error("buffer pool is full")]
    BufferPoolFull,

    /// The transaction was aborted by the buffer pool (e.g., on a lock
    /// conflict). Never produced by the storage layer itself.
    #[error("transaction {0:?} aborted")]
    TransactionAborted(TransactionId),

    /// Operation not supported by this file implementation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A generic IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Checks whether the error is operational (I/O, aborts, resource
    /// exhaustion), as opposed to a violation of some API contract. Only
    /// operational errors make sense to retry at the transaction level.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::ReadIncompletePage(_)
                | Error::TransactionAborted(_)
                | Error::BufferPoolFull
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operational_errors() {
        let tid = TransactionId::new();
        assert!(Error::TransactionAborted(tid).is_operational());
        assert!(Error::Io(io::ErrorKind::Other.into()).is_operational());
        assert!(!Error::NotOpen.is_operational());
        assert!(!Error::NoSuchField("x".into()).is_operational());
        assert!(!Error::PageOutOfBounds(PageId::new(FileId::new(1), 3)).is_operational());
    }
}
