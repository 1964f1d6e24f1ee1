use crate::error::{DbResult, Error};

/// The default page size, shared by every heap file unless overridden.
pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024;

/// The largest accepted page size (16 MiB).
pub const MAX_PAGE_SIZE: usize = 16 * 1024 * 1024;

/// Maximum length, in bytes, of a text field. Text fields always occupy this
/// many bytes on disk (plus a 4-byte length prefix).
pub const STRING_LEN: usize = 128;

/// The default number of pages kept by the [`crate::io::pager::Pager`].
pub const DEFAULT_CACHE_PAGES: usize = 50;

/// Checks that `page_size` is within `1..=MAX_PAGE_SIZE`, returning it.
pub fn check_page_size(page_size: usize) -> DbResult<usize> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::InvalidArgument(
            format!("page size must be between 1 and {MAX_PAGE_SIZE} bytes, got {page_size}")
                .into(),
        ));
    }
    Ok(page_size)
}
