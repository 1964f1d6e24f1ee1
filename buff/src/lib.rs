use std::fmt;

mod impls;

/// Represents a type that may be serialized to bytes and deserialized from
/// bytes.
pub trait AsBytes: Sized {
    /// The serialized representation.
    type Repr;

    /// Serializes the type to its byte representation.
    fn serialize(&self) -> Self::Repr;

    /// Deserializes the byte representation to its corresponding type.
    fn deserialize(src: Self::Repr) -> Self;
}

/// A fixed-size, writable buffer (buff, aka. buf fixed).
///
/// # Panics
///
/// All `write*` methods panic if there is not enough capacity. Callers are
/// expected to size the buffer beforehand (e.g., one page).
pub struct Buff<'a> {
    inner: &'a mut [u8],
    offset: usize,
}

impl<'a> Buff<'a> {
    /// Creates a new fixed-size buffer, `Buff`.
    pub fn new(inner: &'a mut [u8]) -> Buff<'a> {
        Buff { inner, offset: 0 }
    }

    /// Returns the underlying buffer.
    pub fn get(&self) -> &[u8] {
        self.inner
    }

    /// Returns the buffer capacity.
    pub fn capacity(&self) -> usize {
        self.inner.len()
    }

    /// Returns the remaining available bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Returns the current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Changes the underlying cursor offset position.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Writes the type represented by [`AsBytes`].
    pub fn write<T>(&mut self, src: T)
    where
        T: AsBytes,
        T::Repr: AsRef<[u8]>,
    {
        let data = src.serialize();
        self.write_slice(data.as_ref());
    }

    /// Writes the byte sequence into the buffer, starting at the current
    /// offset.
    pub fn write_slice(&mut self, src: &[u8]) {
        self.slice_to(src.len()).copy_from_slice(src);
    }

    /// Writes `count` times the given byte.
    pub fn write_bytes(&mut self, count: usize, val: u8) {
        self.slice_to(count).fill(val);
    }

    /// Fills the rest of the buffer with the given byte.
    pub fn pad_end_bytes(&mut self, val: u8) {
        let rem = self.remaining();
        self.write_bytes(rem, val);
    }

    /// Creates a scope in which exactly `count` bytes must be written. This
    /// method shall be used as a sanity check scope.
    ///
    /// # Panics
    ///
    /// Panics if the scope didn't write `count` bytes. Notice that the panic
    /// message shall not be considered stable.
    pub fn scoped_exact<F, R>(&mut self, count: usize, scope: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let start = self.offset;
        let ret = scope(self);
        assert_eq!(self.offset - start, count);
        ret
    }

    #[inline(always)]
    fn slice_to(&mut self, count: usize) -> &mut [u8] {
        let lo = self.offset;
        let hi = lo + count;
        if hi > self.capacity() {
            panic!("not enough capacity for {count} more bytes");
        }
        self.offset = hi;
        &mut self.inner[lo..hi]
    }
}

impl fmt::Debug for Buff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buff")
            .field("offset", &self.offset)
            .field("remaining", &self.remaining())
            .field("capacity", &self.capacity())
            .field("inner", &"<bytes>")
            .finish()
    }
}

/// A read-only cursor over a shared byte slice.
///
/// Unlike [`Buff`], reads never panic: running past the end of the slice
/// yields `None`, so callers decoding untrusted (on-disk) bytes can turn an
/// overrun into a proper error.
#[derive(Clone)]
pub struct BuffReader<'a> {
    inner: &'a [u8],
    offset: usize,
}

impl<'a> BuffReader<'a> {
    /// Creates a new reader positioned at the start of `inner`.
    pub fn new(inner: &'a [u8]) -> BuffReader<'a> {
        BuffReader { inner, offset: 0 }
    }

    /// Returns the remaining unread bytes.
    pub fn remaining(&self) -> usize {
        self.inner.len() - self.offset
    }

    /// Returns the current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Changes the underlying cursor offset position. Offsets past the end are
    /// clamped to the slice length.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.inner.len());
    }

    /// Reads the type represented by [`AsBytes`], or `None` if fewer than `S`
    /// bytes remain.
    pub fn read<const S: usize, T>(&mut self) -> Option<T>
    where
        T: AsBytes<Repr = [u8; S]>,
    {
        let bytes = self.take(S)?;
        let mut buf = [0; S];
        buf.copy_from_slice(bytes);
        Some(T::deserialize(buf))
    }

    /// Borrows the next `count` bytes and advances past them, or returns `None`
    /// without moving if fewer than `count` bytes remain.
    pub fn take(&mut self, count: usize) -> Option<&'a [u8]> {
        let lo = self.offset;
        let hi = lo.checked_add(count)?;
        let slice = self.inner.get(lo..hi)?;
        self.offset = hi;
        Some(slice)
    }
}

impl fmt::Debug for BuffReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuffReader")
            .field("offset", &self.offset)
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write() {
        let mut orig_buf = [0_u8; 10];

        let mut buf = Buff::new(&mut orig_buf);
        assert_eq!(buf.offset(), 0);

        buf.write(0x01ABCDEF_i32);
        assert_eq!(buf.offset(), 4);
        assert_eq!(buf.remaining(), 6);
        assert_eq!(buf.get(), b"\x01\xAB\xCD\xEF\x00\x00\x00\x00\x00\x00");

        buf.write(0x39C_u16);
        assert_eq!(buf.offset(), 6);
        assert_eq!(buf.get(), b"\x01\xAB\xCD\xEF\x03\x9C\x00\x00\x00\x00");

        buf.write_bytes(2, 3);
        assert_eq!(buf.offset(), 8);
        assert_eq!(buf.get(), b"\x01\xAB\xCD\xEF\x03\x9C\x03\x03\x00\x00");

        buf.pad_end_bytes(7);
        assert_eq!(buf.remaining(), 0);
        assert_eq!(buf.get(), b"\x01\xAB\xCD\xEF\x03\x9C\x03\x03\x07\x07");
    }

    #[test]
    #[should_panic(expected = "not enough capacity for 4 more bytes")]
    fn test_overflow_write() {
        let mut orig_buf = [0; 4];
        let mut buf = Buff::new(&mut orig_buf);

        buf.write(16_i16);
        buf.write(32_i32); // BAM!
    }

    #[test]
    fn test_read() {
        let orig_buf = *b"\x01\xAB\xCD\xEF\x03\x9C\x03\x03\x01\x02";
        let mut buf = BuffReader::new(&orig_buf);

        assert_eq!(buf.read::<4, i32>(), Some(0x01ABCDEF_i32));
        assert_eq!(buf.read::<2, u16>(), Some(0x39C_u16));
        assert_eq!(buf.take(4), Some(&b"\x03\x03\x01\x02"[..]));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_overflow_read_is_none() {
        let orig_buf = [1, 2, 3, 4, 5];
        let mut buf = BuffReader::new(&orig_buf);

        assert_eq!(buf.read::<4, i32>(), Some(0x01020304));
        assert_eq!(buf.read::<4, i32>(), None);
        // A failed read doesn't move the cursor.
        assert_eq!(buf.offset(), 4);
        assert_eq!(buf.read::<1, u8>(), Some(5));
    }

    #[test]
    fn test_seek() {
        let orig_buf = [1, 2, 3, 4];
        let mut buf = BuffReader::new(&orig_buf);

        let a: Option<i32> = buf.read();
        buf.seek(0);
        let b: Option<i32> = buf.read();
        assert_eq!(a, b);

        buf.seek(100);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn scoped_exact_ok() {
        let mut orig_buf = [0; 4];
        let mut buf = Buff::new(&mut orig_buf);

        buf.scoped_exact(2, |buf| buf.write(1_i16));
    }

    #[test]
    #[should_panic]
    fn scoped_exact_panic() {
        let mut orig_buf = [0; 4];
        let mut buf = Buff::new(&mut orig_buf);

        buf.scoped_exact(2, |buf| buf.write(1_i8));
    }
}
