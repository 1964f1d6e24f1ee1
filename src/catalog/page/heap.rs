//! Heap pages store fixed-size tuples in slots, in no particular order.
//!
//! Layout of a page of `page_size` bytes holding tuples of `tuple_size` bytes:
//!
//! ```text
//! +--------------------+--------+--------+-----+--------+---------+
//! | occupancy bitmap   | slot 0 | slot 1 | ... | slot n | padding |
//! | ceil(n / 8) bytes  |        |        |     |        |         |
//! +--------------------+--------+--------+-----+--------+---------+
//! ```
//!
//! where `n = floor(page_size * 8 / (tuple_size * 8 + 1))`, i.e., every slot
//! costs its tuple bytes plus one header bit. Slot `i` is in use iff bit
//! `i % 8` (least significant first) of bitmap byte `i / 8` is set.

use std::{slice, sync::Arc};

use buff::{Buff, BuffReader};
use tracing::{error, trace};

use crate::{
    catalog::{page::PageId, schema::Schema},
    config::check_page_size,
    error::{DbResult, Error},
    exec::{
        tuple::{RecordId, Tuple},
        value::Value,
    },
};

/// An in-memory, decoded heap page.
///
/// Pages are immutable once built; the buffer pool hands them out behind an
/// `Arc`.
#[derive(Debug)]
pub struct HeapPage {
    id: PageId,
    schema: Arc<Schema>,
    slot_count: usize,
    /// The occupancy bitmap, as read from disk.
    header: Vec<u8>,
    /// Tuples of the used slots, in slot order.
    tuples: Vec<Tuple>,
}

impl HeapPage {
    /// Returns how many tuple slots fit in a page.
    pub fn slot_count(page_size: usize, schema: &Schema) -> usize {
        let bits = page_size as u128 * 8;
        (bits / (schema.byte_size() as u128 * 8 + 1)) as usize
    }

    /// Returns the size of the occupancy bitmap for the given slot count.
    pub fn header_size(slot_count: usize) -> usize {
        (slot_count + 7) / 8
    }

    /// Decodes a page from its raw bytes.
    ///
    /// Fails with [`Error::CorruptPage`] if `bytes` isn't exactly `page_size`
    /// long or if some used slot doesn't decode under `schema`.
    pub fn from_bytes(
        id: PageId,
        bytes: &[u8],
        schema: Arc<Schema>,
        page_size: usize,
    ) -> DbResult<Self> {
        if bytes.len() != page_size {
            error!(?id, len = bytes.len(), page_size, "unexpected raw page length");
            return Err(Error::CorruptPage {
                page_id: id,
                reason: format!("expected {page_size} bytes, got {}", bytes.len()).into(),
            });
        }

        let slot_count = Self::slot_count(page_size, &schema);
        let header_size = Self::header_size(slot_count);
        let tuple_size = schema.byte_size();

        let mut buf = BuffReader::new(bytes);
        let header = buf
            .take(header_size)
            .ok_or_else(|| corrupt(id, "truncated header"))?
            .to_vec();

        let mut tuples = Vec::new();
        for slot in (0..slot_count).filter(|&slot| is_set(&header, slot)) {
            buf.seek(header_size + slot * tuple_size);
            let values = schema
                .types()
                .map(|ty| {
                    Value::deserialize(&mut buf, ty).map_err(|reason| {
                        error!(?id, slot, reason, "failed to decode tuple");
                        corrupt(id, reason)
                    })
                })
                .collect::<DbResult<Vec<_>>>()?;
            tuples.push(Tuple::from_parts(
                Arc::clone(&schema),
                values,
                Some(RecordId::new(id, slot)),
            ));
        }
        trace!(?id, tuple_count = tuples.len(), slot_count, "decoded heap page");

        Ok(HeapPage {
            id,
            schema,
            slot_count,
            header,
            tuples,
        })
    }

    /// Encodes the given rows into the raw bytes of a page, filling slots from
    /// the first one.
    ///
    /// Fails if there are more rows than slots or if some row doesn't conform
    /// to the schema.
    pub fn encode(schema: &Schema, rows: &[Vec<Value>], page_size: usize) -> DbResult<Vec<u8>> {
        check_page_size(page_size)?;
        let slot_count = Self::slot_count(page_size, schema);
        if rows.len() > slot_count {
            return Err(Error::InvalidArgument(
                format!("{} rows don't fit in {slot_count} slots", rows.len()).into(),
            ));
        }
        for row in rows {
            Tuple::check_row(schema, row)?;
        }

        let header_size = Self::header_size(slot_count);
        let mut bytes = vec![0; page_size];
        let mut buf = Buff::new(&mut bytes);

        let mut header = vec![0_u8; header_size];
        for slot in 0..rows.len() {
            header[slot / 8] |= 1_u8 << (slot % 8);
        }
        buf.write_slice(&header);

        let tuple_size = schema.byte_size();
        for row in rows {
            buf.scoped_exact(tuple_size, |buf| {
                for value in row {
                    value.serialize(buf);
                }
            });
        }
        buf.pad_end_bytes(0);

        Ok(bytes)
    }

    /// Returns the [`PageId`].
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Returns the schema of the tuples in this page.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the number of slots in this page, used or not.
    pub fn slots(&self) -> usize {
        self.slot_count
    }

    /// Checks whether the given slot holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.slot_count && is_set(&self.header, slot)
    }

    /// Returns the number of tuples in this page.
    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    /// Returns an iterator over the page's tuples, in slot order. Unused slots
    /// are skipped. May be called any number of times.
    pub fn tuples(&self) -> slice::Iter<'_, Tuple> {
        self.tuples.iter()
    }
}

fn is_set(header: &[u8], slot: usize) -> bool {
    header[slot / 8] & (1_u8 << (slot % 8)) != 0
}

fn corrupt(page_id: PageId, reason: &'static str) -> Error {
    Error::CorruptPage {
        page_id,
        reason: reason.into(),
    }
}
