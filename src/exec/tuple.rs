use std::{fmt, sync::Arc};

use crate::{
    catalog::{page::PageId, schema::Schema},
    config::STRING_LEN,
    error::{DbResult, Error},
    exec::value::Value,
};

/// The physical location of a tuple: its page and slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    page_id: PageId,
    slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        RecordId { page_id, slot }
    }

    pub fn page_id(self) -> PageId {
        self.page_id
    }

    pub fn slot(self) -> usize {
        self.slot
    }
}

/// A row of values conforming to a [`Schema`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    schema: Arc<Schema>,
    values: Vec<Value>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Constructs a new tuple, checking `values` against `schema`.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> DbResult<Self> {
        Self::check_row(&schema, &values)?;
        Ok(Self::from_parts(schema, values, None))
    }

    /// Constructs a tuple without checking it against the schema.
    pub(crate) fn from_parts(
        schema: Arc<Schema>,
        values: Vec<Value>,
        record_id: Option<RecordId>,
    ) -> Self {
        Tuple {
            schema,
            values,
            record_id,
        }
    }

    /// Checks that `values` has one value of the right type per field.
    pub fn check_row(schema: &Schema, values: &[Value]) -> DbResult<()> {
        if values.len() != schema.field_count() {
            return Err(Error::InvalidArgument(
                format!(
                    "expected {} values, but got {}",
                    schema.field_count(),
                    values.len()
                )
                .into(),
            ));
        }
        for (i, (ty, value)) in schema.types().zip(values).enumerate() {
            if value.ty() != ty {
                return Err(Error::InvalidArgument(
                    format!(
                        "unexpected type for field {i}, expected `{}`, but got `{}`",
                        ty.name(),
                        value.ty().name()
                    )
                    .into(),
                ));
            }
            if let Value::Text(text) = value {
                if text.len() > STRING_LEN {
                    return Err(Error::InvalidArgument(
                        format!("field {i} is longer than {STRING_LEN} bytes").into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the schema the tuple conforms to.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the `i`-th value.
    pub fn get(&self, i: usize) -> DbResult<&Value> {
        self.values
            .get(i)
            .ok_or_else(|| Error::NoSuchField(format!("index {i}")))
    }

    /// Returns all values, in field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the owned values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Returns where the tuple is stored, if it was read from a page.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }
}

/// Tab-separated values.
impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            fmt::Display::fmt(value, f)?;
        }
        Ok(())
    }
}
