use std::fmt;

use crate::{
    config::STRING_LEN,
    error::{DbResult, Error},
    exec::value::Value,
};

/// Field types. Every type has a fixed on-disk width, so tuples of a given
/// [`Schema`](crate::catalog::schema::Schema) all share the same size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A 4-byte big-endian signed integer.
    Int,
    /// A text value, stored as a 4-byte length followed by exactly
    /// [`STRING_LEN`] bytes (zero-padded).
    Text,
}

impl Type {
    /// Returns the size (in bytes) of a serialized value of this type.
    pub const fn size(self) -> usize {
        match self {
            Type::Int => 4,
            Type::Text => 4 + STRING_LEN,
        }
    }

    /// Returns the canonical type name.
    pub fn name(self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Text => "string",
        }
    }

    /// Parses a type from its canonical name.
    pub fn from_name(name: &str) -> DbResult<Self> {
        match name.trim() {
            "int" => Ok(Type::Int),
            "string" | "text" => Ok(Type::Text),
            other => Err(Error::InvalidArgument(
                format!("unknown type `{other}`").into(),
            )),
        }
    }

    /// Parses the textual representation of a value of this type.
    pub fn parse_value(self, raw: &str) -> DbResult<Value> {
        match self {
            Type::Int => raw
                .trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| Error::InvalidArgument(format!("`{raw}` is not an int").into())),
            Type::Text => {
                let raw = raw.trim();
                if raw.len() > STRING_LEN {
                    return Err(Error::InvalidArgument(
                        format!("text longer than {STRING_LEN} bytes").into(),
                    ));
                }
                Ok(Value::Text(raw.to_owned()))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Int => "INT_TYPE",
            Type::Text => "STRING_TYPE",
        })
    }
}
