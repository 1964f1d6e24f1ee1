use std::fmt;

use buff::{Buff, BuffReader};

use crate::{catalog::ty::Type, config::STRING_LEN};

/// A field value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Value {
    /// Returns the corresponding type.
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Text(_) => Type::Text,
        }
    }

    /// Tries to cast the value to an int.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Tries to cast the value to a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(inner) => Some(inner),
            _ => None,
        }
    }

    /// Serializes the value using its fixed-width representation.
    ///
    /// Callers must ensure that text values are at most [`STRING_LEN`] bytes
    /// long (see [`Type::parse_value`]).
    pub fn serialize(&self, buf: &mut Buff<'_>) {
        match self {
            Value::Int(inner) => buf.write(*inner),
            Value::Text(inner) => {
                debug_assert!(inner.len() <= STRING_LEN);
                let bytes = &inner.as_bytes()[..inner.len().min(STRING_LEN)];
                buf.write(bytes.len() as u32);
                buf.write_slice(bytes);
                buf.write_bytes(STRING_LEN - bytes.len(), 0);
            }
        }
    }

    /// Deserializes a value of the given type. On failure, returns a short
    /// description of what was wrong with the bytes.
    pub fn deserialize(buf: &mut BuffReader<'_>, ty: Type) -> Result<Value, &'static str> {
        match ty {
            Type::Int => buf.read::<4, i32>().map(Value::Int).ok_or("truncated int"),
            Type::Text => {
                let len = buf.read::<4, u32>().ok_or("truncated text length")? as usize;
                if len > STRING_LEN {
                    return Err("text length out of range");
                }
                let bytes = buf.take(STRING_LEN).ok_or("truncated text")?;
                let text = std::str::from_utf8(&bytes[..len]).map_err(|_| "invalid utf-8 text")?;
                Ok(Value::Text(text.to_owned()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(inner) => fmt::Display::fmt(inner, f),
            Value::Text(inner) => f.write_str(inner),
        }
    }
}
