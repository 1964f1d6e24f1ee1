//! Tuple schemas (also known as tuple descriptors).

use std::{
    fmt,
    hash::{Hash, Hasher},
    slice,
};

use crate::{
    catalog::ty::Type,
    error::{DbResult, Error},
};

/// A single field definition.
#[derive(Debug, Clone)]
pub struct Field {
    /// The field value type.
    pub ty: Type,
    /// The field name. Names are optional and not required to be unique.
    pub name: Option<String>,
}

impl Field {
    /// Constructs a new named field.
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Field {
            ty,
            name: Some(name.into()),
        }
    }

    /// Constructs a new anonymous field.
    pub fn unnamed(ty: Type) -> Self {
        Field { ty, name: None }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.ty, self.name.as_deref().unwrap_or("null"))
    }
}

/// An ordered, immutable list of fields describing the layout of every tuple
/// of a table (or of an operator's output).
///
/// Two schemas are equal if they have the same number of fields and the same
/// types at every position; field names are *not* compared.
///
/// Schemas are usually shared through an `Arc` among every operator that reads
/// the same table.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema from the given field types and names.
    ///
    /// Fails if there are no fields, or if `names` doesn't have one entry per
    /// type.
    pub fn new<N>(types: Vec<Type>, names: Vec<Option<N>>) -> DbResult<Self>
    where
        N: Into<String>,
    {
        if types.len() != names.len() {
            return Err(Error::InvalidSchema(
                format!(
                    "got {} types but {} field names",
                    types.len(),
                    names.len()
                )
                .into(),
            ));
        }
        let fields = types
            .into_iter()
            .zip(names)
            .map(|(ty, name)| Field {
                ty,
                name: name.map(Into::into),
            })
            .collect();
        Self::from_fields(fields)
    }

    /// Creates a schema whose fields are all anonymous.
    pub fn unnamed(types: Vec<Type>) -> DbResult<Self> {
        Self::from_fields(types.into_iter().map(Field::unnamed).collect())
    }

    /// Creates a schema from already built fields.
    pub fn from_fields(fields: Vec<Field>) -> DbResult<Self> {
        if fields.is_empty() {
            return Err(Error::InvalidSchema(
                "a schema must have at least one field".into(),
            ));
        }
        Ok(Schema { fields })
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the (possibly absent) name of the `i`-th field.
    pub fn field_name(&self, i: usize) -> DbResult<Option<&str>> {
        self.field(i).map(|field| field.name.as_deref())
    }

    /// Returns the type of the `i`-th field.
    pub fn field_type(&self, i: usize) -> DbResult<Type> {
        self.field(i).map(|field| field.ty)
    }

    /// Returns the `i`-th field.
    pub fn field(&self, i: usize) -> DbResult<&Field> {
        self.fields.get(i).ok_or_else(|| {
            Error::NoSuchField(format!(
                "index {i} out of range for {} fields",
                self.fields.len()
            ))
        })
    }

    /// Returns the index of the *first* field named `name`.
    ///
    /// Passing `None` looks for the first anonymous field.
    pub fn index_of(&self, name: Option<&str>) -> DbResult<usize> {
        self.fields
            .iter()
            .position(|field| field.name.as_deref() == name)
            .ok_or_else(|| Error::NoSuchField(format!("`{}`", name.unwrap_or("null"))))
    }

    /// Returns the size (in bytes) of a tuple described by this schema.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|field| field.ty.size()).sum()
    }

    /// Returns an iterator over the fields, in order.
    pub fn fields(&self) -> slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Returns an iterator over the field types, in order.
    pub fn types(&self) -> impl Iterator<Item = Type> + '_ {
        self.fields.iter().map(|field| field.ty)
    }

    /// Concatenates two schemas: all of `a`'s fields followed by all of `b`'s.
    pub fn merge(a: &Schema, b: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(a.field_count() + b.field_count());
        fields.extend_from_slice(&a.fields);
        fields.extend_from_slice(&b.fields);
        Schema { fields }
    }

    /// Returns a copy of this schema with every field renamed to
    /// `<prefix>.<name>`. Absent prefixes or names are rendered as `null`.
    pub fn qualified(&self, prefix: Option<&str>) -> Schema {
        let prefix = prefix.unwrap_or("null");
        let fields = self
            .fields
            .iter()
            .map(|field| Field {
                ty: field.ty,
                name: Some(format!(
                    "{prefix}.{}",
                    field.name.as_deref().unwrap_or("null")
                )),
            })
            .collect();
        Schema { fields }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.field_count() == other.field_count() && self.types().eq(other.types())
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Names don't take part in equality, so they mustn't be hashed either.
        self.field_count().hash(state);
        for ty in self.types() {
            ty.hash(state);
        }
    }
}

/// Renders every field as `type(name)`, without separators.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            fmt::Display::fmt(field, f)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Field;
    type IntoIter = slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields()
    }
}
