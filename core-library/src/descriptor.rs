//! # Entity Descriptors
//!
//! Static description of every catalogue shape: which table backs it, how
//! each wire field maps onto SQL, and which fields may constrain a query.
//!
//! Descriptors replace runtime type inspection. The query engine, the
//! repository and the payload decoder only ever walk `fields`, so adding an
//! entity is a matter of declaring one more descriptor.

use crate::error::{LibraryError, Result};
use core_encoding::{Document, DocumentMap, Format};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::fmt::Debug;

/// Storage class of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

/// A single field value lifted out of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Zero value of the field's type. Zero fields never constrain a query.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Integer(v) => *v == 0,
            FieldValue::Real(v) => *v == 0.0,
            FieldValue::Text(v) => v.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

/// Mapping of one wire field onto storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Wire name (`num-tracks`).
    pub name: &'static str,
    /// Column name in the entity's own table, also the row alias on reads.
    pub column: &'static str,
    /// SQL expression producing the field in the descriptor's `source`.
    pub expr: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
    pub queryable: bool,
    /// Written on insert and update. Keys and derived fields are not.
    pub writable: bool,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: name,
            expr: name,
            kind,
            nullable: false,
            queryable: true,
            writable: true,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn real(name: &'static str) -> Self {
        Self::new(name, FieldKind::Real)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Primary key: queryable, assigned by the store.
    pub const fn key(name: &'static str) -> Self {
        Self {
            writable: false,
            ..Self::integer(name)
        }
    }

    pub const fn column(self, column: &'static str) -> Self {
        Self {
            column,
            expr: column,
            ..self
        }
    }

    pub const fn expr(self, expr: &'static str) -> Self {
        Self { expr, ..self }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn unqueryable(self) -> Self {
        Self {
            queryable: false,
            ..self
        }
    }

    pub const fn derived(self) -> Self {
        Self {
            writable: false,
            ..self
        }
    }

    /// Whether `value` belongs in a filter built from an example.
    pub fn constrains(&self, value: &FieldValue) -> bool {
        if !self.queryable {
            return false;
        }
        if self.nullable {
            !value.is_null()
        } else {
            !value.is_zero()
        }
    }

    fn accepts(&self, value: &Document) -> bool {
        match self.kind {
            FieldKind::Integer => value.as_i64().is_some(),
            FieldKind::Real => value.is_number(),
            FieldKind::Text => value.is_string(),
        }
    }
}

/// Everything the engine needs to know about one entity shape.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Shape name used in decode diagnostics (`Song`).
    pub shape: &'static str,
    /// Route segment and table written to (`song`).
    pub table: &'static str,
    /// FROM clause for reads; joins derived fields in.
    pub source: &'static str,
    /// Whether create and update are allowed.
    pub mutable: bool,
    /// Fields in wire order. The first field is the primary key.
    pub fields: &'static [Field],
}

impl EntityDescriptor {
    pub fn key(&self) -> &Field {
        &self.fields[0]
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn writable_fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.writable)
    }

    /// `expr AS column, ...` for every field.
    pub fn select_list(&self) -> String {
        self.fields
            .iter()
            .map(|field| {
                if field.expr == field.column {
                    field.column.to_string()
                } else {
                    format!("{} AS {}", field.expr, field.column)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn ensure_mutable(&self) -> Result<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(LibraryError::ReadOnly {
                entity: self.shape.to_string(),
            })
        }
    }

    /// Check each known field of `map` against its declared kind.
    ///
    /// A null on a non-nullable field is dropped so it decodes as the zero
    /// value. Keys the shape does not declare are left for serde to ignore.
    pub fn check_document(
        &self,
        format: Format,
        map: &mut DocumentMap,
    ) -> core_encoding::Result<()> {
        for field in self.fields {
            let Some(value) = map.get(field.name) else {
                continue;
            };
            if value.is_null() {
                if !field.nullable {
                    map.remove(field.name);
                }
                continue;
            }
            if !field.accepts(value) {
                return Err(format.mismatch(value, format!("{}.{}", self.shape, field.name)));
            }
        }
        Ok(())
    }
}

/// A catalogue shape that can be decoded, stored, queried and encoded.
pub trait Entity:
    Serialize
    + DeserializeOwned
    + Default
    + Clone
    + Debug
    + Send
    + Sync
    + Unpin
    + for<'r> FromRow<'r, SqliteRow>
    + 'static
{
    fn descriptor() -> &'static EntityDescriptor;

    /// Field values in descriptor order.
    fn values(&self) -> Vec<FieldValue>;

    fn key(&self) -> i64;

    fn set_key(&mut self, key: i64);

    /// Model checks run before every write.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Parse a payload and require it to be a map.
pub fn decode_document(format: Format, bytes: &[u8], shape: &str) -> Result<DocumentMap> {
    match format.parse(bytes).map_err(LibraryError::Decode)? {
        Document::Object(map) => Ok(map),
        other => Err(LibraryError::Decode(format.mismatch(&other, shape))),
    }
}

/// Turn a parsed map into an entity after field-level kind checks.
pub fn entity_from_document<E: Entity>(format: Format, mut map: DocumentMap) -> Result<E> {
    let descriptor = E::descriptor();
    descriptor
        .check_document(format, &mut map)
        .map_err(LibraryError::Decode)?;
    format
        .from_document(Document::Object(map), descriptor.shape)
        .map_err(LibraryError::Decode)
}

/// Parse and decode a payload in one step.
pub fn decode_entity<E: Entity>(format: Format, bytes: &[u8]) -> Result<E> {
    let map = decode_document(format, bytes, E::descriptor().shape)?;
    entity_from_document(format, map)
}
