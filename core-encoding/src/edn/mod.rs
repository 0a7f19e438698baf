//! # EDN Codec
//!
//! Reader and writer for the subset of extensible data notation the catalogue
//! exchanges: scalars, keywords, strings, and the four collection types.
//!
//! Reading produces an [`Edn`] form, which is then lowered into a
//! [`Document`](crate::Document):
//!
//! - keywords, symbols and characters become strings (`:num-tracks` as a map
//!   key becomes `"num-tracks"`)
//! - lists, vectors and sets become arrays
//! - tagged elements lower to their inner value
//!
//! Writing goes straight from a document: objects print as keyword maps,
//! arrays as vectors, null as `nil`.

mod reader;
mod writer;

pub use reader::read;

use crate::Document;
use serde_json::{Map, Number};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("{message} at offset {offset}")]
    Syntax { message: String, offset: usize },

    #[error("{0}")]
    Unsupported(String),
}

/// A single EDN form.
#[derive(Debug, Clone, PartialEq)]
pub enum Edn {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Char(char),
    Keyword(String),
    Symbol(String),
    List(Vec<Edn>),
    Vector(Vec<Edn>),
    Set(Vec<Edn>),
    Map(Vec<(Edn, Edn)>),
    Tagged(String, Box<Edn>),
}

impl Edn {
    pub fn kind(&self) -> &'static str {
        match self {
            Edn::Nil => "nil",
            Edn::Bool(_) => "bool",
            Edn::Integer(_) => "int",
            Edn::Float(_) => "float",
            Edn::String(_) => "string",
            Edn::Char(_) => "char",
            Edn::Keyword(_) => "keyword",
            Edn::Symbol(_) => "symbol",
            Edn::List(_) => "list",
            Edn::Vector(_) => "vector",
            Edn::Set(_) => "set",
            Edn::Map(_) => "map",
            Edn::Tagged(..) => "tagged element",
        }
    }

    /// Lower this form into a format-neutral document.
    pub fn into_document(self) -> Result<Document, ReadError> {
        Ok(match self {
            Edn::Nil => Document::Null,
            Edn::Bool(b) => Document::Bool(b),
            Edn::Integer(i) => Document::from(i),
            Edn::Float(f) => Number::from_f64(f)
                .map(Document::Number)
                .ok_or_else(|| ReadError::Unsupported(format!("non-finite float {f}")))?,
            Edn::String(s) | Edn::Keyword(s) | Edn::Symbol(s) => Document::String(s),
            Edn::Char(c) => Document::String(c.to_string()),
            Edn::List(items) | Edn::Vector(items) | Edn::Set(items) => Document::Array(
                items
                    .into_iter()
                    .map(Edn::into_document)
                    .collect::<Result<_, _>>()?,
            ),
            Edn::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.into_key()?, value.into_document()?);
                }
                Document::Object(map)
            }
            Edn::Tagged(_, inner) => inner.into_document()?,
        })
    }

    fn into_key(self) -> Result<String, ReadError> {
        match self {
            Edn::Keyword(k) | Edn::Symbol(k) | Edn::String(k) => Ok(k),
            Edn::Integer(i) => Ok(i.to_string()),
            Edn::Bool(b) => Ok(b.to_string()),
            other => Err(ReadError::Unsupported(format!(
                "{} is not supported as a map key",
                other.kind()
            ))),
        }
    }
}

/// Read one EDN form from UTF-8 bytes and lower it into a document.
pub fn from_slice(bytes: &[u8]) -> Result<Document, ReadError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ReadError::Syntax {
        message: "invalid UTF-8".to_string(),
        offset: e.valid_up_to(),
    })?;
    read(text)?.into_document()
}

pub fn to_string(document: &Document) -> String {
    writer::write(document)
}

pub fn to_vec(document: &Document) -> Vec<u8> {
    to_string(document).into_bytes()
}
