//! Encoder registry.
//!
//! The set of formats is fixed at compile time. A request resolves its tag to
//! a [`Format`] once, at the edge, and everything downstream works with the
//! resolved value.

use crate::edn;
use crate::error::{EncodingError, Result};
use crate::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A wire serialization scheme selectable by path tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Edn,
}

impl Format {
    /// Every registered format, in registration order.
    pub const ALL: [Format; 2] = [Format::Json, Format::Edn];

    /// Tag used in request paths and error messages.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Edn => "edn",
        }
    }

    /// Resolve a path tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.tag() == tag)
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Edn => "application/edn",
        }
    }

    /// Parse a payload into a format-neutral document.
    pub fn parse(self, bytes: &[u8]) -> Result<Document> {
        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| self.syntax(e)),
            Format::Edn => edn::from_slice(bytes).map_err(|e| self.syntax(e)),
        }
    }

    /// Render a document in this format.
    pub fn render(self, document: &Document) -> Result<Vec<u8>> {
        match self {
            Format::Json => serde_json::to_vec(document).map_err(|e| self.encode_error(e)),
            Format::Edn => Ok(edn::to_vec(document)),
        }
    }

    /// Parse a payload and deserialize it into `T`.
    ///
    /// `target` names the shape being decoded and appears in mismatch
    /// messages. Anything other than a map is rejected before serde runs, so
    /// a bare scalar reports its kind: `edn: cannot unmarshal int into Song`.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8], target: &str) -> Result<T> {
        let document = self.parse(bytes)?;
        if !document.is_object() {
            return Err(self.mismatch(&document, target));
        }
        self.from_document(document, target)
    }

    /// Deserialize an already parsed document into `T`.
    pub fn from_document<T: DeserializeOwned>(self, document: Document, target: &str) -> Result<T> {
        serde_json::from_value(document).map_err(|e| EncodingError::Syntax {
            format: self.tag(),
            message: format!("cannot unmarshal into {target}: {e}"),
        })
    }

    /// Serialize any value in this format.
    ///
    /// Struct fields keep declaration order in both formats.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Format::Json => serde_json::to_vec(value).map_err(|e| self.encode_error(e)),
            Format::Edn => {
                let document = serde_json::to_value(value).map_err(|e| self.encode_error(e))?;
                Ok(edn::to_vec(&document))
            }
        }
    }

    /// Name of a document's kind in this format's vocabulary.
    pub fn kind_of(self, document: &Document) -> &'static str {
        match (self, document) {
            (Format::Json, Document::Null) => "null",
            (Format::Json, Document::Number(_)) => "number",
            (Format::Json, Document::Array(_)) => "array",
            (Format::Json, Document::Object(_)) => "object",
            (Format::Edn, Document::Null) => "nil",
            (Format::Edn, Document::Number(n)) if n.is_f64() => "float",
            (Format::Edn, Document::Number(_)) => "int",
            (Format::Edn, Document::Array(_)) => "vector",
            (Format::Edn, Document::Object(_)) => "map",
            (_, Document::Bool(_)) => "bool",
            (_, Document::String(_)) => "string",
        }
    }

    /// Build the mismatch error for `document` landing in `target`.
    pub fn mismatch(self, document: &Document, target: impl Into<String>) -> EncodingError {
        EncodingError::Mismatch {
            format: self.tag(),
            kind: self.kind_of(document),
            target: target.into(),
        }
    }

    fn syntax(self, err: impl fmt::Display) -> EncodingError {
        EncodingError::Syntax {
            format: self.tag(),
            message: err.to_string(),
        }
    }

    fn encode_error(self, err: impl fmt::Display) -> EncodingError {
        EncodingError::Encode {
            format: self.tag(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Format {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| EncodingError::UnknownFormat(s.to_string()))
    }
}
