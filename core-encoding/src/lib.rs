//! # Wire Encodings
//!
//! The closed set of wire formats the catalogue speaks, and the codecs behind
//! them.
//!
//! ## Overview
//!
//! Every request selects a [`Format`] by tag (`json` or `edn`). Payloads are
//! parsed into a format-neutral [`Document`] first, so callers can inspect the
//! structure (is it a map? which keys are present?) before committing to a
//! typed decode. Encoding goes the other way: any `Serialize` value is
//! rendered in the selected format.
//!
//! ```rust
//! use core_encoding::Format;
//!
//! let format: Format = "edn".parse().unwrap();
//! let document = format.parse(br#"{:id 1 :name "Jazz"}"#).unwrap();
//! assert_eq!(document["name"], "Jazz");
//! assert_eq!(format.render(&document).unwrap(), br#"{:id 1 :name "Jazz"}"#);
//! ```

pub mod edn;
pub mod error;
pub mod format;

pub use error::{EncodingError, Result};
pub use format::Format;

/// Format-neutral parsed payload.
pub type Document = serde_json::Value;

/// Key/value body of a map-shaped [`Document`], in source order.
pub type DocumentMap = serde_json::Map<String, serde_json::Value>;
