use core_encoding::EncodingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Incoming payload could not be decoded into the target shape.
    #[error("{0}")]
    Decode(EncodingError),

    /// A stored record could not be rendered in the requested format.
    #[error("Encode error: {0}")]
    Encode(EncodingError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The key of an update payload is missing or not an integer.
    #[error("Cannot resolve {entity} key: {message}")]
    KeyResolution { entity: String, message: String },

    /// An update named a key with no stored row.
    #[error("No {entity} with id {id} to update")]
    UnknownKey { entity: String, id: i64 },

    #[error("{entity} does not accept writes")]
    ReadOnly { entity: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
