use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use core_encoding::EncodingError;
use core_library::LibraryError;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl From<EncodingError> for ServiceError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::UnknownFormat(tag) => ServiceError::UnknownFormat(tag),
            other if other.is_decode() => ServiceError::Library(LibraryError::Decode(other)),
            other => ServiceError::Library(LibraryError::Encode(other)),
        }
    }
}

impl ServiceError {
    /// The single mapping from failures to HTTP status.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnknownFormat(_)
            | ServiceError::UnknownTable(_)
            | ServiceError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,

            ServiceError::Library(err) => match err {
                LibraryError::Decode(_) | LibraryError::InvalidInput { .. } => {
                    StatusCode::BAD_REQUEST
                }
                LibraryError::NotFound { .. } => StatusCode::NOT_FOUND,
                LibraryError::ReadOnly { .. } => StatusCode::METHOD_NOT_ALLOWED,
                LibraryError::Database(_)
                | LibraryError::Encode(_)
                | LibraryError::KeyResolution { .. }
                | LibraryError::UnknownKey { .. }
                | LibraryError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },

            ServiceError::Runtime(_) | ServiceError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller. Only decode failures carry one.
    fn public_message(&self) -> Option<String> {
        match self {
            ServiceError::Library(LibraryError::Decode(err)) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        match self.public_message() {
            Some(message) => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use core_encoding::Format;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::UnknownFormat("xml".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::UnknownTable("playlist".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidIdentifier("h9h".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );

        let not_found = LibraryError::NotFound {
            entity_type: "Album".to_string(),
            id: "99".to_string(),
        };
        assert_eq!(
            ServiceError::from(not_found).status_code(),
            StatusCode::NOT_FOUND
        );

        let unknown_key = LibraryError::UnknownKey {
            entity: "Library".to_string(),
            id: 99,
        };
        assert_eq!(
            ServiceError::from(unknown_key).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let read_only = LibraryError::ReadOnly {
            entity: "Genre".to_string(),
        };
        assert_eq!(
            ServiceError::from(read_only).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_encoding_errors_split_by_direction() {
        let unknown: ServiceError = EncodingError::UnknownFormat("xml".to_string()).into();
        assert!(matches!(unknown, ServiceError::UnknownFormat(_)));

        let decode: ServiceError = Format::Edn
            .mismatch(&serde_json::json!(4), "Song")
            .into();
        assert_eq!(decode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            decode.public_message().as_deref(),
            Some("edn: cannot unmarshal int into Song")
        );

        let encode: ServiceError = EncodingError::Encode {
            format: "json",
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(encode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(encode.public_message(), None);
    }
}
