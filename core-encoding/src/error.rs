use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// Payload is not well-formed in the selected format.
    #[error("{format}: {message}")]
    Syntax {
        format: &'static str,
        message: String,
    },

    /// Payload is well-formed but its shape does not fit the target.
    #[error("{format}: cannot unmarshal {kind} into {target}")]
    Mismatch {
        format: &'static str,
        kind: &'static str,
        target: String,
    },

    #[error("{format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
}

impl EncodingError {
    /// True for failures caused by the incoming payload rather than by
    /// rendering a response.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            EncodingError::Syntax { .. } | EncodingError::Mismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EncodingError>;
