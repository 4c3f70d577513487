use crate::cast::CastType;
use thiserror::Error;

/// A stored payload could not be read back as its declared type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Malformed {cast} payload {raw:?}: {reason}")]
    MalformedPayload {
        cast: CastType,
        raw: String,
        reason: String,
    },
}

impl CoercionError {
    pub(crate) fn malformed(cast: &CastType, raw: &str, reason: impl ToString) -> Self {
        CoercionError::MalformedPayload {
            cast: cast.clone(),
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// An in-memory value could not be turned into its storable text form.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Cannot store {value} as {cast}")]
    Incompatible { cast: CastType, value: String },

    #[error("Invalid date-time {0:?}")]
    InvalidDateTime(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("Metadata row not found: {0}")]
    RowNotFound(uuid::Uuid),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
