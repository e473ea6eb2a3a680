use thiserror::Error;

/// Errors produced while parsing model tags from their stored form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown metadata type: {0}")]
    UnknownMetadataType(String),

    #[error("unknown artwork type: {0}")]
    UnknownArtworkType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
