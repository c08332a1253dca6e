use thiserror::Error;
use uuid::Uuid;

use crate::SourceType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported data source type: {0}")]
    UnsupportedSourceType(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(Uuid),

    #[error("invalid {source_type} credentials: {reason}")]
    InvalidCredentials {
        source_type: SourceType,
        reason: String,
    },

    #[error("{source_type} extract failed: {reason}")]
    Extract {
        source_type: SourceType,
        reason: String,
    },

    #[error("{stage} stage timed out after {timeout:?}")]
    StageTimeout {
        stage: &'static str,
        timeout: std::time::Duration,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
