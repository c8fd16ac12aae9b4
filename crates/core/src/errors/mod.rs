//! Error types and Result alias for the ClassQuest engine

use thiserror::Error;

/// Main error type for the ClassQuest engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("No signed-in user")]
    Unauthenticated,

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Conditional update lost the race on `{field_path}`")]
    Conflict { field_path: String },

    #[error("Already done: {0}")]
    DuplicateSubmission(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown reward key: {0}")]
    UnknownReward(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
