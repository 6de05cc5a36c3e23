use thiserror::Error;

/// Failures reported by the persistence and cache collaborators.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O failure: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Market code already exists: {0}")]
    DuplicateCode(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Other error: {0}")]
    Other(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

impl From<sqlx::Error> for PersistError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                PersistError::Unavailable(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                PersistError::Serialization(err.to_string())
            }
            other => PersistError::Io(other.to_string()),
        }
    }
}

impl From<sled::Error> for PersistError {
    fn from(err: sled::Error) -> Self {
        PersistError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        PersistError::Serialization(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PersistError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        PersistError::Serialization(err.to_string())
    }
}
