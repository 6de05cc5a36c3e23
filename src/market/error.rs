use thiserror::Error;

use crate::market::types::MarketId;
use crate::persist::PersistError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No market can be found with id {0}")]
    NotFoundById(MarketId),
    #[error("No market can be found with code {0}")]
    NotFoundByCode(String),
    #[error("Market load failed: {0}")]
    Load(#[from] PersistError),
    #[error("Market create failed: {0}")]
    Create(PersistError),
    #[error("Duplicate market {field} in loaded rows: {value}")]
    DuplicateMarket { field: &'static str, value: String },
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFoundById(_) | RegistryError::NotFoundByCode(_))
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
