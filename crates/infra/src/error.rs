use thiserror::Error;

use stockroom_core::DomainError;

/// Flat-file persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected header in {file}: {found}")]
    UnexpectedHeader { file: String, found: String },
}

/// Configuration loading failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Error surfaced by [`crate::service::InventoryService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The operation was rejected; nothing changed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Writing or reading the flat files failed.
    ///
    /// For purchases this happens after the in-memory commit; the next
    /// successful write rewrites the files in full.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("inventory lock poisoned")]
    LockPoisoned,
}

impl ServiceError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
