//! # Service Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (ledger-core)          repository / config failures          │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  ServiceError (this module) ← adds NotFound, VersionConflict, config    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Front end: `code()` for branching, `to_string()` for display          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ledger_core::CoreError;
use thiserror::Error;

/// Errors surfaced by [`LedgerService`](crate::LedgerService) and the
/// repositories.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Entity already stored under this id.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    /// The stored entity changed since it was read.
    ///
    /// ## When This Occurs
    /// - Two tabs register a payment against the same sale
    /// - The UI holds a sale at version N while storage is at N+1
    /// - A credit note was applied/cancelled between read and write
    #[error("{entity} {id} was modified concurrently: expected {expected}, found {actual}")]
    VersionConflict {
        entity: String,
        id: String,
        expected: String,
        actual: String,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to save configuration.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn version_conflict(
        entity: impl Into<String>,
        id: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ServiceError::VersionConflict {
            entity: entity.into(),
            id: id.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Machine-readable code for the front end.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
            ServiceError::Core(CoreError::Overpayment { .. }) => "OVERPAYMENT",
            ServiceError::Core(CoreError::InvalidAmount { .. }) => "INVALID_AMOUNT",
            ServiceError::Core(CoreError::InvalidState { .. }) => "INVALID_STATE",
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::AlreadyExists { .. } => "DUPLICATE",
            ServiceError::VersionConflict { .. } => "CONFLICT",
            ServiceError::InvalidConfig(_)
            | ServiceError::ConfigSaveFailed(_)
            | ServiceError::TomlParse(_)
            | ServiceError::TomlSerialize(_) => "CONFIG_ERROR",
            ServiceError::Storage(_) | ServiceError::Io(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying with fresh data could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::VersionConflict { .. })
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Money, ValidationError};

    #[test]
    fn test_codes() {
        let err: ServiceError = CoreError::InvalidAmount {
            amount: Money::zero(),
        }
        .into();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let err: ServiceError = CoreError::from(ValidationError::required("items")).into();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        assert_eq!(ServiceError::not_found("Sale", "v-1").code(), "NOT_FOUND");
    }

    #[test]
    fn test_core_message_is_transparent() {
        let err: ServiceError = CoreError::invalid_state("Sale", "v-1", "cancelled", "cancel").into();
        assert_eq!(err.to_string(), "Sale v-1 is cancelled, cannot cancel");
    }

    #[test]
    fn test_version_conflict() {
        let err = ServiceError::version_conflict("Sale", "v-1", 3, 4);
        assert_eq!(
            err.to_string(),
            "Sale v-1 was modified concurrently: expected 3, found 4"
        );
        assert!(err.is_retryable());
        assert!(!ServiceError::not_found("Sale", "v-1").is_retryable());
    }
}
