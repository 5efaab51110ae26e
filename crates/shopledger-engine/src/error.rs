//! # Engine Error Type
//!
//! Unified error type for engine operations and the stable error response
//! the façade hands to clients.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ShopLedger                             │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                  ├──► EngineError ──► ErrorResponse    │
//! │  sqlx::Error ──────► DbError ────┘         │           { code, message }│
//! │                                            │                            │
//! │  io / toml errors ─► Config(String) ───────┘                            │
//! │                                                                         │
//! │  Business errors keep their message. Store errors are logged with      │
//! │  error! and surface as a generic message.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Client Handling
//! ```typescript
//! try {
//!   await api.adjustStock(payload);
//! } catch (e) {
//!   switch (e.code) {
//!     case 'INSUFFICIENT_STOCK': showStockWarning(e.message); break;
//!     case 'VALIDATION_ERROR':   showForm(e.message); break;
//!     default:                   showError('An error occurred');
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use shopledger_core::{CoreError, ValidationError};
use shopledger_db::DbError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Any failure of an engine operation.
///
/// When an operation returns an error, none of its writes were committed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule or validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input (400)
    Validation,
    /// Missing entity (404)
    NotFound,
    /// Exit larger than stock on hand (422)
    InsufficientStock,
    /// Lifecycle or balance rule refused the change (409)
    Conflict,
    /// Store or configuration failure (500)
    Store,
}

impl ErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Store => "STORE_ERROR",
        }
    }
}

impl EngineError {
    /// Shorthand for a validation failure raised by the engine itself.
    pub fn validation(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(core) => match core {
                CoreError::Validation(_) | CoreError::InvalidQuantity(_) => ErrorKind::Validation,
                CoreError::ProductNotFound(_)
                | CoreError::ServiceOrderNotFound(_)
                | CoreError::TransactionNotFound(_) => ErrorKind::NotFound,
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidStatusTransition { .. }
                | CoreError::InsufficientBalance { .. } => ErrorKind::Conflict,
            },
            EngineError::Store(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Store(DbError::UniqueViolation { .. }) => ErrorKind::Conflict,
            EngineError::Store(_) | EngineError::Config(_) => ErrorKind::Store,
        }
    }

    /// Stable code string for the client.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::validation(err)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

// =============================================================================
// Error Response
// =============================================================================

/// What a client receives when an operation fails.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Ecrã A10: available 3, requested 5" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(err: &EngineError) -> Self {
        let message = match err {
            EngineError::Core(core) => core.to_string(),
            EngineError::Store(DbError::NotFound { entity, id }) => {
                format!("{} not found: {}", entity, id)
            }
            EngineError::Store(DbError::UniqueViolation { field, .. }) => {
                format!("{} already exists", field)
            }
            EngineError::Store(db) => {
                tracing::error!(error = %db, "Store operation failed");
                "Database operation failed".to_string()
            }
            EngineError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                "Service misconfigured".to_string()
            }
        };

        ErrorResponse {
            code: err.code().to_string(),
            message,
        }
    }
}

impl From<EngineError> for ErrorResponse {
    fn from(err: EngineError) -> Self {
        ErrorResponse::from(&err)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_keep_message() {
        let err = EngineError::from(CoreError::InsufficientStock {
            product_id: "p".into(),
            product_name: "Ecrã A10".into(),
            available: 3,
            requested: 5,
        });
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "INSUFFICIENT_STOCK");
        assert_eq!(
            response.message,
            "Insufficient stock for Ecrã A10: available 3, requested 5"
        );
    }

    #[test]
    fn test_store_errors_are_generic() {
        let err = EngineError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        let response = ErrorResponse::from(err);
        assert_eq!(response.code, "STORE_ERROR");
        assert_eq!(response.message, "Database operation failed");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            EngineError::from(CoreError::InvalidQuantity(0)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::from(CoreError::ProductNotFound("x".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::from(DbError::duplicate("email", "a@b.c")).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::from(ValidationError::Required { field: "name".into() }).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(EngineError::Config("bad".into()).code(), "STORE_ERROR");
    }
}
