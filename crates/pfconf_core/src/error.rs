//! Error types for the reconciliation engine.

use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can abort a reconciliation.
///
/// Both kinds are fatal: nothing is persisted and nothing is retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The desired state is inconsistent or refers to something that
    /// does not exist. The caller must correct the input.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The configuration store failed to load, locate or persist.
    #[error("store error: {0}")]
    Store(#[from] pfconf_tree::TreeError),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates the error for a certificate authority that does not exist.
    pub fn ca_not_found(name: &str) -> Self {
        Self::validation(format!("could not find CA '{name}'"))
    }

    /// Returns `true` for validation errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ca_not_found_message() {
        let err = CoreError::ca_not_found("InternalCA");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "validation error: could not find CA 'InternalCA'"
        );
    }

    #[test]
    fn store_errors_convert() {
        let err: CoreError = pfconf_tree::TreeError::missing_container("system").into();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("<system>"));
    }
}
