use thiserror::Error;

/// Message shown to the visitor whenever a lookup or store call fails
pub const TRY_AGAIN_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReserveError {
    // Workflow errors
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Username already taken: {username}")]
    Conflict { username: String },

    #[error("Registry unavailable: {message}")]
    Transient { message: String },

    // Configuration errors
    #[error("Failed to load config file '{path}': {message}")]
    ConfigLoad { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Invalid config: {message}")]
    ConfigValidation { message: String },
}

impl ReserveError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ReserveError::Validation {
            reason: reason.into(),
        }
    }

    /// The single message surfaced in the reservation form
    pub fn user_message(&self) -> String {
        match self {
            ReserveError::Validation { reason } => reason.clone(),
            ReserveError::Conflict { .. } => crate::reservation::TAKEN_MESSAGE.to_string(),
            ReserveError::Transient { .. } => TRY_AGAIN_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Only store failures are worth retrying; the visitor has to fix everything else
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReserveError::Transient { .. })
    }
}

impl From<crate::store::StoreError> for ReserveError {
    fn from(err: crate::store::StoreError) -> Self {
        ReserveError::Transient {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReserveError>;
