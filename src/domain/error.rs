use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    ConfigError(String),
    ValidationError(String),
    ParseError(String),
    /// No credential, or the prediction service rejected it.
    Unauthorized(String),
    /// Transport failure (connect, DNS, timeout).
    Unreachable(String),
    ServerError { status: u16, message: String },
    InvalidResponse(String),
    /// Another submission is already in flight.
    Busy,
    SecurityError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Unreachable(msg) => write!(f, "Prediction service unreachable: {}", msg),
            AppError::ServerError { status, message } => {
                write!(f, "Prediction service error ({}): {}", status, message)
            }
            AppError::InvalidResponse(msg) => write!(f, "Invalid prediction response: {}", msg),
            AppError::Busy => write!(f, "A prediction request is already in progress"),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl AppError {
    /// Faults that end the current invocation outright instead of being
    /// attributed to individual rows.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized(_)
                | AppError::ParseError(_)
                | AppError::ConfigError(_)
                | AppError::Busy
                | AppError::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
