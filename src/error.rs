use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum WardenError {
    // Storage errors
    StoreUnavailable(String),
    NotFound(String),

    // Serialization errors
    SerializationError(String),

    // Auth errors
    AuthError(String),
    TokenIssueError(String),

    // Validation errors
    ValidationError(String),

    // System errors
    SystemError(String),

    // Configuration errors
    ConfigError(String),
}

impl WardenError {
    /// Whether the error reports an absent record rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl fmt::Display for WardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            Self::TokenIssueError(msg) => write!(f, "Token issue error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::SystemError(msg) => write!(f, "System error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for WardenError {}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        WardenError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        WardenError::SystemError(err.to_string())
    }
}

// Generic result type for RustyWarden
pub type Result<T> = std::result::Result<T, WardenError>;
