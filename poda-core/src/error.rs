//! Error types for the PoDA workspace.
//!
//! Provides structured errors with:
//! - Unique error codes for host/API responses
//! - Source error chaining
//! - Client vs server error categorization

use thiserror::Error;

/// Result type for PoDA operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes for host responses.
///
/// Codes are structured as:
/// - 1xxx: Validation errors (client)
/// - 2xxx: Not found errors (client)
/// - 3xxx: Options errors (client)
/// - 5xxx: Storage errors (server)
/// - 6xxx: Internal errors (server)
/// - 7xxx: Network errors (server)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidAddress = 1001,
    InvalidKey = 1002,
    InvalidSignature = 1003,
    InvalidItem = 1004,

    // Not found errors (2xxx)
    MessageNotFound = 2001,
    NodeNotFound = 2002,

    // Options errors (3xxx)
    InvalidOptions = 3001,

    // Storage errors (5xxx)
    StorageRead = 5001,

    // Internal errors (6xxx)
    Serialization = 6001,
    Internal = 6002,

    // Network errors (7xxx)
    ConnectionFailed = 7001,
    Timeout = 7002,
}

impl ErrorCode {
    /// Get the numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this is a client error (4xx equivalent).
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Check if this is a server error (5xx equivalent).
    pub fn is_server_error(self) -> bool {
        self.code() >= 5000
    }

    /// Check if this error is retryable.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::StorageRead | ErrorCode::ConnectionFailed | ErrorCode::Timeout
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Errors that can occur in the PoDA workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid address encoding.
    #[error("[{code}] invalid address: {message}")]
    InvalidAddress { code: ErrorCode, message: String },

    /// Invalid cryptographic key.
    #[error("[{code}] invalid key: {message}")]
    InvalidKey { code: ErrorCode, message: String },

    /// Signature verification failed.
    #[error("[{code}] signature verification failed")]
    InvalidSignature { code: ErrorCode },

    /// Item validation failed.
    #[error("[{code}] invalid item: {message}")]
    InvalidItem { code: ErrorCode, message: String },

    /// Device options could not be parsed from process tags.
    #[error("[{code}] invalid device options: {message}")]
    InvalidOptions { code: ErrorCode, message: String },

    /// Item not found.
    #[error("[{code}] not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Storage operation failed.
    #[error("[{code}] storage error: {message}")]
    Storage {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization failed.
    #[error("[{code}] serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network operation failed.
    #[error("[{code}] network error: {message}")]
    Network { code: ErrorCode, message: String },

    /// Internal error.
    #[error("[{code}] internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl Error {
    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidAddress { code, .. } => *code,
            Error::InvalidKey { code, .. } => *code,
            Error::InvalidSignature { code } => *code,
            Error::InvalidItem { code, .. } => *code,
            Error::InvalidOptions { code, .. } => *code,
            Error::NotFound { code, .. } => *code,
            Error::Storage { code, .. } => *code,
            Error::Serialization { code, .. } => *code,
            Error::Network { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.code().is_server_error()
    }

    /// Create an InvalidAddress error.
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Error::InvalidAddress {
            code: ErrorCode::InvalidAddress,
            message: message.into(),
        }
    }

    /// Create an InvalidKey error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Error::InvalidKey {
            code: ErrorCode::InvalidKey,
            message: message.into(),
        }
    }

    /// Create an InvalidSignature error.
    pub fn invalid_signature() -> Self {
        Error::InvalidSignature {
            code: ErrorCode::InvalidSignature,
        }
    }

    /// Create an InvalidItem error.
    pub fn invalid_item(message: impl Into<String>) -> Self {
        Error::InvalidItem {
            code: ErrorCode::InvalidItem,
            message: message.into(),
        }
    }

    /// Create an InvalidOptions error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Error::InvalidOptions {
            code: ErrorCode::InvalidOptions,
            message: message.into(),
        }
    }

    /// Create a NotFound error for messages.
    pub fn message_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::MessageNotFound,
            message: message.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Network error.
    pub fn network(message: impl Into<String>) -> Self {
        Error::Network {
            code: ErrorCode::ConnectionFailed,
            message: message.into(),
        }
    }

    /// Create a Timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Network {
            code: ErrorCode::Timeout,
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::InvalidAddress.code(), 1001);
        assert_eq!(ErrorCode::MessageNotFound.code(), 2001);
        assert_eq!(ErrorCode::StorageRead.code(), 5001);
    }

    #[test]
    fn test_error_categorization() {
        assert!(ErrorCode::InvalidItem.is_client_error());
        assert!(!ErrorCode::InvalidItem.is_server_error());

        assert!(ErrorCode::Timeout.is_server_error());
        assert!(!ErrorCode::Timeout.is_client_error());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::Timeout.is_retryable());
        assert!(ErrorCode::ConnectionFailed.is_retryable());
        assert!(!ErrorCode::InvalidOptions.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let e = Error::invalid_options("missing Quorum tag");
        assert!(e.to_string().contains("E3001"));
        assert!(e.to_string().contains("missing Quorum tag"));
    }
}
