//! Error types for `docvault` operations.
//!
//! Every public operation resolves with a typed value or fails with exactly
//! one [`Error`]. Callers branch on the variant, or on [`Error::kind`] when
//! the payload is irrelevant.

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for `docvault` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The target collection does not exist on the vault
    #[error("collection not found: {message}")]
    CollectionNotFound {
        /// Message reported by the vault
        message: String,
    },

    /// A create call hit a resource that already exists
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Message reported by the vault
        message: String,
    },

    /// The access token was rejected or has expired
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Message reported by the vault
        message: String,
    },

    /// Any other 4xx response
    #[error("client request error ({code}): {message}")]
    ClientRequest {
        /// HTTP status code
        code: u16,
        /// Message reported by the vault
        message: String,
    },

    /// 5xx response, or a status the protocol does not define
    #[error("server error ({code}): {message}")]
    Server {
        /// HTTP status code
        code: u16,
        /// Message reported by the vault
        message: String,
    },

    /// No response reached the client
    #[error("connection error: {0}")]
    Connection(String),

    /// The response payload did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Authentication tag verification failed (wrong cipher or tampered data)
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// A document, filter or update root was not a JSON object
    #[error("invalid encryption input: {0}")]
    InvalidEncryptionInput(String),

    /// Session setup rejected (bad cipher material or client configuration)
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Payload-free discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::CollectionNotFound`]
    CollectionNotFound,
    /// See [`Error::AlreadyExists`]
    AlreadyExists,
    /// See [`Error::Unauthorized`]
    Unauthorized,
    /// See [`Error::ClientRequest`]
    ClientRequestError,
    /// See [`Error::Server`]
    ServerError,
    /// See [`Error::Connection`]
    ConnectionError,
    /// See [`Error::MalformedResponse`]
    MalformedResponse,
    /// See [`Error::DecryptionFailed`]
    DecryptionFailed,
    /// See [`Error::InvalidEncryptionInput`]
    InvalidEncryptionInput,
    /// See [`Error::Config`]
    Config,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CollectionNotFound { .. } => ErrorKind::CollectionNotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ClientRequest { .. } => ErrorKind::ClientRequestError,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::Connection(_) => ErrorKind::ConnectionError,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
            Self::InvalidEncryptionInput(_) => ErrorKind::InvalidEncryptionInput,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the request pipeline may refresh the token and retry.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_not_found_display() {
        let err = Error::CollectionNotFound { message: "works_not_exists".into() };
        assert_eq!(err.to_string(), "collection not found: works_not_exists");
        assert_eq!(err.kind(), ErrorKind::CollectionNotFound);
    }

    #[test]
    fn test_client_request_display() {
        let err = Error::ClientRequest { code: 400, message: "bad filter".into() };
        assert_eq!(err.to_string(), "client request error (400): bad filter");
        assert_eq!(err.kind(), ErrorKind::ClientRequestError);
    }

    #[test]
    fn test_server_display() {
        let err = Error::Server { code: 503, message: "unavailable".into() };
        assert_eq!(err.to_string(), "server error (503): unavailable");
    }

    #[test]
    fn test_only_unauthorized_is_retryable() {
        assert!(Error::Unauthorized { message: String::new() }.is_unauthorized());
        assert!(!Error::Server { code: 500, message: String::new() }.is_unauthorized());
        assert!(!Error::Connection("refused".into()).is_unauthorized());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
