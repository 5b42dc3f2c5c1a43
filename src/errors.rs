//! Standardized error types following the `error-toolgate-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-toolgate-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-toolgate-config-2 Parsing HTTP_PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-toolgate-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-toolgate-config-4 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when the signing secret is too short to be credible
    #[error("error-toolgate-config-5 TOKEN_SIGNING_SECRET must be at least {0} bytes")]
    SigningSecretTooShort(usize),

    /// Error when bcrypt cost is out of range
    #[error("error-toolgate-config-6 Failed to parse CLIENT_SECRET_HASH_COST: {0}")]
    HashCostParsingFailed(String),
}

/// OAuth 2.0 protocol errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Invalid client credentials
    #[error("error-toolgate-oauth-1 Invalid client credentials: {0}")]
    InvalidClient(String),

    /// Invalid, expired, used, or mis-bound authorization code
    #[error("error-toolgate-oauth-2 Invalid grant: {0}")]
    InvalidGrant(String),

    /// Unsupported grant type
    #[error("error-toolgate-oauth-3 Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Unsupported response type
    #[error("error-toolgate-oauth-4 Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// Invalid request
    #[error("error-toolgate-oauth-5 Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid scope
    #[error("error-toolgate-oauth-6 Invalid scope: {0}")]
    InvalidScope(String),

    /// Missing or invalid bearer token
    #[error("error-toolgate-oauth-7 Unauthorized: {0}")]
    Unauthorized(String),

    /// Principal mismatch on a principal-scoped resource
    #[error("error-toolgate-oauth-8 Forbidden: {0}")]
    Forbidden(String),

    /// Server error
    #[error("error-toolgate-oauth-9 Server error: {0}")]
    ServerError(String),
}

/// Token codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Signing failed
    #[error("error-toolgate-codec-1 Token signing failed: {0}")]
    SigningFailed(String),

    /// Signature or structural verification failed
    #[error("error-toolgate-codec-2 Token verification failed: {0}")]
    VerificationFailed(String),

    /// Token expired
    #[error("error-toolgate-codec-3 Token expired")]
    Expired,
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-toolgate-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when query execution fails
    #[error("error-toolgate-storage-2 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when database operation fails
    #[error("error-toolgate-storage-3 Database error: {0}")]
    DatabaseError(String),

    /// Error when data validation fails
    #[error("error-toolgate-storage-4 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested record is not found
    #[error("error-toolgate-storage-5 Not found: {0}")]
    NotFound(String),
}
