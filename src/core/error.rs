//! Error handling - one typed variant per rejection reason

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Provider error code for "the specified user has disabled Toopher authentication"
pub const USER_DISABLED_ERROR_CODE: &str = "704";

/// Toopher signer error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Empty consumer key or secret
    #[error("Invalid credential: {0}")]
    CredentialInvalid(String),

    /// Postback is missing one or more required keys
    #[error("Missing required keys: {}", .0.join(","))]
    MissingFields(Vec<String>),

    /// Postback session token differs from the one the requester issued
    #[error("Session token does not match expected value")]
    SessionMismatch,

    /// Postback timestamp is older than the allowed TTL
    #[error("TTL expired")]
    Expired,

    /// Recomputed postback signature differs from `toopher_sig`
    #[error("Computed signature does not match")]
    SignatureMismatch,

    /// `resource_type` names no known resource
    #[error("The postback resource type is not valid: {0}")]
    UnknownResourceType(String),

    /// Signed payload lacks fields its resource type requires
    #[error("Malformed resource: {0}")]
    MalformedResource(String),

    /// Unsigned error reported by the provider inside a postback
    #[error("Provider error {code}: {message}")]
    ProviderReportedError { code: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error envelope returned by the API for an HTTP status >= 400
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
}

impl Error {
    /// True when the provider reported that the user disabled Toopher
    /// authentication, i.e. no challenge took place.
    pub fn is_user_disabled(&self) -> bool {
        match self {
            Error::ProviderReportedError { code, .. } => code == USER_DISABLED_ERROR_CODE,
            Error::Api { code, .. } => code.to_string() == USER_DISABLED_ERROR_CODE,
            _ => false,
        }
    }
}
