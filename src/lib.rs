//! Toopher signer - Core Library
//! OAuth 1.0 request signing and iframe postback verification for the Toopher MFA API

// Public modules
pub mod core;
pub mod signer;
pub mod iframe;
pub mod api;

// Re-exports
pub use crate::core::{Config, Error, Result, SigningCredential, ParameterSet};
pub use crate::signer::{OAuthSigner, SignedRequest};
pub use crate::iframe::{ToopherIframe, PostbackVerifier, PostbackPayload, ResourceSnapshot};
pub use crate::api::ApiClient;
