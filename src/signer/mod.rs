//! Signing primitives
//! Canonical encoding, HMAC-SHA1, and OAuth 1.0 request/URL signing

pub mod canonical;
pub mod hmac;
pub mod oauth;

pub use canonical::{canonicalize, canonicalize_rfc3986};
pub use oauth::{OAuthSigner, SignedRequest};
