//! REST API plumbing around the signer

pub mod client;
pub mod envelope;

pub use client::ApiClient;
pub use envelope::check_response;
