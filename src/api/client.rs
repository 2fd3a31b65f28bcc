//! Signed HTTP adapter for the Toopher REST API
//!
//! Thin by design: signing comes from [`OAuthSigner`], error decoding from
//! [`check_response`]. No retries.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Request};
use serde_json::Value;
use tracing::debug;

use crate::api::envelope::check_response;
use crate::core::config::DEFAULT_BASE_URL;
use crate::core::{Error, ParameterSet, Result};
use crate::signer::OAuthSigner;
use crate::signer::canonical::build_query;

pub const USER_AGENT_VALUE: &str = concat!("Toopher-Rust/", env!("CARGO_PKG_VERSION"));

/// REST client that signs every request
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    signer: OAuthSigner,
    base_url: String,
}

impl ApiClient {
    pub fn new(signer: OAuthSigner, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if base_url.is_empty() {
            base_url = DEFAULT_BASE_URL.to_string();
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            client: Client::new(),
            signer,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a signed request without sending it.
    ///
    /// GET params travel in the query string, everything else as a form body.
    pub fn build_request(&self, method: Method, endpoint: &str, params: &ParameterSet) -> Result<Request> {
        let url = format!("{}{}", self.base_url, endpoint.trim_start_matches('/'));
        let signed = self.signer.sign_request(method.as_str(), &url, params);
        let authorization = HeaderValue::from_str(&signed.authorization_header())
            .map_err(|e| Error::Config(format!("Invalid authorization header: {}", e)))?;

        let in_query = method == Method::GET && !params.is_empty();
        let target = if in_query {
            format!("{}?{}", url, build_query(params))
        } else {
            url
        };

        let mut builder = self
            .client
            .request(method.clone(), target)
            .header(AUTHORIZATION, authorization)
            .header(USER_AGENT, USER_AGENT_VALUE);

        if method != Method::GET && !params.is_empty() {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(build_query(params));
        }

        Ok(builder.build()?)
    }

    pub async fn get(&self, endpoint: &str, params: &ParameterSet) -> Result<Value> {
        self.send(Method::GET, endpoint, params).await
    }

    pub async fn post(&self, endpoint: &str, params: &ParameterSet) -> Result<Value> {
        self.send(Method::POST, endpoint, params).await
    }

    async fn send(&self, method: Method, endpoint: &str, params: &ParameterSet) -> Result<Value> {
        let request = self.build_request(method, endpoint, params)?;
        debug!(method = %request.method(), url = %request.url(), "Toopher API request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        check_response(status.as_u16(), status.canonical_reason().unwrap_or_default(), &body)?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
