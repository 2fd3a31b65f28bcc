//! Embedded authentication iframe
//! Signed frame URLs going out, verified postbacks coming back

pub mod postback;
pub mod resource;

use std::sync::Arc;

use crate::core::config::DEFAULT_BASE_URL;
use crate::core::{Clock, Error, NonceSource, ParameterSet, Result, SigningCredential};
use crate::signer::OAuthSigner;

pub use postback::{PostbackPayload, PostbackVerifier};
pub use resource::{
    ActionSnapshot, AuthenticationRequestSnapshot, PairingSnapshot, ResourceSnapshot, ResourceType,
    TerminalSnapshot, UserSnapshot,
};

/// Form field carrying the postback blob
pub const IFRAME_DATA_FIELD: &str = "toopher_iframe_data";
pub const DEFAULT_URL_TTL: i64 = 300;
pub const DEFAULT_POSTBACK_TTL: i64 = 100;

/// Optional arguments for [`ToopherIframe::authentication_url`]
#[derive(Debug, Clone)]
pub struct AuthenticationUrlOptions {
    pub reset_email: String,
    pub session_token: String,
    pub action_name: String,
    pub requester_metadata: String,
    /// Extra frame parameters, e.g. `allow_inline_pairing`
    pub extras: ParameterSet,
    pub ttl: i64,
}

impl Default for AuthenticationUrlOptions {
    fn default() -> Self {
        Self {
            reset_email: String::new(),
            session_token: String::new(),
            action_name: "Log In".to_string(),
            requester_metadata: String::new(),
            extras: ParameterSet::new(),
            ttl: DEFAULT_URL_TTL,
        }
    }
}

/// Requester-side iframe integration: one credential, one clock shared by
/// URL signing and postback verification.
#[derive(Debug, Clone)]
pub struct ToopherIframe {
    base_url: String,
    signer: OAuthSigner,
    verifier: PostbackVerifier,
    postback_ttl: i64,
}

impl ToopherIframe {
    pub fn new(credential: SigningCredential, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if base_url.is_empty() {
            base_url = DEFAULT_BASE_URL.to_string();
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            base_url,
            verifier: PostbackVerifier::new(credential.clone()),
            signer: OAuthSigner::new(credential),
            postback_ttl: DEFAULT_POSTBACK_TTL,
        }
    }

    pub fn from_config(config: &crate::core::Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.credential()?, config.toopher.base_url.clone())
            .with_postback_ttl(config.toopher.postback_ttl))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.signer = self.signer.with_clock(clock.clone());
        self.verifier = self.verifier.with_clock(clock);
        self
    }

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.signer = self.signer.with_nonce_source(nonce);
        self
    }

    pub fn with_postback_ttl(mut self, ttl: i64) -> Self {
        self.postback_ttl = ttl;
        self
    }

    pub fn signer(&self) -> &OAuthSigner {
        &self.signer
    }

    pub fn verifier(&self) -> &PostbackVerifier {
        &self.verifier
    }

    /// Signed URL for the authentication frame
    pub fn authentication_url(&self, username: &str, options: &AuthenticationUrlOptions) -> String {
        let mut params = ParameterSet::new()
            .with("username", username)
            .with("reset_email", options.reset_email.as_str())
            .with("action_name", options.action_name.as_str())
            .with("session_token", options.session_token.as_str())
            .with("requester_metadata", options.requester_metadata.as_str());
        params.extend(options.extras.iter());

        self.signer
            .sign_url(&format!("{}web/authenticate", self.base_url), options.ttl, &params)
    }

    /// Signed URL for the user management frame
    pub fn user_management_url(&self, username: &str, reset_email: &str, extras: &ParameterSet, ttl: Option<i64>) -> String {
        let mut params = ParameterSet::new()
            .with("v", crate::signer::oauth::IFRAME_VERSION)
            .with("username", username)
            .with("reset_email", reset_email);
        params.extend(extras.iter());

        self.signer.sign_url(
            &format!("{}web/manage_user", self.base_url),
            ttl.unwrap_or(DEFAULT_URL_TTL),
            &params,
        )
    }

    /// Verify the submitted postback form and decode its resource, using the
    /// configured postback TTL.
    pub fn process_postback(&self, form: &ParameterSet, session_token: Option<&str>) -> Result<ResourceSnapshot> {
        self.process_postback_with_ttl(form, session_token, self.postback_ttl)
    }

    pub fn process_postback_with_ttl(
        &self,
        form: &ParameterSet,
        session_token: Option<&str>,
        ttl: i64,
    ) -> Result<ResourceSnapshot> {
        let blob = form
            .get(IFRAME_DATA_FIELD)
            .ok_or_else(|| Error::MissingFields(vec![IFRAME_DATA_FIELD.to_string()]))?;
        let payload = PostbackPayload::from_form(blob)?;
        self.verifier.verify(&payload, session_token, ttl)
    }

    /// See [`PostbackVerifier::is_granted`]
    pub fn is_authentication_granted(&self, form: &ParameterSet, session_token: Option<&str>) -> bool {
        postback::granted(self.process_postback(form, session_token))
    }
}
