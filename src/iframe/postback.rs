//! Postback verification
//!
//! The iframe posts the outcome of a challenge back through the user's
//! browser, so nothing in the payload is trusted until every check passes:
//!
//! 1. provider error passthrough (`error_code`, unsigned by design)
//! 2. required keys present
//! 3. session token matches the one the requester issued
//! 4. timestamp within the TTL
//! 5. signature recomputed over the remaining fields
//! 6. resource decoded from the flat fields
//!
//! The first failing check ends verification. [`PostbackVerifier::validate`]
//! stops after step 5.

use std::sync::Arc;

use crate::core::{Clock, Error, ParameterSet, Result, SigningCredential, SystemClock};
use crate::iframe::resource::{self, ResourceSnapshot};
use crate::signer::{canonicalize, hmac};

pub const SIGNATURE_FIELD: &str = "toopher_sig";
pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const SESSION_TOKEN_FIELD: &str = "session_token";
pub const RESOURCE_TYPE_FIELD: &str = "resource_type";
pub const ERROR_CODE_FIELD: &str = "error_code";
pub const ERROR_MESSAGE_FIELD: &str = "error_message";

const REQUIRED_FIELDS: [&str; 3] = [SIGNATURE_FIELD, TIMESTAMP_FIELD, SESSION_TOKEN_FIELD];

/// Flat field map decoded from `toopher_iframe_data`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostbackPayload {
    fields: ParameterSet,
}

impl PostbackPayload {
    pub fn new(fields: ParameterSet) -> Self {
        Self { fields }
    }

    /// Decode a form-encoded blob
    pub fn from_form(blob: &str) -> Result<Self> {
        Ok(Self::new(crate::signer::canonical::form_decode(blob)?))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &ParameterSet {
        &self.fields
    }

    pub fn signature(&self) -> Option<&str> {
        self.get(SIGNATURE_FIELD)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get(TIMESTAMP_FIELD)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.get(SESSION_TOKEN_FIELD)
    }

    pub fn error_code(&self) -> Option<&str> {
        self.get(ERROR_CODE_FIELD)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.get(ERROR_MESSAGE_FIELD)
    }

    /// The provider's unsigned error report, if the payload carries one
    pub fn provider_error(&self) -> Option<Error> {
        self.error_code().map(|code| Error::ProviderReportedError {
            code: code.to_string(),
            message: self.error_message().unwrap_or_default().to_string(),
        })
    }
}

impl From<ParameterSet> for PostbackPayload {
    fn from(fields: ParameterSet) -> Self {
        Self::new(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PostbackPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Verifies postbacks signed with the consumer secret
#[derive(Clone)]
pub struct PostbackVerifier {
    credential: SigningCredential,
    clock: Arc<dyn Clock>,
}

impl PostbackVerifier {
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            credential,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Signature the provider computes over `fields` (which must not contain
    /// `toopher_sig`)
    pub fn compute_signature(&self, fields: &ParameterSet) -> String {
        hmac::sign_base64(
            self.credential.consumer_secret().as_bytes(),
            canonicalize(fields).as_bytes(),
        )
    }

    /// Run every check and decode the resource.
    pub fn verify(
        &self,
        payload: &PostbackPayload,
        expected_session_token: Option<&str>,
        ttl: i64,
    ) -> Result<ResourceSnapshot> {
        let verified = self.validate(payload, expected_session_token, ttl)?;
        resource::decode(&verified)
    }

    /// Run every check short of decoding; returns the signed fields without
    /// `toopher_sig`.
    ///
    /// `expected_session_token` of `None` or `""` skips session binding.
    /// Payloads timestamped in the future are not rejected.
    pub fn validate(
        &self,
        payload: &PostbackPayload,
        expected_session_token: Option<&str>,
        ttl: i64,
    ) -> Result<ParameterSet> {
        if let Some(err) = payload.provider_error() {
            return Err(err);
        }

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|key| payload.get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingFields(missing));
        }

        if let Some(expected) = expected_session_token.filter(|t| !t.is_empty()) {
            if payload.session_token() != Some(expected) {
                return Err(Error::SessionMismatch);
            }
        }

        let timestamp: i64 = payload
            .timestamp()
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| Error::MalformedResource("timestamp is not an integer".to_string()))?;
        let oldest = self.clock.now().checked_sub(ttl).ok_or(Error::Expired)?;
        if oldest >= timestamp {
            return Err(Error::Expired);
        }

        let mut unsigned = payload.fields().clone();
        let provided = unsigned.remove(SIGNATURE_FIELD).unwrap_or_default();
        let computed = self.compute_signature(&unsigned);
        if !hmac::signatures_match(&computed, &provided) {
            return Err(Error::SignatureMismatch);
        }

        Ok(unsigned)
    }

    /// True for a finished, granted authentication request, and for the
    /// provider reporting that the user disabled Toopher authentication (no
    /// challenge was required). False for every other outcome.
    pub fn is_granted(&self, payload: &PostbackPayload, expected_session_token: Option<&str>, ttl: i64) -> bool {
        granted(self.verify(payload, expected_session_token, ttl))
    }
}

pub(crate) fn granted(outcome: Result<ResourceSnapshot>) -> bool {
    match outcome {
        Ok(snapshot) => snapshot
            .as_authentication_request()
            .is_some_and(|auth| auth.is_granted()),
        Err(err) => err.is_user_disabled(),
    }
}

impl std::fmt::Debug for PostbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostbackVerifier")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}
