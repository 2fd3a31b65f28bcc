//! Two-legged OAuth 1.0 request and URL signing (HMAC-SHA1)

use std::sync::Arc;

use crate::core::{Clock, NonceSource, ParameterSet, RandomNonce, Result, SigningCredential, SystemClock};
use crate::signer::canonical::{build_query, canonicalize_rfc3986, rfc3986_encode};
use crate::signer::hmac;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";
/// Iframe protocol version sent as `v`
pub const IFRAME_VERSION: &str = "2";

/// A signed request: caller params untouched, plus the oauth params
/// (ending with `oauth_signature`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: String,
    pub url: String,
    pub params: ParameterSet,
    pub oauth_params: ParameterSet,
    pub signature: String,
}

impl SignedRequest {
    /// `Authorization` header value, oauth keys sorted
    pub fn authorization_header(&self) -> String {
        let fields = self
            .oauth_params
            .sorted()
            .into_iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, rfc3986_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {}", fields)
    }

    /// App params first, oauth params second
    pub fn query_string(&self) -> String {
        if self.params.is_empty() {
            build_query(&self.oauth_params)
        } else {
            format!("{}&{}", build_query(&self.params), build_query(&self.oauth_params))
        }
    }

    /// `url?query_string`
    pub fn signed_url(&self) -> String {
        format!("{}?{}", self.url, self.query_string())
    }
}

/// Outbound signer bound to one credential.
///
/// Time and nonce come from injected strategies; with a fixed clock and nonce
/// every call is byte-for-byte reproducible.
#[derive(Clone)]
pub struct OAuthSigner {
    credential: SigningCredential,
    clock: Arc<dyn Clock>,
    nonce: Arc<dyn NonceSource>,
}

impl OAuthSigner {
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            credential,
            clock: Arc::new(SystemClock),
            nonce: Arc::new(RandomNonce),
        }
    }

    /// Validate the key pair and build a signer
    pub fn from_keys(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Result<Self> {
        Ok(Self::new(SigningCredential::new(consumer_key, consumer_secret)?))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn credential(&self) -> &SigningCredential {
        &self.credential
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sign `params` for `method url`
    pub fn sign_request(&self, method: &str, url: &str, params: &ParameterSet) -> SignedRequest {
        self.sign_at(method, url, params, self.clock.now())
    }

    /// Sign an embeddable URL valid for `ttl` seconds.
    ///
    /// Sets `v` (in place when the caller already placed it) and appends
    /// `expires`, then signs as a GET. `expires` saturates at `i64::MAX`.
    pub fn sign_url(&self, base_url: &str, ttl: i64, params: &ParameterSet) -> String {
        let now = self.clock.now();
        let mut params = params.clone();
        params.insert("v", IFRAME_VERSION);
        params.insert("expires", now.saturating_add(ttl).to_string());
        self.sign_at("GET", base_url, &params, now).signed_url()
    }

    fn sign_at(&self, method: &str, url: &str, params: &ParameterSet, timestamp: i64) -> SignedRequest {
        let method = method.to_ascii_uppercase();

        let mut oauth_params = ParameterSet::new()
            .with("oauth_consumer_key", self.credential.consumer_key())
            .with("oauth_signature_method", SIGNATURE_METHOD)
            .with("oauth_version", OAUTH_VERSION)
            .with("oauth_nonce", self.nonce.nonce())
            .with("oauth_timestamp", timestamp.to_string());

        let mut all = params.clone();
        all.extend(oauth_params.iter());

        let base = format!(
            "{}&{}&{}",
            method,
            rfc3986_encode(url),
            rfc3986_encode(&canonicalize_rfc3986(&all))
        );
        let key = format!("{}&", rfc3986_encode(self.credential.consumer_secret()));
        let signature = hmac::sign_base64(key.as_bytes(), base.as_bytes());

        oauth_params.insert("oauth_signature", signature.clone());

        SignedRequest {
            method,
            url: url.to_string(),
            params: params.clone(),
            oauth_params,
            signature,
        }
    }
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, FixedNonce, ManualClock};

    const AUTHENTICATE_URL: &str = "https://api.toopher.test/v1/web/authenticate";

    fn signer() -> OAuthSigner {
        OAuthSigner::from_keys("abcdefg", "hijklmnop")
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(1000)))
            .with_nonce_source(Arc::new(FixedNonce::new("12345678")))
    }

    fn default_authenticate_params() -> ParameterSet {
        ParameterSet::new()
            .with("username", "jdoe")
            .with("reset_email", "")
            .with("action_name", "Log In")
            .with("session_token", "")
            .with("requester_metadata", "")
    }

    #[test]
    fn test_empty_keys_fail_fast() {
        assert!(matches!(OAuthSigner::from_keys("", "s"), Err(Error::CredentialInvalid(_))));
        assert!(matches!(OAuthSigner::from_keys("k", ""), Err(Error::CredentialInvalid(_))));
    }

    #[test]
    fn test_sign_url_vector() {
        let url = signer().sign_url(AUTHENTICATE_URL, 300, &default_authenticate_params());
        assert_eq!(
            url,
            "https://api.toopher.test/v1/web/authenticate?username=jdoe&reset_email=&action_name=Log+In\
             &session_token=&requester_metadata=&v=2&expires=1300&oauth_consumer_key=abcdefg\
             &oauth_signature_method=HMAC-SHA1&oauth_version=1.0&oauth_nonce=12345678\
             &oauth_timestamp=1000&oauth_signature=NkaWUjEPRLwgsQMEJGsIQEpyRT4%3D"
        );
    }

    #[test]
    fn test_sign_url_keeps_caller_placed_version() {
        let params = ParameterSet::new()
            .with("v", "2")
            .with("username", "jdoe")
            .with("reset_email", "jdoe@example.com");
        let url = signer().sign_url("https://api.toopher.test/v1/web/manage_user", 300, &params);
        assert_eq!(
            url,
            "https://api.toopher.test/v1/web/manage_user?v=2&username=jdoe&reset_email=jdoe%40example.com\
             &expires=1300&oauth_consumer_key=abcdefg&oauth_signature_method=HMAC-SHA1&oauth_version=1.0\
             &oauth_nonce=12345678&oauth_timestamp=1000&oauth_signature=NjwH5yWPE2CCJL8v%2FMNknL%2BeTpE%3D"
        );
    }

    #[test]
    fn test_sign_url_expiry_saturates() {
        let url = signer().sign_url(AUTHENTICATE_URL, i64::MAX, &default_authenticate_params());
        assert!(url.contains(&format!("&expires={}&", i64::MAX)));
    }

    #[test]
    fn test_sign_request_deterministic() {
        let s = signer();
        let params = ParameterSet::new().with("user_name", "jdoe").with("terminal_name", "my laptop");
        let first = s.sign_request("post", "https://api.toopher.test/v1/authentication_requests/initiate", &params);
        let second = s.sign_request("POST", "https://api.toopher.test/v1/authentication_requests/initiate", &params);

        assert_eq!(first, second);
        assert_eq!(first.method, "POST");
        assert_eq!(first.params, params);
        assert_eq!(first.oauth_params.get("oauth_signature"), Some(first.signature.as_str()));
    }

    #[test]
    fn test_sign_request_matches_sign_url() {
        // sign_url is a GET over the same base string
        let mut params = default_authenticate_params();
        params.insert("v", "2");
        params.insert("expires", "1300");
        let signed = signer().sign_request("GET", AUTHENTICATE_URL, &params);
        assert_eq!(signed.signature, "NkaWUjEPRLwgsQMEJGsIQEpyRT4=");
    }

    #[test]
    fn test_signature_depends_on_values_not_order() {
        let s = signer();
        let url = "https://api.toopher.test/v1/users";
        let a = ParameterSet::new().with("a", "1").with("b", "2");
        let b = ParameterSet::new().with("b", "2").with("a", "1");
        let c = ParameterSet::new().with("a", "1").with("b", "3");

        assert_eq!(s.sign_request("GET", url, &a).signature, s.sign_request("GET", url, &b).signature);
        assert_ne!(s.sign_request("GET", url, &a).signature, s.sign_request("GET", url, &c).signature);
        assert_ne!(s.sign_request("GET", url, &a).signature, s.sign_request("POST", url, &a).signature);
    }

    #[test]
    fn test_authorization_header() {
        let signed = signer().sign_request("GET", "https://api.toopher.test/v1/users", &ParameterSet::new());
        let header = signed.authorization_header();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"abcdefg\", oauth_nonce=\"12345678\", oauth_signature=\""));
        assert!(header.ends_with(
            "oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1000\", oauth_version=\"1.0\""
        ));
        assert_eq!(signed.query_string(), build_query(&signed.oauth_params));
    }

    #[test]
    fn test_override_applies_to_every_call() {
        let clock = Arc::new(ManualClock::new(1000));
        let s = signer().with_clock(clock.clone());
        let params = ParameterSet::new().with("x", "y");

        let before = s.sign_request("GET", AUTHENTICATE_URL, &params);
        assert_eq!(before, s.sign_request("GET", AUTHENTICATE_URL, &params));

        clock.set(2000);
        let after = s.sign_request("GET", AUTHENTICATE_URL, &params);
        assert_eq!(after.oauth_params.get("oauth_timestamp"), Some("2000"));
        assert_ne!(before.signature, after.signature);
    }

    #[test]
    fn test_random_nonce_by_default() {
        let s = OAuthSigner::from_keys("abcdefg", "hijklmnop").unwrap();
        let params = ParameterSet::new();
        let a = s.sign_request("GET", AUTHENTICATE_URL, &params);
        let b = s.sign_request("GET", AUTHENTICATE_URL, &params);
        assert_ne!(a.oauth_params.get("oauth_nonce"), b.oauth_params.get("oauth_nonce"));
    }
}
