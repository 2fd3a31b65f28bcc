//! HMAC-SHA1 primitive shared by request signing and postback verification

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Raw HMAC-SHA1 of `message` under `key`
pub fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Base64 (standard alphabet, padded) HMAC-SHA1
pub fn sign_base64(key: &[u8], message: &[u8]) -> String {
    BASE64.encode(sign(key, message))
}

/// Constant-time comparison of two encoded signatures
pub fn signatures_match(expected: &str, candidate: &str) -> bool {
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}
