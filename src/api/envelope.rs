//! API error envelope: `{"error_code": int, "error_message": string}` on any
//! status >= 400

use serde::Deserialize;

use crate::core::{Error, Result};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// Pass a successful body through, or turn an error response into a typed
/// failure. An empty or malformed error body is still an error.
pub fn check_response(status: u16, reason: &str, body: &str) -> Result<()> {
    if status < 400 {
        return Ok(());
    }

    tracing::warn!(status, reason, "Toopher API call returned unexpected HTTP response");

    if body.trim().is_empty() {
        return Err(Error::Api {
            code: i64::from(status),
            message: reason.to_string(),
        });
    }

    let envelope: ErrorEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, "error parsing response body JSON");
        Error::Serialization(e)
    })?;

    match envelope.error_message {
        Some(message) => Err(Error::Api {
            code: envelope.error_code.unwrap_or(i64::from(status)),
            message,
        }),
        None => Err(Error::Api {
            code: i64::from(status),
            message: format!("{} - {}", reason, body),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes() {
        assert!(check_response(200, "OK", "{}").is_ok());
        assert!(check_response(204, "No Content", "").is_ok());
    }

    #[test]
    fn test_envelope() {
        match check_response(409, "Conflict", r#"{"error_code": 704, "error_message": "The specified user has disabled Toopher authentication"}"#) {
            Err(err @ Error::Api { .. }) => {
                assert!(err.is_user_disabled());
                assert_eq!(
                    err.to_string(),
                    "API error 704: The specified user has disabled Toopher authentication"
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_body() {
        match check_response(503, "Service Unavailable", "") {
            Err(Error::Api { code, message }) => {
                assert_eq!(code, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            check_response(500, "Internal Server Error", "<html>oops</html>"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_json_without_message() {
        match check_response(400, "Bad Request", r#"{"hello": "world"}"#) {
            Err(Error::Api { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, r#"Bad Request - {"hello": "world"}"#);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
