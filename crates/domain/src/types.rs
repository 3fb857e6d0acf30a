//! Response envelope wire types
//!
//! Every Campfire API response body follows the same two-tier shape:
//! `{"success": bool, "data": <T|null>, "error": {"message", "code"}|null}`.
//! The envelope reports application-level success independently of the
//! HTTP status code, and servers may attach a structured error body even
//! to non-2xx responses.

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Structured error object carried inside a failure envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub message: String,
    /// Machine-readable code
    pub code: String,
}

/// Two-tier response envelope
///
/// Contract: `success == true` implies `data` is present; `success ==
/// false` implies `error` is present. Data absence on failure is not
/// guaranteed by the server and is tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Application-level success flag
    pub success: bool,
    /// Payload, present on success
    pub data: Option<T>,
    /// Structured error, present on failure
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    /// Extract the payload or the classified error
    ///
    /// # Errors
    /// - [`ApiError::Server`] when the envelope reports failure with a
    ///   structured error
    /// - [`ApiError::InvalidResponse`] when the envelope violates its own
    ///   contract (success without data, or failure without error)
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.success {
            self.data.ok_or(ApiError::InvalidResponse)
        } else {
            Err(self.failure_error())
        }
    }

    /// Like [`Envelope::into_result`] for calls with no payload to extract
    ///
    /// # Errors
    /// Same classification as [`Envelope::into_result`], except a missing
    /// `data` field on success is fine.
    pub fn into_unit_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(self.failure_error())
        }
    }

    fn failure_error(self) -> ApiError {
        match self.error {
            Some(ErrorBody { message, code }) => ApiError::Server { message, code },
            None => ApiError::InvalidResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Envelope<serde_json::Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn success_envelope_yields_data() {
        let envelope = decode(json!({"success": true, "data": {"id": 7}, "error": null}));
        assert_eq!(envelope.into_result().unwrap(), json!({"id": 7}));
    }

    #[test]
    fn failure_envelope_yields_server_error() {
        let envelope = decode(json!({
            "success": false,
            "data": null,
            "error": {"message": "m", "code": "C1"},
        }));
        assert_eq!(
            envelope.into_result().unwrap_err(),
            ApiError::Server { message: "m".into(), code: "C1".into() }
        );
    }

    #[test]
    fn success_without_data_is_invalid() {
        let envelope = decode(json!({"success": true, "data": null, "error": null}));
        assert_eq!(envelope.into_result().unwrap_err(), ApiError::InvalidResponse);
    }

    #[test]
    fn failure_without_error_is_invalid() {
        let envelope = decode(json!({"success": false}));
        assert_eq!(envelope.into_result().unwrap_err(), ApiError::InvalidResponse);
    }

    #[test]
    fn missing_fields_decode_as_absent() {
        // Servers omit `data` and `error` entirely rather than sending null
        let envelope = decode(json!({"success": true, "data": 42}));
        assert!(envelope.error.is_none());
        assert_eq!(envelope.into_result().unwrap(), json!(42));
    }

    #[test]
    fn unit_result_ignores_missing_data() {
        let envelope = decode(json!({"success": true}));
        assert!(envelope.into_unit_result().is_ok());
    }

    #[test]
    fn unit_result_still_surfaces_failure() {
        let envelope = decode(json!({
            "success": false,
            "error": {"message": "nope", "code": "E_NOPE"},
        }));
        assert_eq!(
            envelope.into_unit_result().unwrap_err(),
            ApiError::Server { message: "nope".into(), code: "E_NOPE".into() }
        );
    }

    #[test]
    fn failure_with_data_but_no_error_is_invalid() {
        // Data alongside a failure flag does not make the envelope valid
        let envelope = decode(json!({"success": false, "data": {"partial": true}}));
        assert_eq!(envelope.into_result().unwrap_err(), ApiError::InvalidResponse);
    }
}
