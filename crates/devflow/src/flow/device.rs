//! Device authorization response (RFC 8628 §3.2).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Codes and URIs issued by the device authorization endpoint.
///
/// Created by `ping`, held by the authenticator until the next `ping`. Only
/// `interval` changes afterwards, and only through handler actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthInfo {
    /// Device code for polling. Never shown to the user.
    pub device_code: String,
    /// User code to display to the user.
    pub user_code: String,
    /// Verification URI where user should go.
    pub verification_uri: String,
    /// Verification URI with the user code already embedded (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_uri_complete: Option<String>,
    /// Lifetime of the device code in seconds.
    pub expires_in: u64,
    /// Minimum seconds between polling requests.
    pub interval: u64,
}

/// Device authorization response as providers actually send it.
#[derive(Debug, Deserialize)]
struct DeviceAuthorizationResponse {
    device_code: String,
    user_code: String,
    #[serde(default)]
    verification_uri: Option<String>,
    // Google and older Microsoft endpoints.
    #[serde(default)]
    verification_url: Option<String>,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    expires_in: u64,
    #[serde(default)]
    interval: Option<u64>,
}

impl AuthInfo {
    /// Parses a device authorization body.
    ///
    /// `verification_uri` wins over `verification_url` when both are present.
    /// A missing `interval` falls back to `default_interval`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] if a required field is missing or
    /// has the wrong type.
    pub fn from_body(body: Map<String, Value>, default_interval: u64) -> Result<Self> {
        let response: DeviceAuthorizationResponse = serde_json::from_value(Value::Object(body))
            .map_err(|e| Error::InvalidResponse(format!("device authorization response: {e}")))?;

        let verification_uri = response
            .verification_uri
            .filter(|uri| !uri.is_empty())
            .or_else(|| response.verification_url.filter(|url| !url.is_empty()))
            .ok_or_else(|| {
                Error::InvalidResponse(
                    "device authorization response: missing field `verification_uri`".into(),
                )
            })?;

        Ok(Self {
            device_code: response.device_code,
            user_code: response.user_code,
            verification_uri,
            verification_uri_complete: response.verification_uri_complete,
            expires_in: response.expires_in,
            interval: response.interval.unwrap_or(default_interval),
        })
    }
}
