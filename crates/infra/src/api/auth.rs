//! Refresh-endpoint client
//!
//! The only component that calls the token refresh endpoint. A 401 from
//! this endpoint is terminal: it surfaces as an error and the coordinator
//! ends the session instead of refreshing a refresh.

use async_trait::async_trait;
use campfire_common::auth::{RefreshTransport, TokenPair};
use campfire_domain::{ApiError, Envelope};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::HttpClient;

/// Wire body of the refresh request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// `data` payload of a successful refresh envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Client for the token refresh endpoint
pub struct AuthApi {
    http: HttpClient,
    refresh_url: String,
}

impl AuthApi {
    /// Create a refresh client against `base_url` + `refresh_path`
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, refresh_path: &str) -> Self {
        Self { http, refresh_url: format!("{base_url}{refresh_path}") }
    }
}

#[async_trait]
impl RefreshTransport for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        debug!("exchanging refresh token");

        let request = self
            .http
            .request(Method::POST, &self.refresh_url)
            .header("Content-Type", "application/json")
            .json(&RefreshRequest { refresh_token });
        let response = self.http.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(envelope) = serde_json::from_str::<Envelope<RefreshData>>(&body) {
                if let Some(error) = envelope.error {
                    return Err(ApiError::Server { message: error.message, code: error.code });
                }
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            return Err(ApiError::Http { status: status.as_u16() });
        }

        let envelope: Envelope<RefreshData> =
            response.json().await.map_err(|err| ApiError::Decode(err.to_string()))?;
        let data = envelope.into_result()?;

        Ok(match data.expires_in {
            Some(seconds) => TokenPair::with_expiry(data.access_token, data.refresh_token, seconds),
            None => TokenPair::new(data.access_token, data.refresh_token),
        })
    }
}
