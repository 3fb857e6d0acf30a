//! Authenticated request executor
//!
//! Runs the full request pipeline: connectivity short-circuit, bearer
//! attachment, dispatch, single-flight refresh-and-retry on 401, and
//! envelope decoding into typed results or the closed error taxonomy.

use std::sync::Arc;
use std::time::Duration;

use campfire_common::auth::{
    LogoutEvent, RefreshCoordinator, RefreshOutcome, TokenStore,
};
use campfire_domain::{ApiError, Envelope};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use super::auth::AuthApi;
use super::connectivity::ConnectivityGate;
use super::endpoint::{Endpoint, ParamEncoding};
use crate::http::HttpClient;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for all endpoints except direct storage uploads
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Path of the token refresh endpoint
    pub refresh_path: String,
    /// Upper bound on a single refresh episode
    pub refresh_timeout: Duration,
    /// User agent reported to the API
    pub user_agent: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.campfire.app/v1".to_string(),
            timeout: Duration::from_secs(30),
            refresh_path: "/auth/refresh".to_string(),
            refresh_timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// Authenticated API client
///
/// Explicitly constructed and dependency-injected: it owns its refresh
/// coordinator and borrows the credential store and connectivity gate it
/// was built with. There is no process-wide instance.
pub struct ApiClient {
    http: HttpClient,
    config: ApiClientConfig,
    store: Arc<dyn TokenStore>,
    gate: ConnectivityGate,
    refresh: RefreshCoordinator,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidUrl`] when the configured base URL does
    /// not parse, or [`ApiError::Unknown`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        config: ApiClientConfig,
        store: Arc<dyn TokenStore>,
        gate: ConnectivityGate,
    ) -> Result<Self, ApiError> {
        url::Url::parse(&config.base_url).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;

        let mut http = HttpClient::builder().timeout(config.timeout);
        if let Some(agent) = &config.user_agent {
            http = http.user_agent(agent.clone());
        }
        let http = http.build()?;

        let auth_api = AuthApi::new(http.clone(), &config.base_url, &config.refresh_path);
        let refresh = RefreshCoordinator::with_timeout(
            Arc::clone(&store),
            Arc::new(auth_api),
            config.refresh_timeout,
        );

        Ok(Self { http, config, store, gate, refresh })
    }

    /// Create a builder for fluent configuration
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Subscribe to the logout broadcast
    ///
    /// One event is emitted per failed refresh episode; UI surfaces
    /// subscribe here instead of the core pushing into an ambient bus.
    #[must_use]
    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutEvent> {
        self.refresh.subscribe_logout()
    }

    /// Execute an endpoint and decode the envelope payload
    ///
    /// # Errors
    /// Every failure is classified into [`ApiError`]; see the taxonomy for
    /// the mapping.
    #[instrument(skip(self, endpoint), fields(path = endpoint.path()))]
    pub async fn send<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let response = self.dispatch(endpoint, None).await?;
        let status = response.status();

        if status.is_success() {
            let envelope: Envelope<T> =
                response.json().await.map_err(|err| ApiError::Decode(err.to_string()))?;
            envelope.into_result()
        } else {
            Err(Self::classify_failure(status, &response.text().await.unwrap_or_default()))
        }
    }

    /// Execute an endpoint whose envelope carries no payload
    ///
    /// # Errors
    /// Same classification as [`ApiClient::send`]; a missing `data` field
    /// on success is fine here.
    #[instrument(skip(self, endpoint), fields(path = endpoint.path()))]
    pub async fn send_no_content(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        let response = self.dispatch(endpoint, None).await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            // No body at all by RFC spec; nothing to decode.
            return Ok(());
        }

        if status.is_success() {
            let envelope: Envelope<serde_json::Value> =
                response.json().await.map_err(|err| ApiError::Decode(err.to_string()))?;
            envelope.into_unit_result()
        } else {
            Err(Self::classify_failure(status, &response.text().await.unwrap_or_default()))
        }
    }

    /// Execute an endpoint with a caller-supplied pre-serialized JSON body
    ///
    /// The raw body replaces parameter encoding; everything else follows
    /// the normal pipeline.
    ///
    /// # Errors
    /// Same classification as [`ApiClient::send`].
    #[instrument(skip(self, endpoint, body), fields(path = endpoint.path()))]
    pub async fn send_raw<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(endpoint, Some(&body)).await?;
        let status = response.status();

        if status.is_success() {
            let envelope: Envelope<T> =
                response.json().await.map_err(|err| ApiError::Decode(err.to_string()))?;
            envelope.into_result()
        } else {
            Err(Self::classify_failure(status, &response.text().await.unwrap_or_default()))
        }
    }

    /// Upload bytes directly to a pre-signed storage URL
    ///
    /// The destination authenticates via the URL itself, so no bearer
    /// token is attached and no envelope is expected; success is purely
    /// status-code based. The connectivity gate still applies.
    ///
    /// # Errors
    /// [`ApiError::Disconnected`] when offline, [`ApiError::Http`] on a
    /// non-2xx status, transport failures as [`ApiError::Unknown`].
    #[instrument(skip(self, bytes), fields(url = %url, size = bytes.len()))]
    pub async fn upload(&self, url: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        if !self.gate.is_online() {
            return Err(ApiError::Disconnected);
        }

        let request =
            self.http.request(Method::PUT, url).header("Content-Type", "image/jpeg").body(bytes);
        let response = self.http.send(request).await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            warn!(%status, "storage upload rejected");
            Err(ApiError::Http { status: status.as_u16() })
        }
    }

    /// Run the shared pipeline up to a settled (possibly retried) response
    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        raw_body: Option<&[u8]>,
    ) -> Result<Response, ApiError> {
        if !self.gate.is_online() {
            return Err(ApiError::Disconnected);
        }

        let response = self.execute(endpoint, raw_body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if endpoint.path() == self.config.refresh_path {
            // Refreshing a refresh would loop; a 401 here is terminal.
            return Err(ApiError::Unauthorized);
        }

        debug!(path = endpoint.path(), "request unauthorized, joining refresh");
        match self.refresh.acquire().await {
            RefreshOutcome::Retry => {
                let retried = self.execute(endpoint, raw_body).await?;
                if retried.status() == StatusCode::UNAUTHORIZED {
                    // The one allowed retry also failed; never re-enter the
                    // refresh machine for the same original request.
                    return Err(ApiError::Unauthorized);
                }
                Ok(retried)
            }
            RefreshOutcome::Abandon => Err(ApiError::Unauthorized),
        }
    }

    /// Issue one HTTP attempt for the endpoint
    ///
    /// Reads the access token fresh on every attempt so a post-refresh
    /// retry picks up the new pair.
    async fn execute(
        &self,
        endpoint: &Endpoint,
        raw_body: Option<&[u8]>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, endpoint.path());
        let mut request = self
            .http
            .request(endpoint.method().clone(), &url)
            .header("Content-Type", "application/json");

        for (name, value) in endpoint.headers() {
            request = request.header(name, value);
        }

        // Anonymous endpoints are legal; attach the header only when a
        // token exists.
        if let Some(access) = self.store.access_token().await {
            request = request.header("Authorization", format!("Bearer {access}"));
        }

        request = Self::encode_payload(request, endpoint, raw_body);

        self.http.send(request).await
    }

    fn encode_payload(
        request: RequestBuilder,
        endpoint: &Endpoint,
        raw_body: Option<&[u8]>,
    ) -> RequestBuilder {
        if let Some(body) = raw_body {
            return request.body(body.to_vec());
        }

        match endpoint.param_encoding() {
            ParamEncoding::Query => {
                let pairs = endpoint.query_pairs();
                if pairs.is_empty() {
                    request
                } else {
                    request.query(&pairs)
                }
            }
            ParamEncoding::JsonBody => match endpoint.body_params() {
                Some(params) => request.json(params),
                None => request,
            },
        }
    }

    /// Classify a non-2xx, non-401 response
    ///
    /// Servers may embed a structured error alongside the status; when one
    /// is present it wins over the bare status code.
    fn classify_failure(status: StatusCode, body: &str) -> ApiError {
        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(body) {
            if let Some(error) = envelope.error {
                return ApiError::Server { message: error.message, code: error.code };
            }
        }
        ApiError::Http { status: status.as_u16() }
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    store: Option<Arc<dyn TokenStore>>,
    gate: Option<ConnectivityGate>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    #[must_use]
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the credential store
    #[must_use]
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the connectivity gate
    #[must_use]
    pub fn gate(mut self, gate: ConnectivityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// Returns an error when the credential store is missing or client
    /// construction fails.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let store = self
            .store
            .ok_or_else(|| ApiError::Unknown("credential store not set".to_string()))?;
        let gate = self.gate.unwrap_or_else(ConnectivityGate::assume_online);

        ApiClient::new(config, store, gate)
    }
}
