//! Device Authorization Grant configuration and protocol state.

mod device;
mod session;

pub use device::AuthInfo;
pub use session::{CancelReason, PollOutcome, PollStep, Session};

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::transport::HttpRequest;
use url::Url;

/// `grant_type` sent on every token poll.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Poll interval used until the server says otherwise, in seconds.
pub const DEFAULT_POLL_INTERVAL: u64 = 5;

/// Configuration for one app-to-provider pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (only for providers that demand one, e.g. Google).
    pub client_secret: Option<String>,
    /// Device authorization endpoint.
    pub auth_url: Url,
    /// Token endpoint.
    pub token_url: Url,
    /// Requested scopes, sent space-joined.
    pub scopes: Vec<String>,
    /// Base poll interval in seconds.
    pub poll_interval: u64,
    /// Provider-specific parameters appended to the device authorization request.
    pub extras: Vec<(String, String)>,
    /// Fail polling locally once the device code outlives `expires_in`.
    pub enforce_expiry: bool,
}

impl DeviceConfig {
    /// Creates a configuration for custom endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        client_id: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            scopes: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            extras: Vec::new(),
            enforce_expiry: false,
        })
    }

    /// Creates a configuration from a provider preset, using its default scopes.
    #[must_use]
    pub fn for_provider(provider: &Provider, client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_url: provider.auth_url.clone(),
            token_url: provider.token_url.clone(),
            scopes: provider.default_scopes.clone(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            extras: Vec::new(),
            enforce_expiry: false,
        }
    }

    /// GitHub preset.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn github<I, S>(client_id: impl Into<String>, scopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::for_provider(&Provider::github()?, client_id).with_scopes(scopes))
    }

    /// Microsoft identity platform preset.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn microsoft<I, S>(client_id: impl Into<String>, scopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::for_provider(&Provider::microsoft()?, client_id).with_scopes(scopes))
    }

    /// Google preset. Google requires the client secret on both requests.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google<I, S>(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::for_provider(&Provider::google()?, client_id)
            .with_client_secret(client_secret)
            .with_scopes(scopes))
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Replaces the requested scopes.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the base poll interval in seconds.
    #[must_use]
    pub const fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval = secs;
        self
    }

    /// Appends a provider-specific parameter to the device authorization request.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.push((name.into(), value.into()));
        self
    }

    /// Enables or disables local enforcement of the device code's `expires_in`.
    #[must_use]
    pub const fn with_expiry_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_expiry = enforce;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client ID is empty or an endpoint is not HTTP(S).
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::InvalidConfig("client_id is empty".into()));
        }
        for (field, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{field} must be an http(s) URL, got {url}"
                )));
            }
        }
        Ok(())
    }

    /// Builds the device authorization request.
    #[must_use]
    pub fn device_authorization_request(&self) -> HttpRequest {
        let mut request = self.with_client_credentials(HttpRequest::form_post(self.auth_url.clone()));

        if !self.scopes.is_empty() {
            request = request.param("scope", self.scopes.join(" "));
        }
        for (name, value) in &self.extras {
            request = request.param(name, value);
        }

        request
    }

    /// Builds one token polling request for `device_code`.
    #[must_use]
    pub fn token_request(&self, device_code: &str) -> HttpRequest {
        let request = HttpRequest::form_post(self.token_url.clone())
            .param("grant_type", DEVICE_CODE_GRANT_TYPE)
            .param("device_code", device_code);

        self.with_client_credentials(request)
    }

    fn with_client_credentials(&self, request: HttpRequest) -> HttpRequest {
        let request = request.param("client_id", &self.client_id);
        match &self.client_secret {
            Some(secret) => request.param("client_secret", secret),
            None => request,
        }
    }
}
