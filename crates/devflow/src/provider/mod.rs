//! Device flow endpoint presets for well-known providers.
//!
//! A preset is nothing but fixed configuration: it adds no protocol logic of
//! its own, so an authenticator built from a preset behaves exactly like one
//! built from the same URLs by hand.

use crate::error::{Error, Result};
use url::Url;

/// GitHub device authorization endpoint.
pub const GITHUB_DEVICE_AUTH_URL: &str = "https://github.com/login/device/code";
/// GitHub token endpoint.
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Microsoft identity platform device authorization endpoint (`common` tenant).
pub const MICROSOFT_DEVICE_AUTH_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/devicecode";
/// Microsoft identity platform token endpoint (`common` tenant).
pub const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Google device authorization endpoint.
pub const GOOGLE_DEVICE_AUTH_URL: &str = "https://oauth2.googleapis.com/device/code";
/// Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Device flow provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// Provider name (e.g., "GitHub").
    pub name: String,
    /// Device authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// GitHub OAuth app / GitHub App device flow.
    ///
    /// GitHub answers both success and error with HTTP 200 and returns
    /// `verification_uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn github() -> Result<Self> {
        Self::new("GitHub", GITHUB_DEVICE_AUTH_URL, GITHUB_TOKEN_URL)
    }

    /// Microsoft identity platform device flow.
    ///
    /// Scopes:
    /// - `offline_access` - Refresh token
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn microsoft() -> Result<Self> {
        Ok(
            Self::new("Microsoft", MICROSOFT_DEVICE_AUTH_URL, MICROSOFT_TOKEN_URL)?
                .with_default_scopes(vec!["offline_access".to_string()]),
        )
    }

    /// Google "TV and limited input devices" flow.
    ///
    /// Google returns `verification_url` rather than `verification_uri` and
    /// requires the client secret on the token request.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_DEVICE_AUTH_URL, GOOGLE_TOKEN_URL)?
            .with_default_scopes(vec!["openid".to_string(), "email".to_string()]))
    }

    /// Looks up a preset by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for unknown names.
    pub fn by_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "github" => Self::github(),
            "microsoft" | "azure" | "entra" => Self::microsoft(),
            "google" => Self::google(),
            other => Err(Error::InvalidConfig(format!("unknown provider: {other}"))),
        }
    }

    /// Validates that both endpoints are HTTP(S) URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{field} must be an http(s) URL, got {url}"
                )));
            }
        }
        Ok(())
    }
}
