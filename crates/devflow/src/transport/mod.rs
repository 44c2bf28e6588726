//! HTTP execution strategies.
//!
//! The device flow only ever issues form-encoded `POST` requests and reads a
//! JSON body back. [`HttpRequest`] and [`HttpResponse`] describe exactly
//! that, and the two transport traits decide *how* the exchange runs:
//!
//! - [`BlockingTransport`] performs the request on the calling thread.
//! - [`AsyncTransport`] returns a future, yielding to the runtime while the
//!   request is in flight.
//!
//! Both authenticators drive the same protocol session, so swapping the
//! transport never changes protocol behavior.

mod client;

use std::future::Future;

use url::Url;

pub use client::{BlockingReqwestTransport, ReqwestTransport};

/// A form-encoded `POST` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target endpoint.
    pub url: Url,
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Form parameters, in insertion order.
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a `POST` to `url` that asks for a JSON response.
    #[must_use]
    pub fn form_post(url: Url) -> Self {
        Self {
            url,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            form: Vec::new(),
        }
    }

    /// Appends a form parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Returns the value of the first form parameter called `name`.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value of the first header called `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn encoded_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.form)
            .finish()
    }
}

/// Raw response from the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failure to complete an HTTP exchange.
///
/// Transport errors carry no OAuth error code, so the handler registry never
/// sees them; they propagate straight to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    /// Wraps any error (or message) as a transport failure.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// Executes requests on the calling thread.
pub trait BlockingTransport {
    /// Sends `request` and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response could be obtained.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Executes requests as futures on an async runtime.
pub trait AsyncTransport: Send + Sync {
    /// Sends `request` and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response could be obtained.
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
