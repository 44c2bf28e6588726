//! `reqwest`-backed transports.

use super::{AsyncTransport, BlockingTransport, HttpRequest, HttpResponse, TransportError};

/// Async transport over a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing client (proxies, timeouts, custom TLS roots).
    #[must_use]
    pub const fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl AsyncTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.inner.post(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.form(&request.form).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Blocking transport over [`reqwest::blocking::Client`].
///
/// The blocking client runs its own runtime internally; construct and use it
/// outside of any async context.
#[derive(Debug, Clone, Default)]
pub struct BlockingReqwestTransport {
    inner: reqwest::blocking::Client,
}

impl BlockingReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing client.
    #[must_use]
    pub const fn with_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }
}

impl BlockingTransport for BlockingReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.inner.post(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.form(&request.form).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        Ok(HttpResponse { status, body })
    }
}
