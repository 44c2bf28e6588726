//! Blocking and async authenticators.
//!
//! Both types own a [`Session`] and a transport and differ only in how they
//! run a request and how they wait. Use [`Authenticator`] from plain threads
//! and [`AsyncAuthenticator`] inside a tokio runtime.
//!
//! Neither enforces an overall deadline. Async callers wrap `poll` or
//! `authenticate` in `tokio::time::timeout` (dropping the future abandons
//! polling; the device code simply expires server-side). Blocking callers
//! call [`CancelHandle::cancel`] from another thread.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::error::Result;
use crate::flow::{AuthInfo, CancelReason, DeviceConfig, PollOutcome, PollStep, Session};
use crate::handler::{Handler, HandlerRegistry};
use crate::progress::Progress;
use crate::transport::{
    AsyncTransport, BlockingReqwestTransport, BlockingTransport, ReqwestTransport,
};

/// Text shown when `authenticate` obtains a token with the default options.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Authentication successful!";

/// Which text to show for a step of `authenticate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Message {
    /// The built-in text.
    #[default]
    Default,
    /// Caller-supplied text.
    Custom(String),
    /// Nothing.
    Suppressed,
}

/// User-facing messaging for `authenticate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticateOptions {
    /// Shown after `ping`, before polling.
    pub message: Message,
    /// Shown once a token was obtained.
    pub success_message: Message,
}

impl AuthenticateOptions {
    /// Default prompt and success message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the prompt.
    #[must_use]
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.message = Message::Custom(text.into());
        self
    }

    /// Shows no prompt.
    #[must_use]
    pub fn without_message(mut self) -> Self {
        self.message = Message::Suppressed;
        self
    }

    /// Replaces the success message.
    #[must_use]
    pub fn with_success_message(mut self, text: impl Into<String>) -> Self {
        self.success_message = Message::Custom(text.into());
        self
    }

    /// Shows no success message.
    #[must_use]
    pub fn without_success_message(mut self) -> Self {
        self.success_message = Message::Suppressed;
        self
    }

    /// Prompt for `info`, if one should be shown.
    #[must_use]
    pub fn prompt_text(&self, info: &AuthInfo) -> Option<String> {
        match &self.message {
            Message::Default => Some(format!(
                "Go to {} and enter code {} to authenticate.",
                info.verification_uri, info.user_code
            )),
            Message::Custom(text) => Some(text.clone()),
            Message::Suppressed => None,
        }
    }

    /// Success message, if one should be shown.
    #[must_use]
    pub fn success_text(&self) -> Option<&str> {
        match &self.success_message {
            Message::Default => Some(DEFAULT_SUCCESS_MESSAGE),
            Message::Custom(text) => Some(text),
            Message::Suppressed => None,
        }
    }
}

fn present(info: &AuthInfo, options: &AuthenticateOptions, progress: &mut dyn Progress) {
    progress.issued(info);
    if let Some(text) = options.prompt_text(info) {
        progress.prompt(&text);
    }
    progress.begin();
}

fn finish(
    result: Result<PollOutcome>,
    options: &AuthenticateOptions,
    progress: &mut dyn Progress,
) -> Result<PollOutcome> {
    match &result {
        Ok(PollOutcome::Token(_)) => progress.succeed(options.success_text()),
        Ok(PollOutcome::Cancelled(reason)) => progress.fail(Some(&reason.to_string())),
        Err(e) => progress.fail(Some(&e.to_string())),
    }
    result
}

/// Cancels the waits of a blocking [`Authenticator`] from another thread.
///
/// Cancelling wakes a pending wait immediately; the in-flight request (if
/// any) still completes. The flag stays set until [`CancelHandle::reset`],
/// so a cancel issued before `ping` still stops the following `poll`.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelHandle {
    /// Creates a handle that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes any waiting poll.
    pub fn cancel(&self) {
        let (flag, wakeup) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wakeup.notify_all();
    }

    /// Returns `true` once `cancel` was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears a previous cancellation.
    pub fn reset(&self) {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    /// Sleeps for `duration` unless cancelled first. Returns `true` if cancelled.
    fn wait(&self, duration: Duration) -> bool {
        let (flag, wakeup) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = wakeup
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Device flow authenticator for blocking callers.
///
/// # Example
///
/// ```ignore
/// use devflow::{AuthenticateOptions, Authenticator, ConsoleProgress};
///
/// let mut auth = Authenticator::github("Iv1.abc", ["repo"])?;
/// let token = auth
///     .authenticate(&AuthenticateOptions::new(), &mut ConsoleProgress)?
///     .into_token()?;
/// ```
#[derive(Debug)]
pub struct Authenticator<T = BlockingReqwestTransport> {
    session: Session,
    transport: T,
    cancel: CancelHandle,
}

impl Authenticator {
    /// Creates an authenticator over a default blocking `reqwest` client.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_transport(config, BlockingReqwestTransport::new())
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
        Ok(Self::new(DeviceConfig::github(client_id, scopes)?))
    }
}

impl<T> Authenticator<T> {
    /// Creates an authenticator over `transport`.
    #[must_use]
    pub fn with_transport(config: DeviceConfig, transport: T) -> Self {
        Self {
            session: Session::new(config),
            transport,
            cancel: CancelHandle::new(),
        }
    }

    /// Protocol state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        self.session.config()
    }

    /// Current device authorization, if `ping` has succeeded.
    #[must_use]
    pub const fn auth_info(&self) -> Option<&AuthInfo> {
        self.session.auth_info()
    }

    /// Effective poll interval in seconds.
    #[must_use]
    pub const fn poll_interval(&self) -> u64 {
        self.session.poll_interval()
    }

    /// Registered handlers.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        self.session.handlers()
    }

    /// Attaches a handler, replacing any handler for the same error code.
    pub fn attach_handler(&mut self, handler: Handler) {
        self.session.attach_handler(handler);
    }

    /// Removes the handler for `error`.
    pub fn detach_handler(&mut self, error: &str) -> Option<Handler> {
        self.session.detach_handler(error)
    }

    /// Handle that cancels pending waits from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: BlockingTransport> Authenticator<T> {
    /// Requests device and user codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    pub fn ping(&mut self) -> Result<AuthInfo> {
        let request = self.session.ping_request();
        let response = self.transport.send(&request)?;
        self.session.on_ping_response(&response)
    }

    /// Polls the token endpoint until a token, a stopping handler, or an error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, malformed responses, error
    /// codes without a handler, or when called before `ping`.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled(CancelReason::Caller));
            }

            let request = self.session.poll_request()?;
            let response = self.transport.send(&request)?;

            match self.session.on_poll_response(&response)? {
                PollStep::Retry { wait } => {
                    if wait.is_some_and(|wait| self.cancel.wait(wait)) {
                        return Ok(PollOutcome::Cancelled(CancelReason::Caller));
                    }
                }
                PollStep::Done { wait, outcome } => {
                    if let Some(wait) = wait {
                        self.cancel.wait(wait);
                    }
                    return Ok(outcome);
                }
            }
        }
    }

    /// Runs `ping`, shows the prompt, then `poll`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `ping` or `poll`.
    pub fn authenticate(
        &mut self,
        options: &AuthenticateOptions,
        progress: &mut dyn Progress,
    ) -> Result<PollOutcome> {
        let info = self.ping()?;
        present(&info, options, progress);
        let result = self.poll();
        finish(result, options, progress)
    }
}

/// Device flow authenticator for async callers.
///
/// Waits are `tokio::time::sleep`, so other tasks keep running while the
/// user authorizes.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use devflow::{AsyncAuthenticator, AuthenticateOptions, DeviceConfig, LoggingProgress};
///
/// let mut auth = AsyncAuthenticator::new(DeviceConfig::github("Iv1.abc", ["repo"])?);
/// let outcome = tokio::time::timeout(
///     Duration::from_secs(300),
///     auth.authenticate(&AuthenticateOptions::new(), &mut LoggingProgress),
/// )
/// .await??;
/// ```
#[derive(Debug)]
pub struct AsyncAuthenticator<T = ReqwestTransport> {
    session: Session,
    transport: T,
}

impl AsyncAuthenticator {
    /// Creates an authenticator over a default `reqwest` client.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
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
        Ok(Self::new(DeviceConfig::github(client_id, scopes)?))
    }
}

impl<T> AsyncAuthenticator<T> {
    /// Creates an authenticator over `transport`.
    #[must_use]
    pub fn with_transport(config: DeviceConfig, transport: T) -> Self {
        Self {
            session: Session::new(config),
            transport,
        }
    }

    /// Protocol state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        self.session.config()
    }

    /// Current device authorization, if `ping` has succeeded.
    #[must_use]
    pub const fn auth_info(&self) -> Option<&AuthInfo> {
        self.session.auth_info()
    }

    /// Effective poll interval in seconds.
    #[must_use]
    pub const fn poll_interval(&self) -> u64 {
        self.session.poll_interval()
    }

    /// Registered handlers.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        self.session.handlers()
    }

    /// Attaches a handler, replacing any handler for the same error code.
    pub fn attach_handler(&mut self, handler: Handler) {
        self.session.attach_handler(handler);
    }

    /// Removes the handler for `error`.
    pub fn detach_handler(&mut self, error: &str) -> Option<Handler> {
        self.session.detach_handler(error)
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: AsyncTransport> AsyncAuthenticator<T> {
    /// Requests device and user codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    pub async fn ping(&mut self) -> Result<AuthInfo> {
        let request = self.session.ping_request();
        let response = self.transport.send(&request).await?;
        self.session.on_ping_response(&response)
    }

    /// Polls the token endpoint until a token, a stopping handler, or an error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, malformed responses, error
    /// codes without a handler, or when called before `ping`.
    pub async fn poll(&mut self) -> Result<PollOutcome> {
        loop {
            let request = self.session.poll_request()?;
            let response = self.transport.send(&request).await?;

            match self.session.on_poll_response(&response)? {
                PollStep::Retry { wait } => pause(wait).await,
                PollStep::Done { wait, outcome } => {
                    pause(wait).await;
                    return Ok(outcome);
                }
            }
        }
    }

    /// Runs `ping`, shows the prompt, then `poll`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `ping` or `poll`.
    pub async fn authenticate(
        &mut self,
        options: &AuthenticateOptions,
        progress: &mut dyn Progress,
    ) -> Result<PollOutcome> {
        let info = self.ping().await?;
        present(&info, options, progress);
        let result = self.poll().await;
        finish(result, options, progress)
    }
}

async fn pause(wait: Option<Duration>) {
    if let Some(wait) = wait {
        tokio::time::sleep(wait).await;
    }
}
