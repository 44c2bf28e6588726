//! Reactions to authorization server error codes.
//!
//! While polling the token endpoint, RFC 8628 servers answer with error
//! codes such as `authorization_pending` and `slow_down` until the user has
//! finished. Each [`Handler`] maps one error code to an action and decides
//! whether polling goes on afterwards. Error codes with no handler end the
//! poll with [`Error::OAuth`](crate::Error::OAuth).
//!
//! Actions receive a [`HandlerContext`], an explicit handle over the
//! authenticator's mutable polling state. They never sleep themselves;
//! they *request* a wait, and the authenticator performs it in a way that
//! suits its execution model (cancellable condvar wait when blocking,
//! `tokio::time::sleep` when async).
//!
//! # Example
//!
//! ```ignore
//! use devflow::{Authenticator, DeviceConfig, Handler};
//!
//! let mut auth = Authenticator::new(DeviceConfig::github("Iv1.abc", ["repo"])?);
//!
//! // Stop quietly when the user declines instead of failing.
//! auth.attach_handler(Handler::stop("access_denied", |ctx| {
//!     tracing::info!(description = ?ctx.description(), "user declined");
//! }));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::flow::AuthInfo;

/// Error code: the user has not finished authorizing yet.
pub const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// Error code: the client is polling too fast.
pub const SLOW_DOWN: &str = "slow_down";

/// Seconds added to the polling interval on every `slow_down` (RFC 8628 §3.5).
pub const SLOW_DOWN_INCREMENT: u64 = 5;

/// Handler action.
pub type Action = Arc<dyn Fn(&mut HandlerContext<'_>) + Send + Sync>;

/// Mutable view of the authenticator state handed to a handler action.
pub struct HandlerContext<'a> {
    poll_interval: &'a mut u64,
    auth_info: &'a mut AuthInfo,
    error: &'a str,
    description: Option<&'a str>,
    wait: Option<Duration>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) const fn new(
        poll_interval: &'a mut u64,
        auth_info: &'a mut AuthInfo,
        error: &'a str,
        description: Option<&'a str>,
    ) -> Self {
        Self {
            poll_interval,
            auth_info,
            error,
            description,
            wait: None,
        }
    }

    /// Error code that triggered this handler.
    #[must_use]
    pub const fn error(&self) -> &str {
        self.error
    }

    /// `error_description` sent alongside the code, if any.
    #[must_use]
    pub const fn description(&self) -> Option<&str> {
        self.description
    }

    /// Current device authorization.
    #[must_use]
    pub fn auth_info(&self) -> &AuthInfo {
        self.auth_info
    }

    /// Authenticator poll interval, in seconds.
    #[must_use]
    pub const fn poll_interval(&self) -> u64 {
        *self.poll_interval
    }

    /// Replaces the authenticator poll interval.
    pub const fn set_poll_interval(&mut self, secs: u64) {
        *self.poll_interval = secs;
    }

    /// Server-specified interval of the current device authorization, in seconds.
    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.auth_info.interval
    }

    /// Replaces the interval of the current device authorization.
    pub const fn set_interval(&mut self, secs: u64) {
        self.auth_info.interval = secs;
    }

    /// Requests a wait before the next step. The last request wins.
    pub const fn wait(&mut self, duration: Duration) {
        self.wait = Some(duration);
    }

    /// Requests a wait of the current authorization interval.
    pub const fn wait_interval(&mut self) {
        self.wait(Duration::from_secs(self.auth_info.interval));
    }

    pub(crate) const fn requested_wait(&self) -> Option<Duration> {
        self.wait
    }
}

/// Reaction to one authorization server error code.
#[derive(Clone)]
pub struct Handler {
    error: String,
    action: Action,
    continue_on_error: bool,
}

impl Handler {
    /// Creates a handler that keeps polling after `action` runs.
    pub fn new<F>(error: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) + Send + Sync + 'static,
    {
        Self {
            error: error.into(),
            action: Arc::new(action),
            continue_on_error: true,
        }
    }

    /// Creates a handler that ends polling (without a token) after `action` runs.
    pub fn stop<F>(error: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) + Send + Sync + 'static,
    {
        Self::new(error, action).with_continue(false)
    }

    /// Sets whether polling continues after the action.
    #[must_use]
    pub const fn with_continue(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Error code this handler reacts to.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Whether polling continues after the action.
    #[must_use]
    pub const fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// Runs the action.
    pub fn run(&self, ctx: &mut HandlerContext<'_>) {
        (self.action)(ctx);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("error", &self.error)
            .field("continue_on_error", &self.continue_on_error)
            .finish_non_exhaustive()
    }
}

/// Handlers installed on every new authenticator.
///
/// - `authorization_pending`: wait the current interval, keep polling.
/// - `slow_down`: add [`SLOW_DOWN_INCREMENT`] to both the poll interval and
///   the authorization interval, wait the new interval, keep polling.
#[must_use]
pub fn default_handlers() -> Vec<Handler> {
    vec![
        Handler::new(AUTHORIZATION_PENDING, |ctx| ctx.wait_interval()),
        Handler::new(SLOW_DOWN, |ctx| {
            ctx.set_poll_interval(ctx.poll_interval().saturating_add(SLOW_DOWN_INCREMENT));
            ctx.set_interval(ctx.interval().saturating_add(SLOW_DOWN_INCREMENT));
            ctx.wait_interval();
        }),
    ]
}

/// Handlers keyed by error code.
///
/// Codes are unique: attaching a handler for a code that already has one
/// replaces it, and the replacement moves to the end of the list.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Creates a registry holding [`default_handlers`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for handler in default_handlers() {
            registry.attach(handler);
        }
        registry
    }

    /// Inserts `handler`, replacing any handler for the same code.
    pub fn attach(&mut self, handler: Handler) {
        self.handlers.retain(|h| h.error != handler.error);
        self.handlers.push(handler);
    }

    /// Removes and returns the handler for `error`.
    pub fn detach(&mut self, error: &str) -> Option<Handler> {
        let index = self.handlers.iter().position(|h| h.error == error)?;
        Some(self.handlers.remove(index))
    }

    /// Finds the handler for `error`.
    #[must_use]
    pub fn lookup(&self, error: &str) -> Option<&Handler> {
        self.handlers.iter().find(|h| h.error == error)
    }

    /// Handlers in registration order.
    #[must_use]
    pub fn list(&self) -> &[Handler] {
        &self.handlers
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
