//! Transport-agnostic device flow state machine.
//!
//! [`Session`] never performs I/O. It produces [`HttpRequest`]s, consumes
//! [`HttpResponse`]s and tells its driver what to do next. The blocking and
//! async authenticators are thin loops around it, which keeps the protocol
//! identical across execution models.

use std::fmt;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{AuthInfo, DeviceConfig};
use crate::error::{Error, Result};
use crate::handler::{Handler, HandlerContext, HandlerRegistry};
use crate::token::{ErrorResponse, Token};
use crate::transport::{HttpRequest, HttpResponse};

/// Why polling ended without a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// A handler with `continue_on_error == false` ran for this error code.
    Handler {
        /// Error code the server sent.
        error: String,
    },
    /// The caller cancelled a pending wait.
    Caller,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler { error } => write!(f, "handler for `{error}` stopped polling"),
            Self::Caller => f.write_str("cancelled by caller"),
        }
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum PollOutcome {
    /// The user authorized the device.
    Token(Token),
    /// Polling stopped without a token and without an error.
    Cancelled(CancelReason),
}

impl PollOutcome {
    /// Returns the token, if any.
    #[must_use]
    pub fn token(self) -> Option<Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Cancelled(_) => None,
        }
    }

    /// Returns `true` if polling ended without a token.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Converts a cancellation into [`Error::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if polling ended without a token.
    pub fn into_token(self) -> Result<Token> {
        match self {
            Self::Token(token) => Ok(token),
            Self::Cancelled(reason) => Err(Error::Cancelled(reason)),
        }
    }
}

/// What the driver does after feeding a poll response to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum PollStep {
    /// Wait (if requested), then send the next token request.
    Retry {
        /// Wait requested by the handler.
        wait: Option<Duration>,
    },
    /// Wait (if requested), then return `outcome`.
    Done {
        /// Wait requested by the handler.
        wait: Option<Duration>,
        /// Final outcome.
        outcome: PollOutcome,
    },
}

/// Protocol state of one authenticator.
#[derive(Debug, Clone)]
pub struct Session {
    config: DeviceConfig,
    handlers: HandlerRegistry,
    auth_info: Option<AuthInfo>,
    poll_interval: u64,
    issued_at: Option<Instant>,
}

impl Session {
    /// Creates a session with the default handlers installed.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        let poll_interval = config.poll_interval;
        Self {
            config,
            handlers: HandlerRegistry::with_defaults(),
            auth_info: None,
            poll_interval,
            issued_at: None,
        }
    }

    /// Configuration this session was built with.
    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Current device authorization, if `ping` has succeeded.
    #[must_use]
    pub const fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }

    /// Effective poll interval in seconds (raised by `slow_down`).
    #[must_use]
    pub const fn poll_interval(&self) -> u64 {
        self.poll_interval
    }

    /// Registered handlers.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Attaches a handler, replacing any handler for the same error code.
    pub fn attach_handler(&mut self, handler: Handler) {
        self.handlers.attach(handler);
    }

    /// Removes the handler for `error`.
    pub fn detach_handler(&mut self, error: &str) -> Option<Handler> {
        self.handlers.detach(error)
    }

    /// Builds the device authorization request.
    #[must_use]
    pub fn ping_request(&self) -> HttpRequest {
        debug!(url = %self.config.auth_url, "requesting device authorization");
        self.config.device_authorization_request()
    }

    /// Consumes the device authorization response and stores the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] if the server sent an error code, and
    /// [`Error::InvalidResponse`] if the body is not a complete device
    /// authorization.
    pub fn on_ping_response(&mut self, response: &HttpResponse) -> Result<AuthInfo> {
        let body = json_object(response)?;

        if body.contains_key("error") {
            let err = error_response(body)?;
            warn!(error = %err.error, "device authorization rejected");
            return Err(err.into_error());
        }
        if !response.is_success() {
            return Err(Error::InvalidResponse(format!(
                "device authorization failed with HTTP {}",
                response.status
            )));
        }

        let info = AuthInfo::from_body(body, self.config.poll_interval)?;
        debug!(
            user_code = %info.user_code,
            verification_uri = %info.verification_uri,
            expires_in = info.expires_in,
            interval = info.interval,
            "device authorization issued"
        );

        self.auth_info = Some(info.clone());
        self.poll_interval = self.config.poll_interval;
        self.issued_at = Some(Instant::now());
        Ok(info)
    }

    /// Builds the next token request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAuthInfo`] before a successful `ping`, and
    /// [`Error::DeviceCodeExpired`] once the device code has outlived
    /// `expires_in` with expiry enforcement enabled.
    pub fn poll_request(&self) -> Result<HttpRequest> {
        let info = self.auth_info.as_ref().ok_or(Error::NoAuthInfo)?;

        if self.config.enforce_expiry {
            let elapsed = self.issued_at.map_or(Duration::ZERO, |at| at.elapsed());
            if elapsed >= Duration::from_secs(info.expires_in) {
                warn!(expires_in = info.expires_in, "device code expired locally");
                return Err(Error::DeviceCodeExpired {
                    expires_in: info.expires_in,
                });
            }
        }

        debug!(url = %self.config.token_url, "polling for token");
        Ok(self.config.token_request(&info.device_code))
    }

    /// Consumes one token response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] for error codes without a handler,
    /// [`Error::InvalidResponse`] for malformed bodies, and
    /// [`Error::NoAuthInfo`] before a successful `ping`.
    pub fn on_poll_response(&mut self, response: &HttpResponse) -> Result<PollStep> {
        let body = json_object(response)?;

        if !body.contains_key("error") {
            let token = Token::from_body(body)?;
            info!(token_type = ?token.token_type, scope = ?token.scope, "device authorized");
            return Ok(PollStep::Done {
                wait: None,
                outcome: PollOutcome::Token(token),
            });
        }

        let err = error_response(body)?;
        let Some(handler) = self.handlers.lookup(&err.error).cloned() else {
            warn!(error = %err.error, "no handler for authorization server error");
            return Err(err.into_error());
        };

        let info = self.auth_info.as_mut().ok_or(Error::NoAuthInfo)?;
        let mut ctx = HandlerContext::new(
            &mut self.poll_interval,
            info,
            &err.error,
            err.error_description.as_deref(),
        );
        handler.run(&mut ctx);
        let wait = ctx.requested_wait();

        debug!(
            error = %err.error,
            wait_secs = wait.map(|w| w.as_secs()),
            continue_on_error = handler.continue_on_error(),
            "handled authorization server error"
        );

        if handler.continue_on_error() {
            Ok(PollStep::Retry { wait })
        } else {
            Ok(PollStep::Done {
                wait,
                outcome: PollOutcome::Cancelled(CancelReason::Handler { error: err.error }),
            })
        }
    }
}

fn json_object(response: &HttpResponse) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::InvalidResponse(format!(
            "HTTP {}: expected a JSON object, got {other}",
            response.status
        ))),
        Err(e) => Err(Error::InvalidResponse(format!(
            "HTTP {}: body is not JSON: {e}",
            response.status
        ))),
    }
}

fn error_response(body: Map<String, Value>) -> Result<ErrorResponse> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| Error::InvalidResponse(format!("error response: {e}")))
}
