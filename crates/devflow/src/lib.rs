//! # devflow
//!
//! `OAuth2` Device Authorization Grant (RFC 8628) for CLIs, daemons and
//! other clients without a usable browser.
//!
//! ## Features
//!
//! - **Two execution models**: [`Authenticator`] (blocking) and
//!   [`AsyncAuthenticator`] (tokio) drive the same protocol [`Session`]
//! - **Pluggable error handling**: react to any server error code with a
//!   [`Handler`]; `authorization_pending` and `slow_down` are handled out of
//!   the box
//! - **Explicit outcomes**: polling ends in a [`Token`], a typed
//!   cancellation, or an [`Error`], never an empty value
//! - **Provider presets**: GitHub, Microsoft, Google
//! - **Injectable transport**: `reqwest` by default, anything implementing
//!   [`BlockingTransport`] / [`AsyncTransport`] otherwise
//!
//! ## Quick Start
//!
//! ### Blocking
//!
//! ```ignore
//! use devflow::{AuthenticateOptions, Authenticator, ConsoleProgress};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut auth = Authenticator::github("your_client_id", ["repo"])?;
//!
//!     // Prints "Go to https://github.com/login/device and enter code ..."
//!     let token = auth
//!         .authenticate(&AuthenticateOptions::new(), &mut ConsoleProgress)?
//!         .into_token()?;
//!
//!     println!("Access token: {}", token.access_token);
//!     Ok(())
//! }
//! ```
//!
//! ### Async, step by step
//!
//! ```ignore
//! use devflow::{AsyncAuthenticator, DeviceConfig, PollOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeviceConfig::github("your_client_id", ["read:user"])?;
//!     let mut auth = AsyncAuthenticator::new(config);
//!
//!     let info = auth.ping().await?;
//!     println!("Visit: {}", info.verification_uri);
//!     println!("Enter code: {}", info.user_code);
//!
//!     match auth.poll().await? {
//!         PollOutcome::Token(token) => println!("Authorized! {}", token.access_token),
//!         PollOutcome::Cancelled(reason) => println!("Stopped: {reason}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Custom handlers
//!
//! ```ignore
//! use devflow::Handler;
//!
//! // Treat a denial as a quiet stop instead of an error.
//! auth.attach_handler(Handler::stop("access_denied", |_| {}));
//! ```
//!
//! ## Deadlines
//!
//! The core polls until the server ends the exchange. Wrap async calls in
//! `tokio::time::timeout`, cancel blocking ones with
//! [`CancelHandle::cancel`], or opt in to local `expires_in` enforcement
//! with [`DeviceConfig::with_expiry_enforcement`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod authenticator;
mod error;
pub mod flow;
pub mod handler;
pub mod progress;
pub mod provider;
pub mod token;
pub mod transport;

pub use authenticator::{
    AsyncAuthenticator, AuthenticateOptions, Authenticator, CancelHandle, Message,
    DEFAULT_SUCCESS_MESSAGE,
};
pub use error::{Error, Result};
pub use flow::{AuthInfo, CancelReason, DeviceConfig, PollOutcome, PollStep, Session};
pub use handler::{Handler, HandlerContext, HandlerRegistry};
pub use progress::{ConsoleProgress, LoggingProgress, NoopProgress, Progress};
pub use provider::Provider;
pub use token::Token;
pub use transport::{
    AsyncTransport, BlockingReqwestTransport, BlockingTransport, HttpRequest, HttpResponse,
    ReqwestTransport, TransportError,
};
