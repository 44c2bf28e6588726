//! `devflow` command-line client.
//!
//! Runs the device authorization grant against a provider preset or custom
//! endpoints and prints the resulting access token on standard output.
//! Prompts and logs go to standard error.

mod config;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use devflow::{
    AsyncAuthenticator, AsyncTransport, AuthInfo, AuthenticateOptions, Authenticator,
    CancelReason, ConsoleProgress, DeviceConfig, PollOutcome, Progress, Token,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "devflow=warn" } else { "devflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file = config::load_file(cli.config.as_deref())?;
    let device = config::resolve(&cli, file)?;
    info!(client_id = %device.client_id, auth_url = %device.auth_url, "Starting device flow");

    let mut options = AuthenticateOptions::new();
    if cli.quiet {
        options = options.without_success_message();
    }
    let mut progress = CliProgress {
        console: ConsoleProgress,
        open: cli.open,
        quiet: cli.quiet,
    };
    let timeout = cli.timeout.map(Duration::from_secs);

    let outcome = if cli.blocking {
        run_blocking(device, &options, &mut progress, timeout)?
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting async runtime")?;
        runtime.block_on(run_async(device, &options, &mut progress, timeout))?
    };

    let token = match outcome {
        PollOutcome::Token(token) => token,
        PollOutcome::Cancelled(CancelReason::Caller) => bail!("timed out waiting for authorization"),
        PollOutcome::Cancelled(reason) => bail!("authorization not completed: {reason}"),
    };
    print_token(&token, cli.json)
}

fn run_blocking(
    device: DeviceConfig,
    options: &AuthenticateOptions,
    progress: &mut CliProgress,
    timeout: Option<Duration>,
) -> Result<PollOutcome> {
    let mut auth = Authenticator::new(device);

    if let Some(timeout) = timeout {
        let cancel = auth.cancel_handle();
        // Detached; the process exits once authentication returns.
        thread::spawn(move || {
            thread::sleep(timeout);
            cancel.cancel();
        });
    }

    Ok(auth.authenticate(options, progress)?)
}

async fn run_async(
    device: DeviceConfig,
    options: &AuthenticateOptions,
    progress: &mut CliProgress,
    timeout: Option<Duration>,
) -> Result<PollOutcome> {
    let mut auth = AsyncAuthenticator::new(device);
    Ok(authenticate_within(&mut auth, options, progress, timeout).await?)
}

/// Runs the async flow, giving up once `timeout` elapses.
///
/// A timeout is reported like a caller cancellation on the blocking path.
async fn authenticate_within<T: AsyncTransport>(
    auth: &mut AsyncAuthenticator<T>,
    options: &AuthenticateOptions,
    progress: &mut dyn Progress,
    timeout: Option<Duration>,
) -> devflow::Result<PollOutcome> {
    let Some(timeout) = timeout else {
        return auth.authenticate(options, progress).await;
    };

    let finished = tokio::time::timeout(timeout, auth.authenticate(options, progress))
        .await
        .ok();
    if let Some(result) = finished {
        return result;
    }

    let reason = CancelReason::Caller;
    progress.fail(Some(&reason.to_string()));
    Ok(PollOutcome::Cancelled(reason))
}

fn print_token(token: &Token, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(token)?);
    } else {
        println!("{}", token.access_token);
    }
    Ok(())
}

/// Console output plus the optional browser launch.
struct CliProgress {
    console: ConsoleProgress,
    open: bool,
    quiet: bool,
}

impl Progress for CliProgress {
    fn issued(&mut self, info: &AuthInfo) {
        if !self.open {
            return;
        }
        let uri = info
            .verification_uri_complete
            .as_deref()
            .unwrap_or(&info.verification_uri);
        if let Err(e) = opener::open(uri) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    fn prompt(&mut self, text: &str) {
        // The user needs the code even in quiet mode.
        self.console.prompt(text);
    }

    fn begin(&mut self) {
        if !self.quiet {
            self.console.begin();
        }
    }

    fn succeed(&mut self, text: Option<&str>) {
        self.console.succeed(text);
    }

    fn fail(&mut self, text: Option<&str>) {
        self.console.fail(text);
    }
}
