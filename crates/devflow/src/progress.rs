//! User-facing progress reporting.
//!
//! The protocol never depends on what is shown to the user. Everything here
//! is a callback with a no-op default, so an implementation only overrides
//! what it cares about.

use std::io::{self, Write};

use crate::flow::AuthInfo;

/// Receives progress events from `authenticate`.
pub trait Progress: Send {
    /// Called once the device code has been issued, before any prompt.
    fn issued(&mut self, info: &AuthInfo) {
        let _ = info;
    }

    /// Called with the instruction text for the user.
    fn prompt(&mut self, text: &str) {
        let _ = text;
    }

    /// Called right before polling starts.
    fn begin(&mut self) {}

    /// Called when a token was obtained.
    fn succeed(&mut self, text: Option<&str>) {
        let _ = text;
    }

    /// Called when polling failed or was cancelled.
    fn fail(&mut self, text: Option<&str>) {
        let _ = text;
    }
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl Progress for NoopProgress {}

/// Logs events using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgress;

impl Progress for LoggingProgress {
    fn issued(&mut self, info: &AuthInfo) {
        tracing::debug!(
            verification_uri = %info.verification_uri,
            expires_in = info.expires_in,
            "device code issued"
        );
    }

    fn prompt(&mut self, text: &str) {
        tracing::info!("{text}");
    }

    fn begin(&mut self) {
        tracing::info!("Waiting for authentication...");
    }

    fn succeed(&mut self, text: Option<&str>) {
        tracing::info!(detail = text.unwrap_or_default(), "authentication succeeded");
    }

    fn fail(&mut self, text: Option<&str>) {
        tracing::warn!(detail = text.unwrap_or_default(), "authentication failed");
    }
}

/// Writes plain status lines to standard error.
///
/// Standard output stays free for whatever the caller prints (usually the
/// token itself).
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn line(text: &str) {
        // Broken stderr is not worth failing an authorization over.
        let _ = writeln!(io::stderr().lock(), "{text}");
    }
}

impl Progress for ConsoleProgress {
    fn prompt(&mut self, text: &str) {
        Self::line(text);
    }

    fn begin(&mut self) {
        Self::line("Waiting for authentication...");
    }

    fn succeed(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            Self::line(&format!("✓ {text}"));
        }
    }

    fn fail(&mut self, text: Option<&str>) {
        Self::line(&format!("✗ {}", text.unwrap_or("Authentication failed")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Progress for Recorder {
        fn prompt(&mut self, text: &str) {
            self.0.push(format!("prompt:{text}"));
        }
    }

    #[test]
    fn test_defaults_are_noops() {
        let mut recorder = Recorder::default();
        recorder.begin();
        recorder.succeed(Some("done"));
        recorder.fail(None);
        recorder.prompt("go");
        assert_eq!(recorder.0, vec!["prompt:go".to_string()]);
    }
}
