//! Shared test transport.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use devflow::{AsyncTransport, BlockingTransport, HttpRequest, HttpResponse, TransportError};
use serde_json::{Value, json};

/// Transport that replays scripted responses and records every request,
/// together with the (tokio) time it was sent.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    responses: VecDeque<Result<HttpResponse, String>>,
    requests: Vec<(HttpRequest, tokio::time::Instant)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    /// Queues an OAuth error body (RFC style, HTTP 400).
    pub fn push_error(&self, code: &str) -> &Self {
        self.push_json(400, json!({ "error": code }))
    }

    /// Queues a successful token body.
    pub fn push_token(&self, access_token: &str) -> &Self {
        self.push_json(
            200,
            json!({ "access_token": access_token, "token_type": "bearer", "scope": "repo" }),
        )
    }

    /// Queues a transport failure.
    pub fn push_failure(&self, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn request_times(&self) -> Vec<tokio::time::Instant> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }

    fn next(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push((request.clone(), tokio::time::Instant::now()));
        match state.responses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("no scripted response left")),
        }
    }
}

impl BlockingTransport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }
}

impl AsyncTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }
}

/// Device authorization body with the given interval.
pub fn device_authorization(interval: u64) -> Value {
    json!({
        "device_code": "3584d83530557fdd1f46af8289938c8ef79f9dc5",
        "user_code": "WDJB-MJHT",
        "verification_uri": "https://github.com/login/device",
        "expires_in": 900,
        "interval": interval
    })
}
