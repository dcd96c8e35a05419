//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::http::transport::{ApiRequest, RawResponse, Transport, TransportError};

/// Replays queued outcomes in order and records every request it sees.
/// Once the script runs out it answers 200 with `fallback`. Every send
/// yields to the scheduler once before answering.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    seen: Mutex<Vec<ApiRequest>>,
    fallback: String,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers every unscripted request with 200 and `body`.
    pub(crate) fn with_fallback(body: &str) -> Self {
        Self {
            fallback: body.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(RawResponse::new(status, body)))
    }

    pub(crate) fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<RawResponse, TransportError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn endpoints(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.endpoint).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        // Suspend once so concurrent callers interleave like real I/O.
        tokio::task::yield_now().await;
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(RawResponse::new(200, self.fallback.as_str())))
    }
}

/// Transport that never answers.
#[derive(Debug, Default)]
pub(crate) struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _request: &ApiRequest) -> Result<RawResponse, TransportError> {
        std::future::pending().await
    }
}
