//! Exchange lifecycle events for requests with tracing enabled.
//!
//! Events are emitted under the `quester::trace` target so they can be
//! filtered independently of the rest of the crate's logging. They are
//! observational only; nothing here feeds back into the request.
//!
//! Only what the transport boundary exposes is reported: the peer address
//! of the connection that carried the exchange, the arrival of the response
//! head, the end of the body, or the failure. Name resolution and connection
//! setup happen inside the transport's pool and are not visible here, so no
//! DNS or connect events are emitted.

use std::time::Instant;

pub(crate) const TARGET: &str = "quester::trace";

/// Lifecycle recorder for one traced exchange.
#[derive(Debug)]
pub(crate) struct Trace {
    method: reqwest::Method,
    url: url::Url,
    started: Instant,
}

impl Trace {
    /// Starts the clock. Nothing is emitted until the exchange resolves.
    pub(crate) fn start(method: &reqwest::Method, url: &url::Url) -> Self {
        Self {
            method: method.clone(),
            url: url.clone(),
            started: Instant::now(),
        }
    }

    /// Records the outcome of the dispatch.
    ///
    /// A request rejected by a pre-request hook never reached the transport
    /// and produces no event.
    pub(crate) fn exchanged(&self, result: &crate::Result<reqwest::Response>) {
        match result {
            Ok(response) => self.first_byte(response),
            Err(crate::Error::Hook(_)) => {}
            Err(error) => tracing::info!(
                target: TARGET,
                method = %self.method,
                url = %self.url,
                error = %error,
                elapsed_ms = self.elapsed_ms(),
                "Exchange failed"
            ),
        }
    }

    /// Records the size of a fully read body.
    pub(crate) fn body_read(&self, len: usize) {
        tracing::info!(
            target: TARGET,
            bytes = len,
            elapsed_ms = self.elapsed_ms(),
            "Body read"
        );
    }

    fn first_byte(&self, response: &reqwest::Response) {
        match response.remote_addr() {
            Some(addr) => tracing::info!(target: TARGET, %addr, "Peer address"),
            None => tracing::info!(target: TARGET, "Peer address unknown"),
        }
        tracing::info!(
            target: TARGET,
            method = %self.method,
            url = %self.url,
            status = response.status().as_u16(),
            elapsed_ms = self.elapsed_ms(),
            "Got first response byte"
        );
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
