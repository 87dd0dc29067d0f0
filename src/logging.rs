//! Request and response log helpers, and a hook that applies them.

use crate::error::BoxError;
use crate::hooks::{Hooks, Outcome};

/// Logs the request line and every header at `info`.
pub fn log_request(req: &reqwest::Request) {
    tracing::info!(method = %req.method(), url = %req.url(), "Request");
    for (name, value) in req.headers() {
        tracing::info!(header = %name, value = ?value, "Request header");
    }
}

/// Logs the status and every header at `info`.
pub fn log_response(res: &reqwest::Response) {
    let status = res.status();
    tracing::info!(
        status = status.as_u16(),
        reason = status.canonical_reason().unwrap_or(""),
        url = %res.url(),
        "Response"
    );
    for (name, value) in res.headers() {
        tracing::info!(header = %name, value = ?value, "Response header");
    }
}

/// Hooks that log every outgoing request and every transport outcome.
///
/// # Examples
///
/// ```no_run
/// use quester::{Client, LoggingHooks};
///
/// # fn example() -> Result<(), quester::Error> {
/// let client = Client::new("https://api.example.com")?;
/// client.use_hook(LoggingHooks);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl Hooks for LoggingHooks {
    fn pre_request(&self, request: &mut reqwest::Request) -> Result<(), BoxError> {
        log_request(request);
        Ok(())
    }

    fn post_response(&self, outcome: &Outcome<'_>) -> Result<(), BoxError> {
        match outcome {
            Outcome::Received(response) => log_response(response),
            Outcome::Failed(error) => tracing::warn!(error = %error, "Request failed"),
        }
        Ok(())
    }
}
