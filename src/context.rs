//! Cancellation and deadline carrier for a single request.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline.
//! Deriving a timeout creates a child token, so cancelling the parent still
//! cancels the request, while the child's registration in the parent is
//! released as soon as the derived context is dropped.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline.
///
/// # Examples
///
/// ```no_run
/// use quester::{Client, Context};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), quester::Error> {
/// let shutdown = CancellationToken::new();
/// let client = Client::new("https://api.example.com")?;
///
/// let response = client
///     .request()
///     .path("/slow")
///     .context(Context::with_cancellation(shutdown.clone()))
///     .timeout(Duration::from_secs(2))
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that also expires `timeout` from now.
    ///
    /// If this context already has an earlier deadline, that one is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once this context (or a parent) has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Runs `fut` until it completes, the deadline passes or the context is
    /// cancelled, whichever comes first.
    pub(crate) async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            () = self.token.cancelled() => Err(Error::Cancelled),
            () = expired => Err(Error::Timeout),
            output = fut => Ok(output),
        }
    }
}
