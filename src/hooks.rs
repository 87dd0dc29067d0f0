//! Lifecycle hooks run by [`Client::dispatch`](crate::Client::dispatch).
//!
//! Every registered hook sees the outgoing request before it is sent and the
//! outcome after the transport returns. Hooks run sequentially in
//! registration order in both phases.
//!
//! The two phases are deliberately asymmetric: an error from
//! [`Hooks::pre_request`] aborts the dispatch, while an error from
//! [`Hooks::post_response`] is logged and otherwise ignored.

use std::sync::Arc;

use crate::error::{BoxError, Error};

/// Result of the transport call, as seen by [`Hooks::post_response`].
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The transport returned a response. The body has not been read.
    Received(&'a reqwest::Response),
    /// The transport call failed, timed out or was cancelled.
    Failed(&'a Error),
}

impl<'a> Outcome<'a> {
    /// Returns the response, if one was received.
    pub fn response(&self) -> Option<&'a reqwest::Response> {
        match *self {
            Outcome::Received(response) => Some(response),
            Outcome::Failed(_) => None,
        }
    }

    /// Returns the error, if the transport call failed.
    pub fn error(&self) -> Option<&'a Error> {
        match *self {
            Outcome::Received(_) => None,
            Outcome::Failed(error) => Some(error),
        }
    }
}

/// A pair of extension points around every dispatched request.
///
/// Both methods default to doing nothing, so an implementation overrides
/// only the phase it cares about.
///
/// # Examples
///
/// ```
/// use quester::{BoxError, Hooks};
///
/// struct RequireTenant;
///
/// impl Hooks for RequireTenant {
///     fn pre_request(&self, request: &mut reqwest::Request) -> Result<(), BoxError> {
///         if !request.headers().contains_key("x-tenant") {
///             return Err("missing x-tenant header".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Hooks: Send + Sync {
    /// Called before the request is sent, after default headers are applied.
    ///
    /// The request may be modified. Returning an error stops the dispatch:
    /// no later hook runs, the transport is not called and no post-response
    /// hook runs.
    fn pre_request(&self, _request: &mut reqwest::Request) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after the transport returns, whether it succeeded or not.
    ///
    /// Errors are diagnostic only and never reach the caller.
    fn post_response(&self, _outcome: &Outcome<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Hooks that do nothing in either phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

/// Lets one hook instance be registered on several clients and inspected
/// afterwards through the caller's own handle.
impl<H: Hooks + ?Sized> Hooks for Arc<H> {
    fn pre_request(&self, request: &mut reqwest::Request) -> Result<(), BoxError> {
        (**self).pre_request(request)
    }

    fn post_response(&self, outcome: &Outcome<'_>) -> Result<(), BoxError> {
        (**self).post_response(outcome)
    }
}
