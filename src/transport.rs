//! The engine that performs a single request/response exchange.

use async_trait::async_trait;
use reqwest::{Request, Response};

/// A trait abstracting HTTP request execution.
///
/// The client depends only on this contract. `reqwest::Client` implements it
/// directly; implement it yourself to substitute a different engine or a
/// test double.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use quester::Transport;
///
/// struct AlwaysTeapot;
///
/// #[async_trait]
/// impl Transport for AlwaysTeapot {
///     async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
///         Ok(http::Response::builder().status(418).body("short and stout").unwrap().into())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns once response headers are received.
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        reqwest::Client::execute(self, req).await
    }
}
