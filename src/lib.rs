//! # Quester - fluent HTTP requests with a hook chain
//!
//! Quester builds HTTP requests through chained calls, sends them through a
//! shared [`Client`] that applies default headers and an ordered chain of
//! [`Hooks`], and decodes the response body according to its
//! `Content-Type`. The network exchange itself is delegated to a
//! [`Transport`], `reqwest` by default.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quester::{Client, LoggingHooks, ResponseBody};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quester::Error> {
//!     let client = Client::new("https://api.example.com")?;
//!     client.use_hook(LoggingHooks);
//!
//!     // GET /users?id=7, decoded as JSON or XML depending on Content-Type
//!     let response = client
//!         .request()
//!         .path("/users")
//!         .query("id", "7")
//!         .bearer_token("s3cr3t")
//!         .timeout(Duration::from_secs(5))
//!         .execute::<User>()
//!         .await?;
//!
//!     match response.body {
//!         ResponseBody::Decoded(user) => println!("{} ({})", user.name, user.id),
//!         ResponseBody::Raw(bytes) => println!("unrecognised body: {} bytes", bytes.len()),
//!         ResponseBody::Unread => unreachable!("execute always reads the body"),
//!     }
//!
//!     // POST with a JSON body; Content-Type is filled in automatically
//!     let created = client
//!         .request()
//!         .method("POST")
//!         .path("/users")
//!         .json(&CreateUser { name: "Alice".to_string() })
//!         .send()
//!         .await?;
//!     println!("{}", created.status_text);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Hooks
//!
//! Hooks run in registration order before the request is sent and after the
//! transport returns. A pre-request error aborts the call before any network
//! activity; post-response errors are only logged.
//!
//! ```
//! use quester::{BoxError, Client, Hooks, Outcome};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct CountFailures(AtomicUsize);
//!
//! impl Hooks for CountFailures {
//!     fn post_response(&self, outcome: &Outcome<'_>) -> Result<(), BoxError> {
//!         if outcome.error().is_some() {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), quester::Error> {
//! let client = Client::new("https://api.example.com")?;
//! client.use_hook(CountFailures::default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! A decode failure still carries the status and headers:
//!
//! ```no_run
//! use quester::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new("https://api.example.com")?;
//! match client.request().path("/report").execute::<serde_json::Value>().await {
//!     Ok(response) => println!("{:?}", response.data()),
//!     Err(Error::Decode { response, source }) => {
//!         eprintln!("status {}: {}", response.status, source);
//!     }
//!     Err(e) => eprintln!("request failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod context;
mod error;
mod hooks;
pub mod logging;
mod request;
mod response;
mod trace;
mod transport;

pub use client::{Client, ClientBuilder};
pub use context::Context;
pub use error::{BoxError, DecodeError, Error, Result};
pub use hooks::{DefaultHooks, Hooks, Outcome};
pub use logging::LoggingHooks;
pub use request::Request;
pub use response::{Response, ResponseBody};
pub use transport::Transport;
