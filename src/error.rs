//! Error types for building, dispatching and decoding requests.
//!
//! Errors fall into two groups. Everything that fails before or during the
//! network exchange carries no [`Response`]. A decode failure happens after a
//! successful exchange, so it carries the partially populated response along
//! with the codec error.

use crate::Response;
use http::StatusCode;

/// Boxed error returned by hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for requests made through a [`Client`](crate::Client).
///
/// # Examples
///
/// ```no_run
/// use quester::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new("https://api.example.com")?;
///
/// match client.request().path("/users/7").execute::<serde_json::Value>().await {
///     Ok(response) => println!("{:?}", response.data()),
///     Err(Error::Decode { response, source }) => {
///         eprintln!("status {} but body did not decode: {}", response.status, source);
///     }
///     Err(e) => eprintln!("request failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The composed URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request could not be assembled (bad method, header name or value).
    ///
    /// Mutators on [`Request`](crate::Request) capture these and report them
    /// when the request is sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The structured request body could not be encoded as JSON.
    ///
    /// Returned before any network activity.
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A pre-request hook rejected the request. The transport was never called.
    #[error("Pre-request hook failed: {0}")]
    Hook(#[source] BoxError),

    /// The transport failed (DNS, connection, TLS, transport timeout).
    ///
    /// The underlying `reqwest::Error` is carried unchanged.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request context's deadline passed before the exchange completed.
    #[error("Request timed out")]
    Timeout,

    /// The request context was cancelled before the exchange completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The exchange succeeded but the body could not be read or decoded.
    ///
    /// `response` always has a valid status, status text and headers. When the
    /// body was read before the codec failed it is kept as
    /// [`ResponseBody::Raw`](crate::ResponseBody::Raw).
    #[error("Failed to decode response (status {}): {source}", .response.status)]
    Decode {
        /// The partially populated response.
        response: Box<Response>,
        /// What went wrong while reading or decoding the body.
        source: DecodeError,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Failure while reading or decoding a response body.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The body stream could not be read to the end.
    #[error("reading body: {0}")]
    Body(#[source] reqwest::Error),

    /// The body was declared JSON but did not decode into the target type.
    #[error("json: {0}")]
    Json(#[source] serde_json::Error),

    /// The body was declared XML but did not decode into the target type.
    #[error("xml: {0}")]
    Xml(#[source] quick_xml::DeError),

    /// The request context's deadline passed while the body was being read.
    #[error("reading body: deadline exceeded")]
    Timeout,

    /// The request context was cancelled while the body was being read.
    #[error("reading body: cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the HTTP status code if the exchange got as far as a response.
    ///
    /// [`Error::Decode`] carries the status of its partial response; a
    /// [`Error::Network`] may carry one from the transport.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Decode { response, .. } => Some(response.status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the partially populated response of a decode failure.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Decode { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns `true` for context deadlines and transport-level timeouts.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// A specialized `Result` type for requests.
pub type Result<T> = std::result::Result<T, Error>;
