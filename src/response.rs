//! Response value produced by [`Request::send`](crate::Request::send) and
//! [`Request::execute`](crate::Request::execute).
//!
//! Status, status text and headers are always populated. What happened to
//! the body is recorded in [`ResponseBody`], chosen by the response's
//! `Content-Type`.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// What became of the response body.
///
/// # Examples
///
/// ```
/// use quester::ResponseBody;
///
/// let body: ResponseBody<u32> = ResponseBody::Raw(bytes::Bytes::from_static(b"plain"));
/// match body {
///     ResponseBody::Decoded(n) => println!("decoded {n}"),
///     ResponseBody::Raw(bytes) => println!("{} raw bytes", bytes.len()),
///     ResponseBody::Unread => println!("no decode target"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody<T> {
    /// No decode target was requested. The body was drained and released.
    Unread,
    /// The body was JSON or XML and decoded into the target type.
    Decoded(T),
    /// The content type was absent or not recognised; these are the exact bytes.
    Raw(Bytes),
}

/// A completed HTTP exchange.
///
/// `T` is the decode target of [`Request::execute`](crate::Request::execute).
/// Responses from [`Request::send`](crate::Request::send) and the partial
/// response inside [`Error::Decode`](crate::Error::Decode) use the default `()`.
#[derive(Debug, Clone)]
pub struct Response<T = ()> {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The status line text, e.g. `"200 OK"`.
    pub status_text: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// The body outcome.
    pub body: ResponseBody<T>,
}

impl<T> Response<T> {
    /// Creates a response with an [`Unread`](ResponseBody::Unread) body from
    /// status and headers.
    pub(crate) fn head(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            status_text: status_text(status),
            headers,
            body: ResponseBody::Unread,
        }
    }

    /// Returns the decoded value, if the body was decoded.
    pub fn data(&self) -> Option<&T> {
        match &self.body {
            ResponseBody::Decoded(data) => Some(data),
            _ => None,
        }
    }

    /// Consumes the response and returns the decoded value, if any.
    pub fn into_data(self) -> Option<T> {
        match self.body {
            ResponseBody::Decoded(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the raw body bytes when the content type was not recognised.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns a header value by name, if present and valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quester::{Response, ResponseBody};
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("text/plain"));
    ///
    /// let response: Response = Response {
    ///     status: StatusCode::OK,
    ///     status_text: "200 OK".to_string(),
    ///     headers,
    ///     body: ResponseBody::Unread,
    /// };
    ///
    /// assert_eq!(response.header("content-type"), Some("text/plain"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Drops the body outcome, keeping status and headers.
    pub(crate) fn without_body(&self) -> Response {
        Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: ResponseBody::Unread,
        }
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
