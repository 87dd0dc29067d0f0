//! Fluent request builder.
//!
//! A [`Request`] accumulates configuration through chained calls and is
//! consumed by [`send`](Request::send) or [`execute`](Request::execute).
//! Mutators never fail. Invalid header names or values are captured and
//! reported when the request is sent, and so is a structured body that fails
//! to encode.

use crate::{
    client::parse_header,
    error::DecodeError,
    trace::Trace,
    Client, Context, Error, Response, ResponseBody, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Request body, resolved when the request is sent.
enum RequestBody {
    /// No body.
    Empty,
    /// Bytes or a stream, sent as-is.
    Stream(reqwest::Body),
    /// A structured value encoded as JSON, or the encoding failure.
    Json(serde_json::Result<Vec<u8>>),
}

/// A single HTTP request under construction.
///
/// Created by [`Client::request`]. The request borrows its client and is
/// consumed by sending it.
///
/// # Examples
///
/// ```no_run
/// use quester::Client;
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct NewUser<'a> {
///     name: &'a str,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
/// }
///
/// # async fn example() -> Result<(), quester::Error> {
/// let client = Client::new("https://api.example.com")?;
///
/// let created = client
///     .request()
///     .method("post")
///     .path("/users")
///     .bearer_token("s3cr3t")
///     .header("X-Request-Id", "abc123")
///     .json(&NewUser { name: "alice" })
///     .timeout(Duration::from_secs(5))
///     .execute::<User>()
///     .await?;
///
/// println!("status {}", created.status);
/// # Ok(())
/// # }
/// ```
#[must_use = "Request does nothing until .send() or .execute() is called"]
pub struct Request<'c> {
    client: &'c Client,
    method: String,
    path: String,
    headers: HeaderMap,
    query: BTreeMap<String, String>,
    body: RequestBody,
    ctx: Option<Context>,
    basic_auth: Option<(String, String)>,
    bearer_token: Option<String>,
    trace: bool,
    /// Error captured during building (deferred to send time)
    error: Option<Error>,
}

impl<'c> Request<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self {
            client,
            method: "GET".to_string(),
            path: String::new(),
            headers: HeaderMap::new(),
            query: BTreeMap::new(),
            body: RequestBody::Empty,
            ctx: None,
            basic_auth: None,
            bearer_token: None,
            trace: false,
            error: None,
        }
    }

    /// Sets the HTTP method. The name is upper-cased; the default is `GET`.
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        self.method = method.as_ref().to_uppercase();
        self
    }

    /// Sets the path appended to the client's base URL.
    ///
    /// The path is concatenated verbatim, with no separator handling:
    /// `"http://api.test"` and `"/users"` make `"http://api.test/users"`,
    /// while `"http://api.test/"` and `"/users"` make
    /// `"http://api.test//users"`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets a header, replacing any value previously set under the same name
    /// on this request.
    ///
    /// Headers set here always win over the client's defaults.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Sets a query parameter, replacing any earlier value for `key`.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Merges query parameters, replacing earlier values key by key.
    pub fn queries<K, V>(mut self, queries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(queries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a raw body (bytes, a string or a stream), sent without
    /// transformation and without touching `Content-Type`.
    pub fn body(mut self, body: impl Into<reqwest::Body>) -> Self {
        self.body = RequestBody::Stream(body.into());
        self
    }

    /// Sets a structured body, sent as JSON.
    ///
    /// `Content-Type: application/json` is added unless a `Content-Type`
    /// header is already set when the request is sent. An encoding failure
    /// surfaces as [`Error::Serialization`] from `send`/`execute`, before any
    /// network activity.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = RequestBody::Json(serde_json::to_vec(value));
        self
    }

    /// Sets basic-auth credentials.
    ///
    /// Applied when either part is non-empty, and written onto the request
    /// before the bearer token and the per-request headers are considered.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Sets a bearer token, sent as `Authorization: Bearer <token>` unless
    /// basic auth or an explicit [`header`](Request::header) provides
    /// `Authorization`.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attaches a cancellation/deadline context.
    pub fn context(mut self, ctx: Context) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Bounds the request by `timeout`, derived from the attached context or
    /// from a background context if none is attached.
    ///
    /// The deadline covers the exchange and the reading of the body. If the
    /// context already has an earlier deadline, that one is kept.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let derived = match &self.ctx {
            Some(ctx) => ctx.with_timeout(timeout),
            None => Context::background().with_timeout(timeout),
        };
        self.ctx = Some(derived);
        self
    }

    /// Logs exchange-lifecycle events for this request under the
    /// `quester::trace` target: peer address, first response byte, body
    /// read, or the transport failure. A request rejected by a pre-request
    /// hook logs nothing.
    pub fn enable_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// The URL this request will be sent to: base URL, path and, when there
    /// are query parameters, `?` followed by the form-encoded query sorted by
    /// key.
    pub fn full_url(&self) -> String {
        let mut url = format!("{}{}", self.client.base_url(), self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&self.query));
        }
        url
    }

    /// Sends the request without decoding the body.
    ///
    /// The returned response carries status, status text and headers; its
    /// body is [`ResponseBody::Unread`] and the connection's body is released.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built, a pre-request hook
    /// rejects it, or the transport fails.
    pub async fn send(self) -> Result<Response> {
        let (res, _ctx, _trace) = self.exchange().await?;
        Ok(Response::head(res.status(), res.headers().clone()))
    }

    /// Sends the request and decodes the body into `T` according to the
    /// response's `Content-Type`.
    ///
    /// | `Content-Type` contains            | body becomes                    |
    /// |------------------------------------|---------------------------------|
    /// | `application/json`                 | [`ResponseBody::Decoded`] (JSON) |
    /// | `application/xml` or `text/xml`    | [`ResponseBody::Decoded`] (XML)  |
    /// | anything else, or no header        | [`ResponseBody::Raw`] bytes      |
    ///
    /// The status is not inspected: a 404 with a JSON body decodes like a 200.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Request::send) returns, plus [`Error::Decode`]
    /// when the body cannot be read or decoded. That error still carries the
    /// status, status text and headers.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Response<T>> {
        let (res, ctx, trace) = self.exchange().await?;
        let mut response = Response::head(res.status(), res.headers().clone());

        let bytes = match ctx.run(res.bytes()).await {
            Ok(Ok(bytes)) => {
                if let Some(trace) = &trace {
                    trace.body_read(bytes.len());
                }
                bytes
            }
            Ok(Err(e)) => return Err(decode_failure(&response, None, DecodeError::Body(e))),
            Err(Error::Cancelled) => {
                return Err(decode_failure(&response, None, DecodeError::Cancelled))
            }
            Err(_) => return Err(decode_failure(&response, None, DecodeError::Timeout)),
        };

        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        match decode_body(content_type, bytes.clone()) {
            Ok(body) => {
                response.body = body;
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    status = response.status.as_u16(),
                    content_type = content_type,
                    "Failed to decode response body"
                );
                Err(decode_failure(&response, Some(bytes), e))
            }
        }
    }

    /// Assembles the transport request and dispatches it through the client.
    async fn exchange(mut self) -> Result<(reqwest::Response, Context, Option<Trace>)> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let url = self.full_url();
        let Request {
            client,
            method,
            mut headers,
            body,
            ctx,
            basic_auth,
            bearer_token,
            trace,
            ..
        } = self;

        let body = match body {
            RequestBody::Empty => None,
            RequestBody::Stream(body) => Some(body),
            RequestBody::Json(Ok(encoded)) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(reqwest::Body::from(encoded))
            }
            RequestBody::Json(Err(e)) => return Err(Error::Serialization(e)),
        };

        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("Invalid method {:?}: {}", method, e)))?;
        let url = Url::parse(&url)?;

        let mut request = reqwest::Request::new(method, url);
        *request.body_mut() = body;

        if let Some((username, password)) = basic_auth {
            if !username.is_empty() || !password.is_empty() {
                request
                    .headers_mut()
                    .insert(AUTHORIZATION, basic_auth_value(&username, &password)?);
            }
        }

        if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
            let explicit = request.headers().contains_key(AUTHORIZATION)
                || headers.contains_key(AUTHORIZATION);
            if !explicit {
                let value = HeaderValue::try_from(format!("Bearer {}", token))
                    .map_err(|e| Error::InvalidRequest(format!("Invalid bearer token: {}", e)))?;
                request.headers_mut().insert(AUTHORIZATION, sensitive(value));
            }
        }

        for (name, value) in &headers {
            request.headers_mut().append(name.clone(), value.clone());
        }

        let ctx = ctx.unwrap_or_default();
        let trace = trace.then(|| Trace::start(request.method(), request.url()));

        let result = client.dispatch(request, &ctx).await;
        if let Some(trace) = &trace {
            trace.exchanged(&result);
        }

        Ok((result?, ctx, trace))
    }
}

fn encode_query(query: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish()
}

fn basic_auth_value(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    let value = HeaderValue::try_from(format!("Basic {}", encoded))
        .map_err(|e| Error::InvalidRequest(format!("Invalid basic auth: {}", e)))?;
    Ok(sensitive(value))
}

fn sensitive(mut value: HeaderValue) -> HeaderValue {
    value.set_sensitive(true);
    value
}

/// Picks a codec by substring match on the content type.
fn decode_body<T: DeserializeOwned>(
    content_type: &str,
    bytes: Bytes,
) -> std::result::Result<ResponseBody<T>, DecodeError> {
    if content_type.contains("application/json") {
        serde_json::from_slice(&bytes)
            .map(ResponseBody::Decoded)
            .map_err(DecodeError::Json)
    } else if content_type.contains("application/xml") || content_type.contains("text/xml") {
        quick_xml::de::from_reader(bytes.as_ref())
            .map(ResponseBody::Decoded)
            .map_err(DecodeError::Xml)
    } else {
        Ok(ResponseBody::Raw(bytes))
    }
}

fn decode_failure<T>(response: &Response<T>, bytes: Option<Bytes>, source: DecodeError) -> Error {
    let mut partial = response.without_body();
    if let Some(bytes) = bytes {
        partial.body = ResponseBody::Raw(bytes);
    }
    Error::Decode {
        response: Box::new(partial),
        source,
    }
}
