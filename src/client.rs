//! HTTP client owning shared defaults and the hook chain.
//!
//! The [`Client`] type is the entry point: it hands out [`Request`] builders
//! and mediates every send through [`Client::dispatch`]. Use
//! [`ClientBuilder`] to configure one.
//!
//! # Sharing
//!
//! A client is cheap to clone and every clone shares the same default
//! headers and hook chain. Both are guarded by read-write locks, so
//! registering a hook while other tasks are dispatching is memory-safe. A
//! dispatch takes a snapshot of the chain when it starts; a hook registered
//! mid-flight applies from the next dispatch on. Registering hooks before the
//! client is shared keeps ordering easy to reason about.

use crate::{
    hooks::{Hooks, Outcome},
    transport::Transport,
    Context, Error, Request, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("quester/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that applies default headers and a hook chain to every
/// request.
///
/// # Examples
///
/// ```no_run
/// use quester::{Client, LoggingHooks};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), quester::Error> {
/// let client = Client::new("https://api.example.com")?;
/// client.use_hook(LoggingHooks);
///
/// let response = client
///     .request()
///     .path("/users")
///     .query("id", "7")
///     .execute::<User>()
///     .await?;
///
/// if let Some(user) = response.data() {
///     println!("{} is user {}", user.name, user.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_url: String,
    default_headers: RwLock<HeaderMap>,
    timeout: Duration,
    hooks: RwLock<Vec<Arc<dyn Hooks>>>,
}

impl Client {
    /// Creates a client for `base_url` with the default transport, a
    /// `quester/<version>` User-Agent and a 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a valid absolute URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::builder().base_url(base_url)?.build()
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Starts a new request against this client.
    pub fn request(&self) -> Request<'_> {
        Request::new(self)
    }

    /// Appends a hook to the chain.
    ///
    /// Hooks run in the order they were added, in both the pre-request and
    /// the post-response phase. There is no removal.
    pub fn use_hook(&self, hook: impl Hooks + 'static) {
        self.inner
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Adds a value to the default headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn set_default_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.inner
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(name, value);
        Ok(())
    }

    /// The base URL every request path is appended to.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The timeout the default transport was configured with.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// A copy of the current default headers.
    pub fn default_headers(&self) -> HeaderMap {
        self.inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sends an assembled request through the default headers, the hook
    /// chain and the transport.
    ///
    /// 1. Default headers are added for every key the request does not
    ///    already carry. Only the first default value of a key is used, and
    ///    nothing already on the request is replaced, so this is not a plain
    ///    "defaults then overrides" merge.
    /// 2. Pre-request hooks run in order. The first error is returned as
    ///    [`Error::Hook`] and nothing else runs: no later hook, no transport
    ///    call, no post-response hook.
    /// 3. The transport is called exactly once, bounded by `ctx`.
    /// 4. Post-response hooks run in order with the outcome, success or not.
    ///    Their errors are logged and dropped.
    /// 5. The transport's result is returned unchanged.
    pub async fn dispatch(
        &self,
        mut request: reqwest::Request,
        ctx: &Context,
    ) -> Result<reqwest::Response> {
        self.apply_default_headers(request.headers_mut());

        let hooks = self
            .inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for hook in &hooks {
            if let Err(e) = hook.pre_request(&mut request) {
                tracing::warn!(
                    error = %e,
                    method = %request.method(),
                    url = %request.url(),
                    "Pre-request hook rejected request"
                );
                return Err(Error::Hook(e));
            }
        }

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Executing HTTP request"
        );

        let start_time = Instant::now();
        let result = match ctx.run(self.inner.transport.execute(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::Network(e)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(response) => tracing::debug!(
                status = response.status().as_u16(),
                latency_ms = start_time.elapsed().as_millis() as u64,
                "Received HTTP response"
            ),
            Err(e) => tracing::debug!(
                error = %e,
                latency_ms = start_time.elapsed().as_millis() as u64,
                "HTTP request failed"
            ),
        }

        let outcome = match &result {
            Ok(response) => Outcome::Received(response),
            Err(e) => Outcome::Failed(e),
        };
        for hook in &hooks {
            if let Err(e) = hook.post_response(&outcome) {
                tracing::debug!(error = %e, "Ignoring post-response hook error");
            }
        }

        result
    }

    fn apply_default_headers(&self, headers: &mut HeaderMap) {
        let defaults = self
            .inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for name in defaults.keys() {
            if headers.contains_key(name) {
                continue;
            }
            if let Some(value) = defaults.get(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use quester::{ClientBuilder, LoggingHooks};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), quester::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(10))
///     .user_agent("my-app/1.0")?
///     .default_header("Accept", "application/json")?
///     .hook(LoggingHooks)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    default_headers: HeaderMap,
    timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
    hooks: Vec<Arc<dyn Hooks>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            http::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_USER_AGENT),
        );
        Self {
            base_url: None,
            default_headers,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            hooks: Vec::new(),
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// The string is kept verbatim and request paths are appended to it
    /// without separator normalization.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        Url::parse(url)?;
        self.base_url = Some(url.to_string());
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// Calling this twice with the same name keeps both values, but only the
    /// first is ever applied to a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.append(name, value);
        Ok(self)
    }

    /// Replaces the default `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn user_agent(mut self, user_agent: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(http::header::USER_AGENT.as_str(), user_agent.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a custom transport instead of a `reqwest::Client`.
    ///
    /// The builder's timeout is not applied to a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Appends a hook to the chain the client starts with.
    pub fn hook(mut self, hook: impl Hooks + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the default
    /// transport cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let http_client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| {
                        Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
                    })?;
                Arc::new(http_client)
            }
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: RwLock::new(self.default_headers),
                timeout: self.timeout,
                hooks: RwLock::new(self.hooks),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::InvalidRequest(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::InvalidRequest(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}
