//! The request pipeline shared by both sub-APIs.
//!
//! A [`Client`] owns the immutable configuration (base URL, credentials, user agent,
//! HTTP executor) and turns a [`RequestMetadata`] plus an optional body into a typed
//! result: it serializes and authenticates the request, dispatches it while honoring
//! cancellation, reads the whole body, and interprets the status.
//!
//! Use [`TrackClient::builder`](crate::TrackClient::builder) or
//! [`ApiClient::builder`](crate::ApiClient::builder) to configure one.

use crate::{
    auth::Credentials,
    metadata::{ErrorFlavor, RequestMetadata},
    region::Region,
    Error, Response, Result,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("customerio-rust/", env!("CARGO_PKG_VERSION"));

/// Which sub-API a client talks to. Decides the region's base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Track,
    App,
}

impl ApiKind {
    fn base_url(self, region: Region) -> &'static str {
        match self {
            ApiKind::Track => region.track_url(),
            ApiKind::App => region.api_url(),
        }
    }
}

/// The authenticated request pipeline.
///
/// Cloning is cheap; clones share the same configuration and connection pool.
/// The configuration cannot change once built.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    cancel: Option<CancellationToken>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    authorization: HeaderValue,
    user_agent: HeaderValue,
    timeout: Option<Duration>,
}

/// A response whose status matched the expectation, body not yet decoded.
struct Exchange {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    latency: Duration,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    meta: ErrorMeta,
}

#[derive(Deserialize)]
struct ErrorMeta {
    error: String,
}

impl Client {
    /// The base URL every request path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns a handle whose calls end with [`Error::Cancelled`] once `token` fires.
    ///
    /// The handle shares this client's configuration.
    pub fn cancellable(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(token),
        }
    }

    /// Makes a request and decodes the JSON body into `Res`.
    ///
    /// An empty or malformed body on a successful status is
    /// [`Error::DeserializationFailed`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use customerio::{metadata::RequestMetadata, ApiClient};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), customerio::Error> {
    /// let client = ApiClient::new("app-key")?;
    /// let metadata = RequestMetadata::new(Method::GET, ["v1", "segments", "4", "customer_count"]);
    ///
    /// let response = client
    ///     .inner()
    ///     .call::<(), serde_json::Value>(metadata, None)
    ///     .await?;
    /// println!("{}", response.data["count"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<Req, Res>(
        &self,
        metadata: RequestMetadata,
        body: Option<&Req>,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let exchange = self.send(&metadata, body).await?;

        match serde_json::from_str::<Res>(&exchange.body) {
            Ok(data) => Ok(Response::new(
                data,
                exchange.body,
                exchange.status,
                exchange.headers,
                exchange.latency,
            )),
            Err(e) => Err(Error::DeserializationFailed {
                raw_response: exchange.body,
                serde_error: e.to_string(),
                status: exchange.status,
            }),
        }
    }

    /// Makes a request whose successful response carries no payload.
    ///
    /// The body is still read in full and kept in [`Response::raw_body`].
    pub async fn call_empty<Req>(
        &self,
        metadata: RequestMetadata,
        body: Option<&Req>,
    ) -> Result<Response<()>>
    where
        Req: Serialize + ?Sized,
    {
        let exchange = self.send(&metadata, body).await?;
        Ok(Response::new(
            (),
            exchange.body,
            exchange.status,
            exchange.headers,
            exchange.latency,
        ))
    }

    /// Builds, dispatches and status-checks one request.
    async fn send<Req>(&self, metadata: &RequestMetadata, body: Option<&Req>) -> Result<Exchange>
    where
        Req: Serialize + ?Sized,
    {
        // Serialize first so nothing is dispatched when the body is unrepresentable.
        let payload = body
            .map(|body| serde_json::to_vec(body))
            .transpose()
            .map_err(|e| Error::SerializationFailed(e.to_string()))?;

        let url = self.url_for(metadata)?;

        tracing::debug!(
            method = %metadata.method,
            path = %metadata.display_path(),
            url = %url,
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(metadata.method.clone(), url.clone())
            .header(AUTHORIZATION, self.inner.authorization.clone())
            .header(USER_AGENT, self.inner.user_agent.clone());

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(payload) = payload {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        let start_time = Instant::now();
        let (status, headers, body) = self.execute(request).await?;
        let latency = start_time.elapsed();

        tracing::debug!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if status != metadata.expected_status {
            return Err(match metadata.error_flavor {
                ErrorFlavor::Api => Error::Api {
                    status,
                    url,
                    raw_response: body,
                },
                ErrorFlavor::Transactional => Error::Transactional {
                    status,
                    message: transactional_message(body),
                },
            });
        }

        Ok(Exchange {
            status,
            headers,
            body,
            latency,
        })
    }

    /// Sends the request and reads the full body, racing the cancellation token.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, HeaderMap, String)> {
        let exchange = async {
            let response = request.send().await.map_err(Error::transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(Error::transport)?;
            Ok::<_, Error>((status, headers, body))
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        }
    }

    /// Appends each segment, percent-encoded on its own, plus the query string.
    fn url_for(&self, metadata: &RequestMetadata) -> Result<Url> {
        if let Some(dots) = metadata.segments.iter().find(|s| is_dot_segment(s)) {
            return Err(Error::InvalidPathSegment {
                param: "path",
                value: dots.clone(),
            });
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigurationError("Base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(&metadata.segments);

        if !metadata.query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(metadata.query_params.iter());
        }

        Ok(url)
    }
}

/// `PathSegmentsMut` drops these instead of encoding them.
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Pulls `meta.error` out of a transactional failure body, or falls back to the body.
fn transactional_message(body: String) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.meta.error,
        Err(_) => body,
    }
}

/// One configuration change, applied in the order given.
///
/// `Region` and `BaseUrl` both set the endpoint, so whichever comes last wins.
#[derive(Debug, Clone)]
pub enum ClientOption {
    /// Use the region's fixed base URL for this sub-API.
    Region(Region),
    /// Use an explicit base URL.
    BaseUrl(String),
    /// Dispatch through this HTTP client instead of the default pool.
    HttpClient(reqwest::Client),
    /// Send this `User-Agent`.
    UserAgent(String),
    /// Fail requests that take longer than this with [`Error::Timeout`].
    Timeout(Duration),
}

#[derive(Debug, Clone)]
enum Endpoint {
    Region(Region),
    Url(String),
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for crate::TrackClient {}
    impl Sealed for crate::ApiClient {}
}

/// A sub-API client that can be produced by [`ClientBuilder`].
pub trait Api: sealed::Sealed + Sized {
    #[doc(hidden)]
    const KIND: ApiKind;

    #[doc(hidden)]
    fn from_client(client: Client) -> Self;
}

/// Builder for a [`TrackClient`](crate::TrackClient) or [`ApiClient`](crate::ApiClient).
///
/// Each setter applies one [`ClientOption`]; a later setter for the same field
/// replaces the earlier value.
///
/// # Examples
///
/// ```no_run
/// use customerio::{Region, TrackClient};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), customerio::Error> {
/// let client = TrackClient::builder("site-id", "api-key")
///     .region(Region::Eu)
///     .timeout(Duration::from_secs(10))
///     .user_agent("my-app/1.0")
///     .build()?;
/// assert_eq!(client.base_url().as_str(), "https://track-eu.customer.io/");
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<C> {
    credentials: Credentials,
    endpoint: Endpoint,
    http_client: Option<reqwest::Client>,
    user_agent: String,
    timeout: Option<Duration>,
    api: PhantomData<fn() -> C>,
}

impl<C: Api> ClientBuilder<C> {
    pub(crate) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: Endpoint::Region(Region::Us),
            http_client: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            api: PhantomData,
        }
    }

    /// Applies one option.
    pub fn option(mut self, option: ClientOption) -> Self {
        match option {
            ClientOption::Region(region) => self.endpoint = Endpoint::Region(region),
            ClientOption::BaseUrl(url) => self.endpoint = Endpoint::Url(url),
            ClientOption::HttpClient(client) => self.http_client = Some(client),
            ClientOption::UserAgent(agent) => self.user_agent = agent,
            ClientOption::Timeout(timeout) => self.timeout = Some(timeout),
        }
        self
    }

    /// Applies options in iteration order.
    pub fn options(self, options: impl IntoIterator<Item = ClientOption>) -> Self {
        options.into_iter().fold(self, Self::option)
    }

    /// Selects the data-center region.
    pub fn region(self, region: Region) -> Self {
        self.option(ClientOption::Region(region))
    }

    /// Overrides the base URL, e.g. to point at a proxy or a test server.
    pub fn base_url(self, url: impl Into<String>) -> Self {
        self.option(ClientOption::BaseUrl(url.into()))
    }

    /// Injects the HTTP client. The caller keeps ownership of its pool settings.
    pub fn http_client(self, client: reqwest::Client) -> Self {
        self.option(ClientOption::HttpClient(client))
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.option(ClientOption::UserAgent(agent.into()))
    }

    /// Sets a per-request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(ClientOption::Timeout(timeout))
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse, or if the credentials or user
    /// agent cannot be sent as header values.
    pub fn build(self) -> Result<C> {
        let base_url = match &self.endpoint {
            Endpoint::Region(region) => Url::parse(C::KIND.base_url(*region))?,
            Endpoint::Url(url) => Url::parse(url)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot have a path: {}",
                base_url
            )));
        }

        let authorization = self.credentials.header_value()?;
        let user_agent = HeaderValue::try_from(self.user_agent)
            .map_err(|e| Error::ConfigurationError(format!("Invalid user agent: {}", e)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .pool_max_idle_per_host(100)
                .build()
                .map_err(|e| {
                    Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
                })?,
        };

        Ok(C::from_client(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                authorization,
                user_agent,
                timeout: self.timeout,
            }),
            cancel: None,
        }))
    }
}
