//! Successful response wrapper.
//!
//! [`Response`] pairs the decoded payload with the details of the exchange, which is
//! what [`Client::call`](crate::Client::call) hands back for endpoints without a
//! dedicated wrapper.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A decoded successful response plus exchange details.
///
/// # Examples
///
/// ```no_run
/// use customerio::{metadata::RequestMetadata, ApiClient};
/// use http::Method;
///
/// # async fn example() -> Result<(), customerio::Error> {
/// let client = ApiClient::new("app-key")?;
///
/// let metadata = RequestMetadata::new(Method::GET, ["v1", "segments"]);
/// let response = client
///     .inner()
///     .call::<(), serde_json::Value>(metadata, None)
///     .await?;
///
/// println!("{} in {:?}", response.status, response.latency);
/// println!("raw: {}", response.raw_body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The deserialized response data.
    pub data: T,

    /// The raw response body.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from dispatch until the full body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data, keeping the exchange details.
    ///
    /// ```
    /// # use customerio::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Consumes the response, returning only the payload.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
