//! Per-call request description.

use http::{Method, StatusCode};

/// How a non-success response is turned into an [`Error`](crate::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFlavor {
    /// `Error::Api` carrying status, URL and raw body.
    #[default]
    Api,
    /// `Error::Transactional` with the message extracted from `meta.error`.
    Transactional,
}

/// Metadata for an individual request.
///
/// The path is kept as a list of unescaped segments. Each segment is percent-encoded
/// on its own when the URL is assembled, so a value containing `/` stays one segment.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method.
    pub method: Method,

    /// Path segments relative to the base URL.
    pub segments: Vec<String>,

    /// Query parameters, in insertion order.
    pub query_params: Vec<(String, String)>,

    /// The only status treated as success.
    pub expected_status: StatusCode,

    /// How failures are reported.
    pub error_flavor: ErrorFlavor,
}

impl RequestMetadata {
    /// Creates metadata for `method` on the given path segments, expecting `200 OK`.
    ///
    /// ```
    /// use customerio::metadata::RequestMetadata;
    /// use http::Method;
    ///
    /// let metadata = RequestMetadata::new(Method::PUT, ["api", "v1", "customers", "a/b"]);
    /// assert_eq!(metadata.segments.last().map(String::as_str), Some("a/b"));
    /// ```
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query_params: Vec::new(),
            expected_status: StatusCode::OK,
            error_flavor: ErrorFlavor::Api,
        }
    }

    /// Appends one path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Sets the status code that counts as success.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    /// Reports failures as [`Error::Transactional`](crate::Error::Transactional).
    pub fn transactional(mut self) -> Self {
        self.error_flavor = ErrorFlavor::Transactional;
        self
    }

    /// Human-readable path, used for logging only.
    pub(crate) fn display_path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}
