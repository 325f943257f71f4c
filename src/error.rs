//! Error types for Customer.io API calls.
//!
//! Every failure is returned to the caller. Errors raised before any network I/O
//! (missing parameters, serialization, configuration) are distinct from transport
//! failures, which are in turn distinct from non-success HTTP responses.

use http::StatusCode;
use url::Url;

/// The error type for every client operation.
///
/// # Examples
///
/// ```no_run
/// use customerio::{Error, TrackClient};
///
/// # async fn example() -> Result<(), Error> {
/// let client = TrackClient::new("site-id", "api-key")?;
///
/// match client.identify("cust1", &serde_json::json!({"plan": "pro"})).await {
///     Ok(()) => println!("identified"),
///     Err(Error::MissingParameter { param }) => eprintln!("missing {param}"),
///     Err(Error::Api { status, raw_response, .. }) => {
///         eprintln!("rejected with {status}: {raw_response}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required argument was empty, zero, or otherwise invalid.
    ///
    /// Raised before any request is built, so nothing was sent.
    #[error("{param}: missing")]
    MissingParameter {
        /// The name of the offending argument.
        param: &'static str,
    },

    /// An identifier cannot stand as its own URL path segment.
    ///
    /// `"."` and `".."` would be collapsed by URL normalization and address a
    /// different resource. Raised before anything is sent.
    #[error("{param}: {value:?} is not a valid path segment")]
    InvalidPathSegment {
        /// The name of the offending argument.
        param: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A network-level error occurred (connection refused, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The caller's cancellation token fired before the exchange completed.
    #[error("Request cancelled")]
    Cancelled,

    /// A track or app endpoint answered with an unexpected status.
    ///
    /// The body is kept verbatim for diagnostics.
    #[error("{status}: {url} {raw_response}")]
    Api {
        /// The HTTP status code
        status: StatusCode,
        /// The absolute URL that was requested
        url: Url,
        /// The raw response body
        raw_response: String,
    },

    /// A transactional send endpoint answered with an unexpected status.
    ///
    /// `message` is taken from `{"meta":{"error":"..."}}` when the body has that
    /// shape, otherwise it is the raw body text.
    #[error("{message}")]
    Transactional {
        /// The HTTP status code
        status: StatusCode,
        /// The extracted error message
        message: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid client configuration, such as a header value with control characters.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The configured base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An attachment with this name is already present on the request.
    #[error("attachment with name {0:?} already exists")]
    AttachmentExists(String),

    /// Reading attachment content failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Converts a transport error, separating timeouts from other failures.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err)
        }
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use customerio::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::Transactional {
    ///     status: StatusCode::BAD_REQUEST,
    ///     message: "missing required field".to_string(),
    /// };
    /// assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    ///
    /// let err = Error::MissingParameter { param: "customer_id" };
    /// assert_eq!(err.status(), None);
    /// ```
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Transactional { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Api { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns `true` if the call was abandoned because its token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A specialized `Result` type for Customer.io API calls.
pub type Result<T> = std::result::Result<T, Error>;
