//! Credentials and the `Authorization` header they produce.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::HeaderValue;
use std::fmt;

/// Credentials for one of the two sub-APIs.
///
/// A client holds exactly one of these for its whole life.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Credentials {
    /// Site ID and API key pair used by the track API.
    Basic { site_id: String, api_key: String },
    /// App API key used by the transactional and segments API.
    Bearer { key: String },
}

impl Credentials {
    pub(crate) fn basic(site_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Credentials::Basic {
            site_id: site_id.into(),
            api_key: api_key.into(),
        }
    }

    pub(crate) fn bearer(key: impl Into<String>) -> Self {
        Credentials::Bearer { key: key.into() }
    }

    /// Returns the full `Authorization` header value, e.g. `Basic c2l0ZTprZXk=`.
    pub(crate) fn authorization(&self) -> String {
        match self {
            Credentials::Basic { site_id, api_key } => {
                format!("Basic {}", STANDARD.encode(format!("{site_id}:{api_key}")))
            }
            Credentials::Bearer { key } => format!("Bearer {key}"),
        }
    }

    /// Builds the header value once, marked sensitive so it never shows up in debug output.
    pub(crate) fn header_value(&self) -> crate::Result<HeaderValue> {
        let mut value = HeaderValue::try_from(self.authorization()).map_err(|e| {
            crate::Error::ConfigurationError(format!("Invalid credentials: {}", e))
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { site_id, .. } => f
                .debug_struct("Basic")
                .field("site_id", site_id)
                .field("api_key", &"<redacted>")
                .finish(),
            Credentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}
