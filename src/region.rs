//! Data-center regions and their fixed endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The Customer.io data center an account lives in.
///
/// Each region has one base URL for the track API and one for the app API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    /// Base URL of the track API in this region.
    pub fn track_url(self) -> &'static str {
        match self {
            Region::Us => "https://track.customer.io",
            Region::Eu => "https://track-eu.customer.io",
        }
    }

    /// Base URL of the app (transactional) API in this region.
    pub fn api_url(self) -> &'static str {
        match self {
            Region::Us => "https://api.customer.io",
            Region::Eu => "https://api-eu.customer.io",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => f.write_str("us"),
            Region::Eu => f.write_str("eu"),
        }
    }
}

impl FromStr for Region {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(crate::Error::ConfigurationError(format!(
                "Unknown region: {other}"
            ))),
        }
    }
}
