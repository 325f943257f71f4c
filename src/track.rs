//! The track API: customer profiles, events, devices and manual segment membership.
//!
//! Authenticated with a site ID and API key pair (HTTP Basic).

use crate::{
    auth::Credentials,
    client::{is_dot_segment, Api, ApiKind, Client, ClientBuilder, ClientOption},
    device::Device,
    identifier::Identifier,
    metadata::RequestMetadata,
    Error, Result,
};
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for the Customer.io track API.
///
/// # Examples
///
/// ```no_run
/// use customerio::{Region, TrackClient};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), customerio::Error> {
/// let client = TrackClient::builder("site-id", "api-key")
///     .region(Region::Eu)
///     .build()?;
///
/// client
///     .identify("cust1", &json!({"email": "cust1@example.com"}))
///     .await?;
/// client
///     .track("cust1", "purchased", &json!({"value": 10}))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TrackClient {
    client: Client,
}

impl Api for TrackClient {
    const KIND: ApiKind = ApiKind::Track;

    fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct EventPayload<'a, D: ?Sized> {
    name: &'a str,
    data: &'a D,
    #[serde(skip_serializing_if = "Option::is_none")]
    anonymous_id: Option<&'a str>,
}

#[derive(Serialize)]
struct DevicePayload<'a> {
    device: &'a Device,
}

#[derive(Serialize)]
struct MergePayload<'a> {
    primary: &'a Identifier,
    secondary: &'a Identifier,
}

#[derive(Serialize)]
struct IdsPayload {
    ids: Vec<String>,
}

fn require(value: &str, param: &'static str) -> Result<()> {
    if value.is_empty() {
        Err(Error::MissingParameter { param })
    } else {
        Ok(())
    }
}

/// A required value that lands in the URL path as one segment.
fn require_segment(value: &str, param: &'static str) -> Result<()> {
    require(value, param)?;
    if is_dot_segment(value) {
        return Err(Error::InvalidPathSegment {
            param,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn customer(customer_id: &str) -> RequestMetadata {
    RequestMetadata::new(Method::PUT, ["api", "v1", "customers", customer_id])
}

impl TrackClient {
    /// Creates a client for the US region with default settings.
    pub fn new(site_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::builder(site_id, api_key).build()
    }

    /// Starts configuring a client.
    pub fn builder(site_id: impl Into<String>, api_key: impl Into<String>) -> ClientBuilder<Self> {
        ClientBuilder::new(Credentials::basic(site_id, api_key))
    }

    /// Creates a client from a list of options, applied in order.
    pub fn with_options(
        site_id: impl Into<String>,
        api_key: impl Into<String>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self> {
        Self::builder(site_id, api_key).options(options).build()
    }

    /// The underlying request pipeline, for endpoints without a wrapper here.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Returns a handle whose calls stop with [`Error::Cancelled`] once `token` fires.
    pub fn cancellable(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.cancellable(token),
        }
    }

    /// Creates or updates a customer and sets their attributes.
    pub async fn identify<A>(&self, customer_id: &str, attributes: &A) -> Result<()>
    where
        A: Serialize + ?Sized,
    {
        require_segment(customer_id, "customer_id")?;
        self.client
            .call_empty(customer(customer_id), Some(attributes))
            .await?;
        Ok(())
    }

    /// Records a named event for a customer.
    pub async fn track<D>(&self, customer_id: &str, event_name: &str, data: &D) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        require_segment(customer_id, "customer_id")?;
        require(event_name, "event_name")?;

        let metadata = RequestMetadata::new(
            Method::POST,
            ["api", "v1", "customers", customer_id, "events"],
        );
        let payload = EventPayload {
            name: event_name,
            data,
            anonymous_id: None,
        };
        self.client.call_empty(metadata, Some(&payload)).await?;
        Ok(())
    }

    /// Records an event not tied to a known customer.
    ///
    /// An empty `anonymous_id` is left out of the payload.
    pub async fn track_anonymous<D>(
        &self,
        anonymous_id: &str,
        event_name: &str,
        data: &D,
    ) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        require(event_name, "event_name")?;

        let metadata = RequestMetadata::new(Method::POST, ["api", "v1", "events"]);
        let payload = EventPayload {
            name: event_name,
            data,
            anonymous_id: (!anonymous_id.is_empty()).then_some(anonymous_id),
        };
        self.client.call_empty(metadata, Some(&payload)).await?;
        Ok(())
    }

    /// Deletes a customer profile.
    pub async fn delete(&self, customer_id: &str) -> Result<()> {
        require_segment(customer_id, "customer_id")?;

        let metadata = RequestMetadata::new(Method::DELETE, ["api", "v1", "customers", customer_id]);
        self.client.call_empty::<()>(metadata, None).await?;
        Ok(())
    }

    /// Adds or updates a device for a customer.
    ///
    /// A `last_used` key in `data` is sent as the device's `last_used` field; the
    /// other keys become device attributes. See [`Device::new`].
    pub async fn add_device(
        &self,
        customer_id: &str,
        device_id: &str,
        platform: &str,
        data: Map<String, Value>,
    ) -> Result<()> {
        require_segment(customer_id, "customer_id")?;
        let device = Device::new(device_id, platform, data)?;

        let metadata = customer(customer_id).segment("devices");
        self.client
            .call_empty(metadata, Some(&DevicePayload { device: &device }))
            .await?;
        Ok(())
    }

    /// Removes a device from a customer.
    pub async fn delete_device(&self, customer_id: &str, device_id: &str) -> Result<()> {
        require_segment(customer_id, "customer_id")?;
        require_segment(device_id, "device_id")?;

        let metadata = RequestMetadata::new(
            Method::DELETE,
            ["api", "v1", "customers", customer_id, "devices", device_id],
        );
        self.client.call_empty::<()>(metadata, None).await?;
        Ok(())
    }

    /// Merges the secondary profile into the primary one.
    ///
    /// Each identifier must have a non-blank value; the error names the side that failed.
    pub async fn merge_customers(&self, primary: &Identifier, secondary: &Identifier) -> Result<()> {
        primary.require("primary")?;
        secondary.require("secondary")?;

        let metadata = RequestMetadata::new(Method::POST, ["api", "v1", "merge_customers"]);
        self.client
            .call_empty(metadata, Some(&MergePayload { primary, secondary }))
            .await?;
        Ok(())
    }

    /// Adds customers to a manual segment.
    pub async fn add_people_to_segment<I, S>(&self, segment_id: u64, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segment_membership(segment_id, ids, "add_customers")
            .await
    }

    /// Removes customers from a manual segment.
    pub async fn remove_people_from_segment<I, S>(&self, segment_id: u64, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segment_membership(segment_id, ids, "remove_customers")
            .await
    }

    async fn segment_membership<I, S>(&self, segment_id: u64, ids: I, action: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if segment_id == 0 {
            return Err(Error::MissingParameter { param: "segment_id" });
        }
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(Error::MissingParameter { param: "ids" });
        }

        let segment = segment_id.to_string();
        let metadata = RequestMetadata::new(
            Method::POST,
            ["api", "v1", "segments", segment.as_str(), action],
        );
        self.client
            .call_empty(metadata, Some(&IdsPayload { ids }))
            .await?;
        Ok(())
    }
}
