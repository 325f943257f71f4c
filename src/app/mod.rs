//! The app API: transactional messages and segment management.
//!
//! Authenticated with an app API key (HTTP Bearer).

mod segments;
mod transactional;

pub use segments::{
    CreateSegmentRequest, CustomerIdentifier, Segment, SegmentCustomerCount,
    SegmentDependencies, SegmentEnvelope, SegmentList, SegmentMembership, SegmentState,
    SegmentType, SegmentUsage,
};
pub use transactional::{SendEmailRequest, SendPushRequest, SendSmsRequest, TransactionalResponse};

use crate::{
    auth::Credentials,
    client::{Api, ApiKind, Client, ClientBuilder, ClientOption},
    identifier::Identifier,
    metadata::RequestMetadata,
    Result,
};
use http::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for the Customer.io app API.
///
/// # Examples
///
/// ```no_run
/// use customerio::{ApiClient, Identifier, SendSmsRequest};
///
/// # async fn example() -> Result<(), customerio::Error> {
/// let client = ApiClient::new("app-key")?;
///
/// let request = SendSmsRequest {
///     transactional_message_id: Some("otp".to_string()),
///     ..SendSmsRequest::new(Identifier::id("customer_1"))
/// };
/// let response = client.send_sms(&request).await?;
/// println!("delivery {}", response.delivery_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl Api for ApiClient {
    const KIND: ApiKind = ApiKind::App;

    fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl ApiClient {
    /// Creates a client for the US region with default settings.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        Self::builder(key).build()
    }

    /// Starts configuring a client.
    pub fn builder(key: impl Into<String>) -> ClientBuilder<Self> {
        ClientBuilder::new(Credentials::bearer(key))
    }

    /// Creates a client from a list of options, applied in order.
    pub fn with_options(
        key: impl Into<String>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self> {
        Self::builder(key).options(options).build()
    }

    /// The underlying request pipeline, for endpoints without a wrapper here.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Returns a handle whose calls stop with [`Error::Cancelled`](crate::Error::Cancelled)
    /// once `token` fires.
    pub fn cancellable(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.cancellable(token),
        }
    }

    /// Sends a transactional email.
    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<TransactionalResponse> {
        self.send("email", &request.identifiers, request).await
    }

    /// Sends a transactional push notification.
    pub async fn send_push(&self, request: &SendPushRequest) -> Result<TransactionalResponse> {
        self.send("push", &request.identifiers, request).await
    }

    /// Sends a transactional SMS.
    pub async fn send_sms(&self, request: &SendSmsRequest) -> Result<TransactionalResponse> {
        self.send("sms", &request.identifiers, request).await
    }

    async fn send<Req>(
        &self,
        kind: &str,
        identifiers: &Identifier,
        request: &Req,
    ) -> Result<TransactionalResponse>
    where
        Req: Serialize,
    {
        identifiers.require("identifiers")?;

        let metadata = RequestMetadata::new(Method::POST, ["v1", "send", kind]).transactional();
        let response = self.client.call(metadata, Some(request)).await?;
        Ok(response.data)
    }
}
