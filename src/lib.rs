//! # customerio - a typed async client for Customer.io
//!
//! Two clients cover the two Customer.io APIs:
//!
//! - [`TrackClient`] talks to the track API (Basic auth with a site ID and API key):
//!   identify and delete customers, record events, register devices, merge profiles and
//!   manage manual segment membership.
//! - [`ApiClient`] talks to the app API (Bearer auth with an app key): send
//!   transactional email, push and SMS, and manage segments.
//!
//! Both share one request pipeline built on `reqwest`: JSON bodies, the right
//! `Authorization` header, per-segment percent-encoding of path identifiers, a single
//! attempt per call, and typed errors that keep the raw response for diagnostics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use customerio::{ApiClient, Identifier, Region, SendEmailRequest, TrackClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), customerio::Error> {
//!     let track = TrackClient::builder("site-id", "api-key")
//!         .region(Region::Eu)
//!         .build()?;
//!
//!     track.identify("cust1", &json!({"email": "cust1@example.com"})).await?;
//!     track.track("cust1", "purchased", &json!({"value": 10})).await?;
//!
//!     let app = ApiClient::builder("app-key").region(Region::Eu).build()?;
//!     let request = SendEmailRequest {
//!         transactional_message_id: Some("welcome".to_string()),
//!         ..SendEmailRequest::new(Identifier::id("cust1"))
//!     };
//!     let queued = app.send_email(&request).await?;
//!     println!("{} queued at {}", queued.delivery_id, queued.queued_at);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Options apply in the order given and the last one touching a field wins. In
//! particular [`ClientOption::Region`] and [`ClientOption::BaseUrl`] both set the
//! endpoint, so a base URL given after a region overrides it, and vice versa.
//!
//! ```no_run
//! use customerio::{ClientOption, Region, TrackClient};
//!
//! # fn example() -> Result<(), customerio::Error> {
//! let client = TrackClient::with_options(
//!     "site-id",
//!     "api-key",
//!     [
//!         ClientOption::Region(Region::Eu),
//!         ClientOption::BaseUrl("http://localhost:8080".to_string()),
//!     ],
//! )?;
//! assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancellation
//!
//! Bind a [`CancellationToken`](tokio_util::sync::CancellationToken) to a client handle
//! with `cancellable`; once the token fires, in-flight calls on that handle return
//! [`Error::Cancelled`] without waiting for the server.

mod app;
mod auth;
mod client;
mod codec;
mod device;
mod error;
mod identifier;
pub mod metadata;
mod region;
mod response;
mod track;

pub use app::{
    ApiClient, CreateSegmentRequest, CustomerIdentifier, Segment, SegmentCustomerCount,
    SegmentDependencies, SegmentEnvelope, SegmentList, SegmentMembership, SegmentState,
    SegmentType, SegmentUsage, SendEmailRequest, SendPushRequest, SendSmsRequest,
    TransactionalResponse,
};
pub use client::{Api, ApiKind, Client, ClientBuilder, ClientOption, DEFAULT_USER_AGENT};
pub use device::Device;
pub use error::{Error, Result};
pub use identifier::{Identifier, IdentifierType};
pub use region::Region;
pub use response::Response;
pub use track::TrackClient;
