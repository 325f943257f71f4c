//! Segment management on the app API.

use super::ApiClient;
use crate::{codec, metadata::RequestMetadata, Error, Result};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Build state of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentState {
    /// Handling event conditions.
    Events,
    /// Handling profile attribute conditions.
    Build,
    EventsQueued,
    BuildQueued,
    /// Done building.
    Finished,
    /// A state this version does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    /// Membership is computed from conditions and changes over time.
    Dynamic,
    /// Membership is maintained by hand.
    Manual,
    #[serde(other)]
    Unknown,
}

/// A segment as returned by the API.
///
/// When creating one, only `name`, `description` and `tags` need to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: u64,
    /// `id:timestamp`, assigned by the server.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deduplicate_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SegmentState>,
    /// Build progress in percent, while building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<SegmentType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn is_zero(id: &u64) -> bool {
    *id == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSegmentRequest {
    pub segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentEnvelope {
    pub segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentList {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// Campaigns and newsletters that reference a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegmentUsage {
    #[serde(default)]
    pub campaigns: Vec<u64>,
    #[serde(default)]
    pub sent_newsletters: Vec<u64>,
    #[serde(default)]
    pub draft_newsletters: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegmentDependencies {
    #[serde(default)]
    pub used_by: SegmentUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SegmentCustomerCount {
    pub count: u64,
}

/// Identifiers of one segment member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerIdentifier {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "codec::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub cio_id: Option<String>,
}

/// One page of segment members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegmentMembership {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub identifiers: Vec<CustomerIdentifier>,
    /// Cursor for the next page; `None` or empty on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

fn segment(method: Method, segment_id: u64) -> Result<RequestMetadata> {
    if segment_id == 0 {
        return Err(Error::MissingParameter { param: "segment_id" });
    }
    let id = segment_id.to_string();
    Ok(RequestMetadata::new(method, ["v1", "segments", id.as_str()]))
}

impl ApiClient {
    /// Creates a manual segment.
    pub async fn create_segment(&self, request: &CreateSegmentRequest) -> Result<Segment> {
        let metadata = RequestMetadata::new(Method::POST, ["v1", "segments"]);
        let response = self
            .client
            .call::<_, SegmentEnvelope>(metadata, Some(request))
            .await?;
        Ok(response.data.segment)
    }

    /// Lists every segment in the workspace.
    pub async fn list_segments(&self) -> Result<Vec<Segment>> {
        let metadata = RequestMetadata::new(Method::GET, ["v1", "segments"]);
        let response = self.client.call::<(), SegmentList>(metadata, None).await?;
        Ok(response.data.segments)
    }

    pub async fn get_segment(&self, segment_id: u64) -> Result<Segment> {
        let metadata = segment(Method::GET, segment_id)?;
        let response = self
            .client
            .call::<(), SegmentEnvelope>(metadata, None)
            .await?;
        Ok(response.data.segment)
    }

    /// Deletes a segment. The API answers `204 No Content`.
    pub async fn delete_segment(&self, segment_id: u64) -> Result<()> {
        let metadata = segment(Method::DELETE, segment_id)?.expect_status(StatusCode::NO_CONTENT);
        self.client.call_empty::<()>(metadata, None).await?;
        Ok(())
    }

    /// Lists campaigns and newsletters that use a segment.
    pub async fn get_segment_dependencies(&self, segment_id: u64) -> Result<SegmentDependencies> {
        let metadata = segment(Method::GET, segment_id)?.segment("used_by");
        let response = self.client.call::<(), _>(metadata, None).await?;
        Ok(response.data)
    }

    pub async fn get_segment_customer_count(&self, segment_id: u64) -> Result<SegmentCustomerCount> {
        let metadata = segment(Method::GET, segment_id)?.segment("customer_count");
        let response = self.client.call::<(), _>(metadata, None).await?;
        Ok(response.data)
    }

    /// Fetches one page of a segment's members.
    ///
    /// Pass the previous page's [`SegmentMembership::next`] as `start` to continue.
    pub async fn list_customers_in_segment(
        &self,
        segment_id: u64,
        start: Option<&str>,
    ) -> Result<SegmentMembership> {
        let mut metadata = segment(Method::GET, segment_id)?.segment("membership");
        if let Some(start) = start.filter(|s| !s.is_empty()) {
            metadata = metadata.with_query_param("start", start);
        }
        let response = self.client.call::<(), _>(metadata, None).await?;
        Ok(response.data)
    }
}
