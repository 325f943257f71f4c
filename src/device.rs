//! Mobile devices registered against a customer.

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};

/// The attribute key lifted out of the attribute map into [`Device::last_used`].
const LAST_USED: &str = "last_used";

/// A device as sent to the track API.
///
/// Absent `last_used` and `attributes` are omitted from the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

impl Device {
    /// Builds a device from a raw attribute map.
    ///
    /// `last_used` is taken out of `data` and stored as a string; every other key
    /// becomes an attribute. No remaining keys means no attributes at all.
    ///
    /// ```
    /// use customerio::Device;
    /// use serde_json::json;
    ///
    /// let data = json!({"last_used": 1500111111, "app_version": "2.1"});
    /// let device = Device::new("token-1", "ios", data.as_object().cloned().unwrap()).unwrap();
    ///
    /// assert_eq!(device.last_used.as_deref(), Some("1500111111"));
    /// assert_eq!(device.attributes.unwrap()["app_version"], "2.1");
    /// ```
    ///
    /// # Errors
    ///
    /// `MissingParameter` for an empty `device_id` or `platform`.
    pub fn new(
        device_id: impl Into<String>,
        platform: impl Into<String>,
        mut data: Map<String, Value>,
    ) -> crate::Result<Self> {
        let id = device_id.into();
        let platform = platform.into();
        if id.is_empty() {
            return Err(crate::Error::MissingParameter { param: "device_id" });
        }
        if platform.is_empty() {
            return Err(crate::Error::MissingParameter { param: "platform" });
        }

        let last_used = data.remove(LAST_USED).map(display_value);
        let attributes = if data.is_empty() { None } else { Some(data) };

        Ok(Self {
            id,
            platform,
            last_used,
            attributes,
        })
    }
}

/// Strings as-is, everything else in its JSON text form.
fn display_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct TokenDevice<'a> {
    token: &'a str,
    platform: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a Map<String, Value>>,
}

/// Serializes a device with its id under `token`, the shape transactional push expects.
pub(crate) fn serialize_as_token<S: Serializer>(
    device: &Option<Device>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    device
        .as_ref()
        .map(|d| TokenDevice {
            token: &d.id,
            platform: &d.platform,
            last_used: d.last_used.as_deref(),
            attributes: d.attributes.as_ref(),
        })
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_last_used_is_split_out() {
        let device = Device::new(
            "dev",
            "android",
            map(json!({"last_used": 1700000000, "model": "pixel"})),
        )
        .unwrap();

        assert_eq!(device.last_used.as_deref(), Some("1700000000"));
        assert_eq!(device.attributes, Some(map(json!({"model": "pixel"}))));
    }

    #[test]
    fn test_last_used_string_is_not_quoted() {
        let device = Device::new("dev", "ios", map(json!({"last_used": "yesterday"}))).unwrap();
        assert_eq!(device.last_used.as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_only_last_used_leaves_attributes_absent() {
        let device = Device::new("dev", "ios", map(json!({"last_used": true}))).unwrap();
        assert_eq!(device.last_used.as_deref(), Some("true"));
        assert_eq!(device.attributes, None);

        let body = serde_json::to_value(&device).unwrap();
        assert_eq!(body, json!({"id": "dev", "platform": "ios", "last_used": "true"}));
    }

    #[test]
    fn test_empty_data_serializes_minimal_payload() {
        let device = Device::new("dev", "ios", Map::new()).unwrap();
        let body = serde_json::to_value(&device).unwrap();
        assert_eq!(body, json!({"id": "dev", "platform": "ios"}));
    }

    #[test]
    fn test_missing_fields() {
        let err = Device::new("", "ios", Map::new()).unwrap_err();
        assert!(matches!(err, crate::Error::MissingParameter { param: "device_id" }));

        let err = Device::new("dev", "", Map::new()).unwrap_err();
        assert!(matches!(err, crate::Error::MissingParameter { param: "platform" }));
    }

    #[test]
    fn test_serialize_as_token() {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_as_token")]
            device: Option<Device>,
        }

        let device = Device::new("tok", "ios", map(json!({"a": 1}))).unwrap();
        let body = serde_json::to_value(Wrapper {
            device: Some(device),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"device": {"token": "tok", "platform": "ios", "attributes": {"a": 1}}})
        );
    }
}
