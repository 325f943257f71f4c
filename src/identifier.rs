//! Typed references to a customer profile.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The attribute an [`Identifier`] refers to a customer by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    /// The workspace's own customer ID.
    Id,
    Email,
    /// The ID Customer.io assigned to the profile.
    CioId,
}

impl IdentifierType {
    /// The wire name of this kind: `id`, `email` or `cio_id`.
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierType::Id => "id",
            IdentifierType::Email => "email",
            IdentifierType::CioId => "cio_id",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer reference such as `{"email": "a@example.com"}`.
///
/// Serializes as a single-entry object keyed by the kind.
///
/// ```
/// use customerio::Identifier;
///
/// let id = Identifier::email("a@example.com");
/// assert_eq!(
///     serde_json::to_string(&id).unwrap(),
///     r#"{"email":"a@example.com"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub kind: IdentifierType,
    pub value: String,
}

impl Identifier {
    pub fn new(kind: IdentifierType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::Id, value)
    }

    pub fn email(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::Email, value)
    }

    pub fn cio_id(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::CioId, value)
    }

    /// An identifier is usable when its value is not blank.
    pub fn is_valid(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Fails with `MissingParameter { param }` when the value is blank.
    pub(crate) fn require(&self, param: &'static str) -> crate::Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(crate::Error::MissingParameter { param })
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.kind.as_str(), &self.value)?;
        map.end()
    }
}
