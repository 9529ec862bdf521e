//! Wire and storage types shared by the bridge services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted record for one model key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBody {
    /// Catalog document content.
    #[serde(with = "base64_bytes", default)]
    pub body: Vec<u8>,
    /// Identifier returned by the catalog on import; empty until imported.
    #[serde(default)]
    pub location_id: String,
    /// Target reference returned by the catalog on import.
    #[serde(default)]
    pub location_target: String,
    /// Cache hint: the last validity probe against the catalog succeeded.
    /// Never authoritative and never persisted by the storage backends.
    #[serde(default)]
    pub location_id_valid: bool,
}

impl StorageBody {
    /// Whether this record has been imported into the catalog at least once.
    pub fn is_imported(&self) -> bool {
        !self.location_id.is_empty()
    }
}

/// Request body of the upsert endpoints: `{"body": "<base64>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBody {
    #[serde(with = "base64_bytes", default)]
    pub body: Vec<u8>,
}

/// Response of the storage service's list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListKeysResponse {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Response of the location service's discovery endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub uris: Vec<String>,
}

/// Identifier and target handed back by the catalog after an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedLocation {
    pub id: String,
    pub target: String,
}

impl ImportedLocation {
    /// Extract the location from a catalog import response.
    ///
    /// The catalog answers with `{"location": {"id": .., "target": ..}, "entities": [..]}`;
    /// both fields must be non-empty strings.
    pub fn from_response(response: &Value) -> Option<Self> {
        let location = response.get("location")?;
        let id = location.get("id")?.as_str()?;
        let target = location.get("target")?.as_str()?;
        if id.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            target: target.to_string(),
        })
    }
}

/// Serde helpers encoding byte payloads as standard base64 strings.
///
/// A JSON `null` decodes to an empty payload.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
