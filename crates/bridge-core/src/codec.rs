//! Key and URI derivation for model entries.
//!
//! A model entry is addressed by a `(namespace, name)` pair. The storage key
//! joins the two with `_`; the location URI is
//! `/{namespace}/{name}/{document}` with percent-encoded segments, where the
//! document name depends on the normalizer output format.

use crate::config::NormalizerFormat;
use crate::error::{BridgeError, Result};
use std::fmt;

/// Separator between the segments of a storage key.
pub const KEY_DELIMITER: char = '_';

/// Canonical identifier of one model entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    namespace: String,
    name: String,
}

impl ModelKey {
    /// Build a key from its segments.
    ///
    /// Segments must be non-empty and must not contain the key delimiter, so
    /// that [`ModelKey::parse`] splits every produced key unambiguously.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        for segment in [&namespace, &name] {
            if segment.is_empty() {
                return Err(BridgeError::InvalidKey {
                    key: format!("{}{}{}", namespace, KEY_DELIMITER, name),
                    reason: "segments must not be empty".to_string(),
                });
            }
            if segment.contains(KEY_DELIMITER) {
                return Err(BridgeError::InvalidKey {
                    key: format!("{}{}{}", namespace, KEY_DELIMITER, name),
                    reason: format!("segment '{}' contains '{}'", segment, KEY_DELIMITER),
                });
            }
        }
        Ok(Self { namespace, name })
    }

    /// Parse an inbound key string.
    ///
    /// At least two `_` separated segments are required; anything past the
    /// second segment is ignored, so `ns_model_v1` and `ns_model` address the
    /// same entry.
    pub fn parse(key: &str) -> Result<Self> {
        let mut segments = key.split(KEY_DELIMITER);
        let (Some(namespace), Some(name)) = (segments.next(), segments.next()) else {
            return Err(BridgeError::InvalidKey {
                key: key.to_string(),
                reason: format!("expected at least two '{}' separated segments", KEY_DELIMITER),
            });
        };
        Self::new(namespace, name).map_err(|_| BridgeError::InvalidKey {
            key: key.to_string(),
            reason: "segments must not be empty".to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key used by the storage tier and the sync cache.
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", self.namespace, KEY_DELIMITER, self.name)
    }

    /// Path the catalog document is served under by the location service.
    pub fn uri(&self, format: NormalizerFormat) -> String {
        format!(
            "/{}/{}/{}",
            urlencoding::encode(&self.namespace),
            urlencoding::encode(&self.name),
            format.document_name()
        )
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Derive the storage key and the location URI for a `(namespace, name)` pair.
pub fn build_import_key_and_uri(
    namespace: &str,
    name: &str,
    format: NormalizerFormat,
) -> Result<(String, String)> {
    let key = ModelKey::new(namespace, name)?;
    Ok((key.storage_key(), key.uri(format)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for (ns, name) in [("ns", "model1"), ("kubeflow", "mnist-v1"), ("a.b", "c d")] {
            let key = ModelKey::new(ns, name).unwrap();
            let parsed = ModelKey::parse(&key.storage_key()).unwrap();
            assert_eq!(parsed.namespace(), ns);
            assert_eq!(parsed.name(), name);
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_uri_is_stable_per_format() {
        let key = ModelKey::parse("ns_model1").unwrap();
        assert_eq!(
            key.uri(NormalizerFormat::CatalogInfoYaml),
            "/ns/model1/catalog-info.yaml"
        );
        assert_eq!(key.uri(NormalizerFormat::JsonArray), "/ns/model1/catalog-info.json");
        assert_eq!(
            key.uri(NormalizerFormat::JsonArray),
            key.uri(NormalizerFormat::JsonArray)
        );
    }

    #[test]
    fn test_uri_segments_are_percent_encoded() {
        let key = ModelKey::new("my ns", "model/1").unwrap();
        assert_eq!(
            key.uri(NormalizerFormat::CatalogInfoYaml),
            "/my%20ns/model%2F1/catalog-info.yaml"
        );
    }

    #[test]
    fn test_parse_ignores_trailing_segments() {
        let key = ModelKey::parse("ns_model_v1").unwrap();
        assert_eq!(key.storage_key(), "ns_model");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!(matches!(
            ModelKey::parse("nodelimiter"),
            Err(BridgeError::InvalidKey { .. })
        ));
        assert!(ModelKey::parse("").is_err());
        assert!(ModelKey::parse("ns_").is_err());
        assert!(ModelKey::parse("_model").is_err());
    }

    #[test]
    fn test_new_rejects_delimiter_in_segment() {
        assert!(ModelKey::new("my_ns", "model").is_err());
        assert!(ModelKey::new("ns", "model_1").is_err());
    }

    #[test]
    fn test_distinct_pairs_do_not_collide() {
        let (k1, u1) = build_import_key_and_uri("ab", "c", NormalizerFormat::JsonArray).unwrap();
        let (k2, u2) = build_import_key_and_uri("a", "bc", NormalizerFormat::JsonArray).unwrap();
        assert_ne!(k1, k2);
        assert_ne!(u1, u2);
    }
}
