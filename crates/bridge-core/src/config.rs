//! Centralized configuration for the bridge.
//!
//! This module provides default ports, polling intervals, route paths and the
//! string-keyed enums (`NormalizerFormat`, `StorageType`) read from the
//! environment.

use std::time::Duration;

/// Service-level defaults.
pub struct BridgeDefaults;

impl BridgeDefaults {
    pub const STORAGE_PORT: u16 = 7070;
    pub const LOCATION_PORT: u16 = 9090;

    // Location registry rehydration
    pub const REHYDRATE_INTERVAL: Duration = Duration::from_secs(30);
    pub const REHYDRATE_TIMEOUT: Duration = Duration::from_secs(3600);

    // Sync cache
    pub const VALIDITY_TTL: Duration = Duration::from_secs(300);
    pub const CACHE_SHARDS: usize = 16;

    // HTTP clients
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = "model-catalog-bridge";

    pub const SQLITE_PATH: &'static str = "bridge-storage.db";
}

/// Route paths shared by the servers and the clients talking to them.
pub struct Routes;

impl Routes {
    pub const UPSERT: &'static str = "/upsert";
    pub const REMOVE: &'static str = "/remove";
    pub const CURRENT_KEY_SET: &'static str = "/currentkeyset";
    pub const LIST: &'static str = "/list";
    pub const FETCH: &'static str = "/fetch";
    pub const BACKGROUND_POLL: &'static str = "/poll";
    pub const HEALTH: &'static str = "/health";
}

/// Environment variable names read by the binaries.
pub struct EnvVars;

impl EnvVars {
    pub const STORAGE_TYPE: &'static str = "STORAGE_TYPE";
    pub const SQLITE_PATH: &'static str = "SQLITE_PATH";
    pub const STORAGE_URL: &'static str = "STORAGE_URL";
    pub const POD_IP: &'static str = "POD_IP";
    pub const BRIDGE_URL: &'static str = "BRIDGE_URL";
    pub const BRIDGE_TOKEN: &'static str = "BRIDGE_TOKEN";
    pub const BKSTG_URL: &'static str = "BKSTG_URL";
    pub const BKSTG_TOKEN: &'static str = "RHDH_TOKEN";
    pub const BKSTG_SKIP_TLS: &'static str = "BKSTG_SKIP_TLS";
    pub const FORMAT: &'static str = "NORMALIZER_FORMAT";
    pub const VALIDITY_TTL_SECS: &'static str = "CACHE_VALIDITY_TTL_SECS";
}

/// Output format of the catalog documents produced by the normalizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalizerFormat {
    #[default]
    JsonArray,
    CatalogInfoYaml,
}

impl NormalizerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizerFormat::JsonArray => "json-array",
            NormalizerFormat::CatalogInfoYaml => "catalog-info-yaml",
        }
    }

    /// File name the document is served under.
    pub fn document_name(&self) -> &'static str {
        match self {
            NormalizerFormat::JsonArray => "catalog-info.json",
            NormalizerFormat::CatalogInfoYaml => "catalog-info.yaml",
        }
    }

    /// MIME type of the served document.
    pub fn content_type(&self) -> &'static str {
        match self {
            NormalizerFormat::JsonArray => "application/json",
            NormalizerFormat::CatalogInfoYaml => "application/yaml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json-array" | "jsonarray" | "json" => Some(NormalizerFormat::JsonArray),
            "catalog-info-yaml" | "catalog-info" | "yaml" => {
                Some(NormalizerFormat::CatalogInfoYaml)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for NormalizerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageType {
    #[default]
    Memory,
    Sqlite,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Memory => "memory",
            StorageType::Sqlite => "sqlite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "memory" | "mem" => Some(StorageType::Memory),
            "sqlite" => Some(StorageType::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strip the stray carriage returns and newlines that mounted secrets and
/// config maps tend to carry.
pub fn clean_env_value(value: &str) -> String {
    value.replace(['\r', '\n'], "")
}
