//! catalog-bridge - storage and location servers of the model catalog bridge.
//!
//! `catalog-bridge storage` runs the sync core in front of the storage tier;
//! `catalog-bridge location` serves catalog documents to the catalog.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use model_catalog_bridge::config::{clean_env_value, BridgeDefaults, EnvVars};
use model_catalog_bridge::{
    open_storage, Bridge, CacheConfig, LocationRegistry, NormalizerFormat, RehydrateConfig,
    Rehydrator, StorageType,
};
use model_catalog_bridge_clients::{
    BackstageCatalogClient, ClientConfig, LocationServiceClient, StorageServiceClient,
};
use model_catalog_bridge_server::{start_location_server, start_storage_server};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "catalog-bridge")]
#[command(about = "Keeps a developer catalog in sync with a model registry")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the storage server (bridge sync core)
    Storage(StorageArgs),
    /// Run the location server
    Location(LocationArgs),
}

#[derive(Args, Debug)]
struct StorageArgs {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = BridgeDefaults::STORAGE_PORT)]
    port: u16,

    /// Storage backend: memory or sqlite
    #[arg(long, env = EnvVars::STORAGE_TYPE, default_value = "memory", value_parser = parse_storage_type)]
    storage_type: StorageType,

    /// SQLite database file for the sqlite backend
    #[arg(long, env = EnvVars::SQLITE_PATH, default_value = BridgeDefaults::SQLITE_PATH)]
    sqlite_path: PathBuf,

    /// URL of the location service, as reachable by the catalog
    #[arg(long, env = EnvVars::BRIDGE_URL)]
    bridge_url: String,

    /// Bearer token for the location service
    #[arg(long, env = EnvVars::BRIDGE_TOKEN, default_value = "", hide_env_values = true)]
    bridge_token: String,

    /// Base URL of the Backstage catalog
    #[arg(long, env = EnvVars::BKSTG_URL)]
    bkstg_url: String,

    /// Bearer token for the Backstage catalog
    #[arg(long, env = EnvVars::BKSTG_TOKEN, default_value = "", hide_env_values = true)]
    bkstg_token: String,

    /// Accept invalid TLS certificates from the catalog
    #[arg(long, env = EnvVars::BKSTG_SKIP_TLS)]
    bkstg_skip_tls: bool,

    /// Format of the normalized catalog documents
    #[arg(long, env = EnvVars::FORMAT, default_value = "json-array", value_parser = parse_format)]
    format: NormalizerFormat,

    /// Seconds a confirmed catalog import is trusted before it is probed again
    #[arg(long, env = EnvVars::VALIDITY_TTL_SECS, default_value_t = BridgeDefaults::VALIDITY_TTL.as_secs())]
    validity_ttl_secs: u64,
}

#[derive(Args, Debug)]
struct LocationArgs {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = BridgeDefaults::LOCATION_PORT)]
    port: u16,

    /// URL of the storage service to rehydrate from
    #[arg(long, env = EnvVars::STORAGE_URL, default_value = "")]
    storage_url: String,

    /// Pod IP; the storage service is assumed to run as a sidecar on it when
    /// no storage URL is given
    #[arg(long, env = EnvVars::POD_IP, default_value = "")]
    pod_ip: String,

    /// Externally reachable URL of this location service
    #[arg(long, env = EnvVars::BRIDGE_URL, default_value = "")]
    bridge_url: String,

    /// Bearer token for the storage service
    #[arg(long, env = EnvVars::BRIDGE_TOKEN, default_value = "", hide_env_values = true)]
    bridge_token: String,

    /// Format of the normalized catalog documents
    #[arg(long, env = EnvVars::FORMAT, default_value = "json-array", value_parser = parse_format)]
    format: NormalizerFormat,
}

fn parse_format(s: &str) -> std::result::Result<NormalizerFormat, String> {
    NormalizerFormat::from_str(&clean_env_value(s))
        .ok_or_else(|| format!("unknown normalizer format '{}'", s))
}

fn parse_storage_type(s: &str) -> std::result::Result<StorageType, String> {
    StorageType::from_str(&clean_env_value(s)).ok_or_else(|| format!("unknown storage type '{}'", s))
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Storage URL for the location server: explicit, or the sidecar on the pod IP.
fn resolve_storage_url(storage_url: &str, pod_ip: &str) -> Option<String> {
    let storage_url = clean_env_value(storage_url);
    if !storage_url.is_empty() {
        return Some(storage_url);
    }
    let pod_ip = clean_env_value(pod_ip);
    if pod_ip.is_empty() {
        return None;
    }
    Some(format!("http://{}:{}", pod_ip, BridgeDefaults::STORAGE_PORT))
}

async fn run_storage(args: StorageArgs) -> Result<()> {
    let bridge_url = clean_env_value(&args.bridge_url);
    let bkstg_url = clean_env_value(&args.bkstg_url);
    if bridge_url.is_empty() || bkstg_url.is_empty() {
        bail!("both {} and {} must be set", EnvVars::BRIDGE_URL, EnvVars::BKSTG_URL);
    }
    info!(
        "Starting storage server (backend {}, format {}, location service {}, catalog {})",
        args.storage_type, args.format, bridge_url, bkstg_url
    );

    let storage = open_storage(args.storage_type, &args.sqlite_path)?;
    let locations = Arc::new(LocationServiceClient::new(
        &bridge_url,
        ClientConfig::default().with_token(clean_env_value(&args.bridge_token)),
    )?);
    let catalog = Arc::new(BackstageCatalogClient::new(
        &bkstg_url,
        ClientConfig::default()
            .with_token(clean_env_value(&args.bkstg_token))
            .with_skip_tls_verify(args.bkstg_skip_tls),
    )?);

    let bridge = Bridge::new(storage, locations, catalog, args.format).with_cache_config(
        CacheConfig {
            validity_ttl: Duration::from_secs(args.validity_ttl_secs),
            ..CacheConfig::default()
        },
    );

    let addr = start_storage_server(Arc::new(bridge), &args.host, args.port).await?;
    info!("Storage server running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    Ok(())
}

async fn run_location(args: LocationArgs) -> Result<()> {
    let Some(storage_url) = resolve_storage_url(&args.storage_url, &args.pod_ip) else {
        bail!(
            "either {} or {} must be set",
            EnvVars::STORAGE_URL,
            EnvVars::POD_IP
        );
    };
    let mut host_url = clean_env_value(&args.bridge_url);
    if host_url.is_empty() {
        host_url = format!("http://{}:{}", args.host, args.port);
    }
    info!(
        "Starting location server (format {}, storage {}, public URL {})",
        args.format, storage_url, host_url
    );

    let registry = Arc::new(LocationRegistry::new(args.format, host_url));
    let storage = Arc::new(StorageServiceClient::new(
        &storage_url,
        ClientConfig::default().with_token(clean_env_value(&args.bridge_token)),
    )?);
    let rehydrator = Rehydrator::new(registry.clone(), storage, RehydrateConfig::default());

    let addr = start_location_server(registry, rehydrator, &args.host, args.port).await?;
    info!("Location server running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.json_logs);

    match cli.command {
        Command::Storage(args) => run_storage(args).await,
        Command::Location(args) => run_location(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url_fallback() {
        assert_eq!(
            resolve_storage_url("http://storage:7070\n", "10.0.0.1").as_deref(),
            Some("http://storage:7070")
        );
        assert_eq!(
            resolve_storage_url("", "10.0.0.1").as_deref(),
            Some("http://10.0.0.1:7070")
        );
        assert_eq!(resolve_storage_url("", ""), None);
    }

    #[test]
    fn test_cli_parses_storage_command() {
        let cli = Cli::try_parse_from([
            "catalog-bridge",
            "--debug",
            "storage",
            "--bridge-url",
            "http://location:9090",
            "--bkstg-url",
            "http://backstage:7007",
            "--format",
            "catalog-info-yaml",
            "--storage-type",
            "sqlite",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Storage(args) => {
                assert_eq!(args.format, NormalizerFormat::CatalogInfoYaml);
                assert_eq!(args.storage_type, StorageType::Sqlite);
                assert_eq!(args.port, 7070);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = Cli::try_parse_from([
            "catalog-bridge",
            "location",
            "--storage-url",
            "http://storage:7070",
            "--format",
            "xml",
        ]);
        assert!(result.is_err());
    }
}
