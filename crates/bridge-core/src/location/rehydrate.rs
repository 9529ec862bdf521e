//! Repopulating the location registry from the storage tier.
//!
//! After a restart the registry is empty while storage still holds every
//! document. A background task polls storage at a fixed interval until one
//! attempt loads the complete key set, the time budget runs out, or the task
//! is cancelled. Failed attempts are logged and retried; they never surface
//! to request handling.

use super::registry::LocationRegistry;
use crate::cancel::CancellationToken;
use crate::codec::ModelKey;
use crate::config::BridgeDefaults;
use crate::error::Result;
use crate::traits::StorageReader;
use bytes::Bytes;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Polling schedule for rehydration.
#[derive(Debug, Clone)]
pub struct RehydrateConfig {
    /// Delay between attempts.
    pub interval: Duration,
    /// Wall-clock budget for the whole task.
    pub timeout: Duration,
}

impl Default for RehydrateConfig {
    fn default() -> Self {
        Self {
            interval: BridgeDefaults::REHYDRATE_INTERVAL,
            timeout: BridgeDefaults::REHYDRATE_TIMEOUT,
        }
    }
}

/// How a rehydration task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehydrateOutcome {
    /// Every key in storage was loaded.
    Loaded { keys: usize, attempts: u32 },
    /// The time budget ran out before an attempt succeeded.
    TimedOut { attempts: u32 },
    /// The task was cancelled.
    Cancelled { attempts: u32 },
}

impl LocationRegistry {
    /// Load every document held by storage into the registry.
    ///
    /// Keys that do not parse are skipped; keys that vanished between listing
    /// and fetching are skipped too. Any storage error fails the attempt.
    pub async fn load_from_storage(&self, storage: &dyn StorageReader) -> Result<usize> {
        let keys = storage.list().await?;
        let mut loaded = 0;
        for key in keys {
            let model_key = match ModelKey::parse(&key) {
                Ok(model_key) => model_key,
                Err(e) => {
                    error!("bad format for key from storage list: {}", e);
                    continue;
                }
            };
            let Some(body) = storage.fetch(&key).await? else {
                warn!("key {} disappeared from storage during rehydration", key);
                continue;
            };
            self.upsert(&model_key.uri(self.format()), Bytes::from(body.body));
            loaded += 1;
        }
        Ok(loaded)
    }
}

/// Poll storage until the registry is fully loaded, the budget is spent, or
/// `cancel` fires. The first attempt runs immediately.
pub async fn rehydrate(
    registry: &LocationRegistry,
    storage: &dyn StorageReader,
    config: &RehydrateConfig,
    cancel: &CancellationToken,
) -> RehydrateOutcome {
    let deadline = Instant::now() + config.timeout;
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return RehydrateOutcome::Cancelled { attempts };
        }
        attempts += 1;

        let attempt = tokio::select! {
            _ = cancel.cancelled() => return RehydrateOutcome::Cancelled { attempts },
            attempt = tokio::time::timeout_at(deadline, registry.load_from_storage(storage)) => attempt,
        };

        match attempt {
            Ok(Ok(keys)) => {
                info!(
                    "Location registry rehydrated with {} keys after {} attempt(s)",
                    keys, attempts
                );
                return RehydrateOutcome::Loaded { keys, attempts };
            }
            Ok(Err(e)) => warn!("Rehydration attempt {} failed: {}", attempts, e),
            Err(_) => {
                warn!("Rehydration attempt {} ran past the time budget", attempts);
                return RehydrateOutcome::TimedOut { attempts };
            }
        }

        if Instant::now() + config.interval > deadline {
            warn!(
                "Giving up on rehydration after {} attempts ({:?} budget)",
                attempts, config.timeout
            );
            return RehydrateOutcome::TimedOut { attempts };
        }

        tokio::select! {
            _ = cancel.cancelled() => return RehydrateOutcome::Cancelled { attempts },
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}

/// Owns the background rehydration task of a location registry.
///
/// Each [`Rehydrator::trigger`] cancels the task still in flight, if any, and
/// starts a fresh one, so a manual resync never runs alongside a stale poll.
pub struct Rehydrator {
    registry: Arc<LocationRegistry>,
    storage: Arc<dyn StorageReader>,
    config: RehydrateConfig,
    current: Mutex<CancellationToken>,
}

impl Rehydrator {
    pub fn new(
        registry: Arc<LocationRegistry>,
        storage: Arc<dyn StorageReader>,
        config: RehydrateConfig,
    ) -> Self {
        Self {
            registry,
            storage,
            config,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// Start a detached rehydration task.
    pub fn trigger(&self) -> JoinHandle<RehydrateOutcome> {
        let cancel = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap_or_else(PoisonError::into_inner),
            cancel.clone(),
        );
        previous.cancel();

        let registry = self.registry.clone();
        let storage = self.storage.clone();
        let config = self.config.clone();
        info!(
            "Starting location rehydration (every {:?} for up to {:?})",
            config.interval, config.timeout
        );
        tokio::spawn(async move { rehydrate(&registry, storage.as_ref(), &config, &cancel).await })
    }

    /// Cancel the task in flight, if any.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

impl Drop for Rehydrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
