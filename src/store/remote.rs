use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::utils::errors::StoreError;

/// One point write inside a multi-path update. `None` deletes the path.
#[derive(Debug, Clone)]
pub struct StoreWrite {
    pub path: String,
    pub value: Option<Value>,
}

impl StoreWrite {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: None,
        }
    }
}

/// Live feed of subtree snapshots for one subscribed path.
///
/// The store delivers the current value on subscription and the full subtree
/// again on every change underneath the path. Dropping the subscription is
/// the unsubscribe.
pub struct StoreSubscription {
    rx: mpsc::UnboundedReceiver<Value>,
}

impl StoreSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { rx }
    }

    /// Waits for the next snapshot. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

/// Contract of the hierarchical synchronized store the sync core writes to.
///
/// Paths are slash-separated key sequences (`rooms/{roomId}/players/{uid}`).
/// Every path holds an arbitrary JSON subtree; writes replace the whole
/// subtree at their path, and concurrent writers resolve last-write-wins per
/// path. The core depends only on this trait, never on a concrete backing.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads the subtree at `path`. `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the subtree at `path` with `value`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Applies all writes in one call, atomically with respect to readers.
    async fn update(&self, writes: Vec<StoreWrite>) -> Result<(), StoreError>;

    /// Opens a snapshot feed for the subtree at `path`.
    async fn subscribe(&self, path: &str) -> Result<StoreSubscription, StoreError>;
}
