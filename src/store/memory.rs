use std::sync::RwLock as StdRwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, RwLock};

use super::remote::{RemoteStore, StoreSubscription, StoreWrite};
use crate::utils::errors::StoreError;

type WriteGuard = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct Subscriber {
    path: String,
    tx: mpsc::UnboundedSender<Value>,
}

/// In-process implementation of the remote store contract.
///
/// Backs tests and offline/solo play with the same semantics the real
/// backing store exposes: a JSON tree addressed by slash paths, multi-path
/// updates applied under one lock, and subtree snapshot fan-out to
/// subscribers. The optional write guard stands in for the backing store's
/// access rules so permission denials can be exercised.
pub struct MemoryStore {
    root: RwLock<Value>,
    subscribers: RwLock<Vec<Subscriber>>,
    write_guard: StdRwLock<Option<WriteGuard>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            subscribers: RwLock::new(Vec::new()),
            write_guard: StdRwLock::new(None),
        }
    }

    /// Installs an access rule: writes to paths the guard rejects fail with
    /// `StoreError::PermissionDenied` before anything is applied.
    pub fn set_write_guard(&self, guard: impl Fn(&str) -> bool + Send + Sync + 'static) {
        let mut slot = self
            .write_guard
            .write()
            .expect("Write guard lock poisoned");
        *slot = Some(Box::new(guard));
    }

    fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(segments)
    }

    fn subtree<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
        let mut node = root;
        for segment in path.split('/') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    fn apply(root: &mut Value, segments: &[&str], value: Option<Value>) {
        let (last, parents) = segments.split_last().expect("Path segments are empty");

        let mut node = root;
        for segment in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let object = node.as_object_mut().expect("Node was just made an object");
            node = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let object = node.as_object_mut().expect("Node was just made an object");
        match value {
            Some(value) => {
                object.insert(last.to_string(), value);
            }
            None => {
                object.remove(*last);
            }
        }
    }

    /// Two paths overlap when one is a segment-wise prefix of the other, in
    /// which case a write to one changes the subtree seen at the other.
    fn paths_overlap(a: &str, b: &str) -> bool {
        let a: Vec<&str> = a.split('/').collect();
        let b: Vec<&str> = b.split('/').collect();
        let shared = a.len().min(b.len());
        a[..shared] == b[..shared]
    }

    async fn notify(&self, changed: &[String]) {
        let root = self.root.read().await;
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|sub| {
            let touched = changed
                .iter()
                .any(|path| MemoryStore::paths_overlap(path, &sub.path));
            if !touched {
                return true;
            }
            let snapshot = MemoryStore::subtree(&root, &sub.path)
                .cloned()
                .unwrap_or(Value::Null);
            // A closed receiver means the subscriber dropped its handle.
            sub.tx.send(snapshot).is_ok()
        });
    }

    fn check_guard(&self, writes: &[StoreWrite]) -> Result<(), StoreError> {
        let guard = self
            .write_guard
            .read()
            .expect("Write guard lock poisoned");
        if let Some(guard) = guard.as_ref() {
            for write in writes {
                if !guard(&write.path) {
                    return Err(StoreError::PermissionDenied(write.path.clone()));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        MemoryStore::segments(path)?;
        let root = self.root.read().await;
        Ok(MemoryStore::subtree(&root, path).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.update(vec![StoreWrite::set(path, value)]).await
    }

    async fn update(&self, writes: Vec<StoreWrite>) -> Result<(), StoreError> {
        for write in &writes {
            MemoryStore::segments(&write.path)?;
        }
        self.check_guard(&writes)?;

        {
            let mut root = self.root.write().await;
            for write in &writes {
                let segments: Vec<&str> = write.path.split('/').collect();
                MemoryStore::apply(&mut root, &segments, write.value.clone());
            }
        }

        let changed: Vec<String> = writes.into_iter().map(|w| w.path).collect();
        self.notify(&changed).await;
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<StoreSubscription, StoreError> {
        MemoryStore::segments(path)?;
        let (tx, rx) = mpsc::unbounded_channel();

        // The root lock stays held until the subscriber is registered, so
        // no write can slip between the initial snapshot and the feed.
        let root = self.root.read().await;
        let snapshot = MemoryStore::subtree(&root, path)
            .cloned()
            .unwrap_or(Value::Null);
        let _ = tx.send(snapshot);

        let mut subscribers = self.subscribers.write().await;
        subscribers.push(Subscriber {
            path: path.to_string(),
            tx,
        });

        Ok(StoreSubscription::new(rx))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
