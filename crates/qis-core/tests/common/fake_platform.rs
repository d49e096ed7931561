//! In-memory download platform and settings store with call recording.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use qis_core::error::{PlatformError, StoreError};
use qis_core::platform::{
    DownloadDelta, DownloadId, DownloadItem, DownloadPlatform, DownloadRequest, DownloadState,
    MemoryStore, SettingsStore, StateChange,
};

/// Name the fake "dialog" picks for `save_as` requests.
pub const DIALOG_PICK: &str = "picked-in-dialog.png";

struct Inner {
    root: String,
    initial_state: DownloadState,
    reject_next: usize,
    next_id: DownloadId,
    requests: Vec<DownloadRequest>,
    items: HashMap<DownloadId, DownloadItem>,
    removed: Vec<DownloadId>,
    erased: Vec<DownloadId>,
    searches: Vec<DownloadId>,
}

/// Download platform that records every call and completes on demand.
pub struct FakePlatform {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<DownloadDelta>,
}

impl FakePlatform {
    /// Downloads land under `C:\Users\alex\Downloads` and start in progress.
    pub fn new() -> Self {
        Self::with_root(r"C:\Users\alex\Downloads")
    }

    pub fn with_root(root: &str) -> Self {
        Self::build(root, 16)
    }

    /// Change broadcast holding only `capacity` notifications, so slow
    /// subscribers lag.
    pub fn with_channel_capacity(capacity: usize) -> Self {
        Self::build(r"C:\Users\alex\Downloads", capacity)
    }

    fn build(root: &str, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self {
            inner: Mutex::new(Inner {
                root: root.to_string(),
                initial_state: DownloadState::InProgress,
                reject_next: 0,
                next_id: 0,
                requests: Vec::new(),
                items: HashMap::new(),
                removed: Vec::new(),
                erased: Vec::new(),
                searches: Vec::new(),
            }),
            changes,
        }
    }

    /// Refuse the next `n` download calls.
    pub fn reject_next(&self, n: usize) {
        self.inner.lock().unwrap().reject_next = n;
    }

    /// State new downloads start in.
    pub fn start_downloads_as(&self, state: DownloadState) {
        self.inner.lock().unwrap().initial_state = state;
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn removed(&self) -> Vec<DownloadId> {
        self.inner.lock().unwrap().removed.clone()
    }

    pub fn erased(&self) -> Vec<DownloadId> {
        self.inner.lock().unwrap().erased.clone()
    }

    /// Ids passed to `search`, in call order.
    pub fn searches(&self) -> Vec<DownloadId> {
        self.inner.lock().unwrap().searches.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Moves `id` to `state` and broadcasts the change.
    pub fn transition(&self, id: DownloadId, state: DownloadState) {
        let previous = {
            let mut inner = self.inner.lock().unwrap();
            let item = inner.items.get_mut(&id).expect("known download");
            std::mem::replace(&mut item.state, state)
        };
        let _ = self.changes.send(DownloadDelta {
            id,
            state: Some(StateChange {
                previous,
                current: state,
            }),
        });
    }

    pub fn complete(&self, id: DownloadId) {
        self.transition(id, DownloadState::Complete);
    }

    /// Broadcasts a delta that carries no state change.
    pub fn touch(&self, id: DownloadId) {
        let _ = self.changes.send(DownloadDelta { id, state: None });
    }
}

#[async_trait]
impl DownloadPlatform for FakePlatform {
    async fn download(&self, request: DownloadRequest) -> Result<DownloadId, PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());
        if inner.reject_next > 0 {
            inner.reject_next -= 1;
            return Err(PlatformError::Rejected("Invalid filename".to_string()));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let name = request.filename.clone().unwrap_or_else(|| DIALOG_PICK.to_string());
        let filename = format!("{}\\{}", inner.root, name);
        let state = inner.initial_state;
        inner.items.insert(
            id,
            DownloadItem {
                id,
                url: request.url,
                filename,
                state,
            },
        );
        Ok(id)
    }

    async fn search(&self, id: DownloadId) -> Result<Option<DownloadItem>, PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        inner.searches.push(id);
        Ok(inner.items.get(&id).cloned())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<DownloadDelta> {
        self.changes.subscribe()
    }

    async fn remove_file(&self, id: DownloadId) -> Result<(), PlatformError> {
        self.inner.lock().unwrap().removed.push(id);
        Ok(())
    }

    async fn erase(&self, id: DownloadId) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        inner.items.remove(&id);
        inner.erased.push(id);
        Ok(())
    }
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    sets: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }
}
