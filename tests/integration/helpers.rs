//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use kvhub_client::{Client, EventKind, HookEvent, HookHandler, hook_fn};
use kvhub_store::memory::MemoryStore;

/// Create a client backed by a fresh in-memory store
pub fn memory_client() -> Client {
    Client::new(Arc::new(MemoryStore::default()))
}

/// Records every event a hook receives
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<HookEvent>>>,
    calls: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook handler that appends to this recorder
    pub fn handler(&self) -> impl HookHandler + use<> {
        let recorder = self.clone();
        hook_fn(move |_cancel, event| {
            let recorder = recorder.clone();
            async move {
                recorder.calls.fetch_add(1, Ordering::SeqCst);
                recorder.events.lock().await.push(event);
                Ok(())
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn events(&self) -> Vec<(EventKind, String)> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| (e.kind, e.key.clone()))
            .collect()
    }
}
