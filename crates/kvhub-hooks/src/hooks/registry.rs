//! Hook registry: callers register handlers with filters and a mode.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tracing::{debug, info};

use kvhub_core::error::AppError;
use kvhub_core::types::HookId;

use super::definitions::{EventKind, HookOptions};
use super::handler::HookHandler;
use super::sink::{Delivery, ErrorSink, HookErrors};

type HookMap = HashMap<HookId, Arc<HookRegistration>>;

/// One registered hook.
#[derive(Debug)]
pub(crate) struct HookRegistration {
    /// Identifier handed back at registration.
    pub(crate) id: HookId,
    /// The callback.
    pub(crate) handler: Arc<dyn HookHandler>,
    /// Event/key filters, mode, and timeout.
    pub(crate) options: HookOptions,
    /// Where this hook's failures go.
    sink: ErrorSink,
}

impl HookRegistration {
    /// Offers a failed result to the error sink; successes are ignored.
    pub(crate) fn report(&self, result: Result<(), AppError>) {
        let Err(err) = result else {
            return;
        };

        let kind = err.kind;
        match self.sink.deliver(err) {
            Delivery::Queued => {
                debug!(hook_id = %self.id, error_kind = %kind, "Hook error queued");
            }
            Delivery::Full => {
                debug!(hook_id = %self.id, error_kind = %kind, "Hook error dropped, sink full");
            }
            Delivery::Closed => {
                debug!(hook_id = %self.id, error_kind = %kind, "Hook error dropped, sink closed");
            }
        }
    }
}

/// Registry of hooks for one client instance.
///
/// Cloning shares the same underlying set. Registrations live until
/// unregistered or until the registry is dropped; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct HooksRegistry {
    /// Hook ID → registration.
    hooks: Arc<RwLock<HookMap>>,
}

impl HooksRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook.
    ///
    /// Returns the hook's ID, the stream its failures are reported on, and a
    /// handle that unregisters it. The hook is visible to dispatch as soon as
    /// this returns.
    pub async fn register<H>(
        &self,
        handler: H,
        options: HookOptions,
    ) -> (HookId, HookErrors, Unregister)
    where
        H: HookHandler + 'static,
    {
        self.register_arc(Arc::new(handler), options).await
    }

    /// Registers an already shared handler.
    pub async fn register_arc(
        &self,
        handler: Arc<dyn HookHandler>,
        options: HookOptions,
    ) -> (HookId, HookErrors, Unregister) {
        let id = HookId::new();
        let (sink, errors) = ErrorSink::channel();

        info!(
            hook_id = %id,
            events = ?options.events,
            key_filter = ?options.key_filter,
            mode = ?options.mode,
            timeout_ms = options.timeout.as_millis() as u64,
            "Hook registered"
        );

        let registration = Arc::new(HookRegistration {
            id,
            handler,
            options,
            sink,
        });
        self.hooks.write().await.insert(id, registration);

        let unregister = Unregister {
            hooks: Arc::downgrade(&self.hooks),
            id,
        };
        (id, errors, unregister)
    }

    /// Removes a hook and closes its error stream.
    ///
    /// Unknown or already removed IDs are a no-op. Returns whether a hook
    /// was removed.
    pub async fn unregister(&self, id: HookId) -> bool {
        remove(&self.hooks, id).await
    }

    /// Number of registered hooks.
    pub async fn len(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Returns whether no hooks are registered.
    pub async fn is_empty(&self) -> bool {
        self.hooks.read().await.is_empty()
    }

    /// Returns whether `id` is currently registered.
    pub async fn contains(&self, id: HookId) -> bool {
        self.hooks.read().await.contains_key(&id)
    }

    /// Copies out every registration matching `kind` and `key`.
    ///
    /// The read lock is released before this returns, so callers can run
    /// handlers that themselves register or unregister hooks.
    pub(crate) async fn snapshot(&self, kind: EventKind, key: &str) -> Vec<Arc<HookRegistration>> {
        let hooks = self.hooks.read().await;
        hooks
            .values()
            .filter(|registration| registration.options.matches(kind, key))
            .cloned()
            .collect()
    }
}

async fn remove(hooks: &RwLock<HookMap>, id: HookId) -> bool {
    let removed = hooks.write().await.remove(&id);
    match removed {
        Some(registration) => {
            registration.sink.close();
            info!(hook_id = %id, "Hook unregistered");
            true
        }
        None => false,
    }
}

/// Handle returned by registration that removes the hook.
///
/// Calling it more than once is harmless. It holds only a weak reference,
/// so a hook that captures its own handle does not keep the registry alive.
#[derive(Debug, Clone)]
pub struct Unregister {
    hooks: Weak<RwLock<HookMap>>,
    id: HookId,
}

impl Unregister {
    /// The ID of the hook this handle removes.
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Removes the hook. Returns whether this call removed it.
    pub async fn call(&self) -> bool {
        match self.hooks.upgrade() {
            Some(hooks) => remove(&hooks, self.id).await,
            None => false,
        }
    }
}
