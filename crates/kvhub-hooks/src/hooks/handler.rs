//! Hook handler trait and the closure adapter.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use kvhub_core::result::AppResult;

use super::definitions::HookEvent;

/// Callback invoked after a matching operation succeeds.
///
/// `cancel` is cancelled when a synchronous hook's timeout elapses. Handlers
/// that may run long should watch it and return promptly; a handler that
/// ignores it is never force-stopped.
#[async_trait]
pub trait HookHandler: Send + Sync + fmt::Debug {
    /// Handles one event. An `Err` is reported through the hook's error stream.
    async fn handle(&self, cancel: CancellationToken, event: HookEvent) -> AppResult<()>;
}

/// Adapts an async closure into a [`HookHandler`].
pub struct FnHook<F> {
    f: F,
}

impl<F> fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

/// Wraps `f` so it can be registered as a hook.
///
/// ```ignore
/// let hook = hook_fn(|_cancel, event| async move {
///     tracing::info!(key = %event.key, "changed");
///     Ok(())
/// });
/// ```
pub fn hook_fn<F, Fut>(f: F) -> FnHook<F>
where
    F: Fn(CancellationToken, HookEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    FnHook { f }
}

#[async_trait]
impl<F, Fut> HookHandler for FnHook<F>
where
    F: Fn(CancellationToken, HookEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    async fn handle(&self, cancel: CancellationToken, event: HookEvent) -> AppResult<()> {
        (self.f)(cancel, event).await
    }
}
