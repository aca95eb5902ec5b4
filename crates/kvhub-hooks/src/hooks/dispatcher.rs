//! Hook dispatch: match, snapshot, then execute.
//!
//! - Matching registrations are copied out under the read lock and the lock
//!   is released before any handler runs.
//! - Asynchronous hooks are spawned and never awaited by the caller.
//! - Synchronous hooks run before `dispatch` returns. With a timeout, the
//!   caller waits at most that long; the hook's token is then cancelled, a
//!   deadline-exceeded error is reported, and the hook keeps running
//!   detached until it returns on its own.
//! - Failures go to the hook's own error stream and never reach the caller.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use kvhub_core::error::AppError;
use kvhub_core::result::AppResult;

use super::definitions::{EventKind, HookEvent, HookMode};
use super::handler::HookHandler;
use super::registry::{HookRegistration, HooksRegistry};

impl HooksRegistry {
    /// Runs every hook matching `kind` and `key`.
    ///
    /// Called after a mutating operation succeeds. Returns the number of
    /// hooks that matched.
    pub async fn dispatch(&self, kind: EventKind, key: &str, value: Option<Bytes>) -> usize {
        let matched = self.snapshot(kind, key).await;
        if matched.is_empty() {
            return 0;
        }

        debug!(
            event = %kind,
            key,
            hook_count = matched.len(),
            "Dispatching hooks"
        );

        let count = matched.len();
        let event = HookEvent::new(kind, key, value);

        for registration in matched {
            match registration.options.mode {
                HookMode::Asynchronous => {
                    let event = event.clone();
                    tokio::spawn(async move {
                        let result =
                            invoke(&registration.handler, CancellationToken::new(), event).await;
                        registration.report(result);
                    });
                }
                HookMode::Synchronous => run_synchronous(registration, event.clone()).await,
            }
        }

        count
    }
}

async fn run_synchronous(registration: Arc<HookRegistration>, event: HookEvent) {
    let timeout = registration.options.timeout;
    if timeout.is_zero() {
        let result = invoke(&registration.handler, CancellationToken::new(), event).await;
        registration.report(result);
        return;
    }

    let cancel = CancellationToken::new();
    let handler = Arc::clone(&registration.handler);
    let token = cancel.clone();
    let kind = event.kind;
    let key = event.key.clone();

    let mut task = tokio::spawn(async move { invoke(&handler, token, event).await });

    tokio::select! {
        joined = &mut task => {
            let result = joined.unwrap_or_else(|e| {
                Err(AppError::internal(format!("Hook task failed: {e}")))
            });
            registration.report(result);
        }
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            warn!(
                hook_id = %registration.id,
                event = %kind,
                key = %key,
                timeout_ms = timeout.as_millis() as u64,
                "Synchronous hook timed out"
            );
            registration.report(Err(deadline_error(kind, &key, timeout)));
            // The task is not aborted; dropping the handle detaches it and
            // whatever it eventually returns is discarded.
        }
    }
}

/// Calls the handler, turning a panic into an error.
async fn invoke(
    handler: &Arc<dyn HookHandler>,
    cancel: CancellationToken,
    event: HookEvent,
) -> AppResult<()> {
    match AssertUnwindSafe(handler.handle(cancel, event))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(_) => Err(AppError::hook("Hook handler panicked")),
    }
}

fn deadline_error(kind: EventKind, key: &str, timeout: Duration) -> AppError {
    AppError::deadline_exceeded(format!(
        "Hook for {kind} on '{key}' exceeded {}ms",
        timeout.as_millis()
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    use super::*;
    use crate::hooks::definitions::HookOptions;
    use crate::hooks::filter::KeyFilter;
    use crate::hooks::handler::hook_fn;
    use crate::hooks::sink::ERROR_SINK_CAPACITY;
    use kvhub_core::error::ErrorKind;

    fn counting(counter: Arc<AtomicUsize>) -> impl HookHandler {
        hook_fn(move |_cancel, _event| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn sleeping(body: Duration) -> impl HookHandler {
        hook_fn(move |_cancel, _event| async move {
            tokio::time::sleep(body).await;
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_event_filter_selects_hooks() {
        let registry = HooksRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let (_id, _errors, _) = registry
            .register(
                counting(Arc::clone(&counter)),
                HookOptions::new().with_events([EventKind::Set, EventKind::BatchSet]),
            )
            .await;

        for kind in EventKind::ALL {
            registry.dispatch(kind, "k", None).await;
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_receives_event() {
        let registry = HooksRegistry::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (_id, _errors, _) = registry
            .register(
                hook_fn(move |_cancel, event| {
                    let sink = Arc::clone(&sink);
                    async move {
                        sink.lock().unwrap().push(event);
                        Ok(())
                    }
                }),
                HookOptions::new(),
            )
            .await;

        registry
            .dispatch(EventKind::SetRaw, "blob", Some(Bytes::from_static(b"\x01\x02")))
            .await;
        registry.dispatch(EventKind::Delete, "blob", None).await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                HookEvent::new(EventKind::SetRaw, "blob", Some(Bytes::from_static(b"\x01\x02"))),
                HookEvent::new(EventKind::Delete, "blob", None),
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_are_buffered_up_to_capacity() {
        let registry = HooksRegistry::new();
        let (_id, mut errors, _) = registry
            .register(
                hook_fn(|_cancel, event| async move {
                    Err(AppError::hook(format!("rejected {}", event.key)))
                }),
                HookOptions::new(),
            )
            .await;

        for i in 0..(ERROR_SINK_CAPACITY + 50) {
            registry
                .dispatch(EventKind::Set, &format!("k{i}"), None)
                .await;
        }

        let drained = errors.drain();
        assert_eq!(drained.len(), ERROR_SINK_CAPACITY);
        assert_eq!(drained[0].message, "rejected k0");
        assert!(drained.iter().all(|e| e.kind == ErrorKind::Hook));
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronous_hook_delays_caller() {
        let registry = HooksRegistry::new();
        let (_id, _errors, _) = registry
            .register(sleeping(Duration::from_millis(50)), HookOptions::new())
            .await;

        let started = Instant::now();
        registry.dispatch(EventKind::Set, "k", None).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_asynchronous_hook_does_not_delay_caller() {
        let registry = HooksRegistry::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);
        let (_id, _errors, _) = registry
            .register(
                hook_fn(move |_cancel, _event| {
                    let done = Arc::clone(&done);
                    async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        done.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
                HookOptions::new().asynchronous(),
            )
            .await;

        let started = Instant::now();
        registry.dispatch(EventKind::Set, "k", None).await;
        assert!(started.elapsed() < Duration::from_millis(10));
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_deadline_exceeded() {
        let registry = HooksRegistry::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);
        let (_id, mut errors, _) = registry
            .register(
                hook_fn(move |_cancel, _event| {
                    let done = Arc::clone(&done);
                    async move {
                        // Ignores cancellation on purpose.
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        done.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
                HookOptions::new().with_timeout(Duration::from_millis(50)),
            )
            .await;

        let started = Instant::now();
        registry.dispatch(EventKind::Set, "slow", None).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(200));

        let err = errors.try_recv().expect("deadline error queued");
        assert!(err.is_deadline_exceeded());

        // The hook was not stopped and finishes in the background.
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_token() {
        let registry = HooksRegistry::new();
        let (_id, mut errors, _) = registry
            .register(
                hook_fn(|cancel, _event| async move {
                    cancel.cancelled().await;
                    Err(AppError::hook("observed cancellation"))
                }),
                HookOptions::new().with_timeout(Duration::from_millis(20)),
            )
            .await;

        registry.dispatch(EventKind::Delete, "k", None).await;
        assert!(errors.try_recv().unwrap().is_deadline_exceeded());

        // Late result after the deadline is discarded.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_hook_finishing_early_reports_its_own_result() {
        let registry = HooksRegistry::new();
        let (_id, mut errors, _) = registry
            .register(
                hook_fn(|_cancel, _event| async { Err(AppError::hook("quick failure")) }),
                HookOptions::new().with_timeout(Duration::from_secs(1)),
            )
            .await;

        let started = Instant::now();
        registry.dispatch(EventKind::Set, "k", None).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(errors.try_recv().unwrap().message, "quick failure");
    }

    #[tokio::test]
    async fn test_panicking_hook_is_reported() {
        let registry = HooksRegistry::new();
        let (_id, mut errors, _) = registry
            .register(
                hook_fn(|_cancel, _event| async {
                    if true {
                        panic!("boom");
                    }
                    Ok(())
                }),
                HookOptions::new(),
            )
            .await;

        assert_eq!(registry.dispatch(EventKind::Set, "k", None).await, 1);
        assert_eq!(errors.try_recv().unwrap().kind, ErrorKind::Hook);
    }

    #[tokio::test]
    async fn test_hook_may_register_and_unregister_during_dispatch() {
        let registry = HooksRegistry::new();
        let inner = registry.clone();
        let (_id, _errors, unregister) = registry
            .register(
                hook_fn(move |_cancel, _event| {
                    let inner = inner.clone();
                    async move {
                        let (_id, _errors, _) = inner
                            .register(
                                hook_fn(|_c, _e| async { Ok(()) }),
                                HookOptions::new().with_key_filter(KeyFilter::prefix("never:")),
                            )
                            .await;
                        Ok(())
                    }
                }),
                HookOptions::new(),
            )
            .await;

        registry.dispatch(EventKind::Set, "k", None).await;
        assert_eq!(registry.len().await, 2);

        // Unregistering from inside a running hook must not deadlock.
        let me = unregister.clone();
        let (_id, _errors, _) = registry
            .register(
                hook_fn(move |_cancel, _event| {
                    let me = me.clone();
                    async move {
                        me.call().await;
                        Ok(())
                    }
                }),
                HookOptions::new().with_event(EventKind::Delete),
            )
            .await;
        registry.dispatch(EventKind::Delete, "k", None).await;
        assert!(!registry.contains(unregister.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_during_execution_is_safe() {
        let registry = HooksRegistry::new();
        let (_id, mut errors, unregister) = registry
            .register(
                hook_fn(|_cancel, _event| async {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Err(AppError::hook("late"))
                }),
                HookOptions::new().asynchronous(),
            )
            .await;

        registry.dispatch(EventKind::Set, "k", None).await;
        unregister.call().await;

        // The in-flight hook finishes and its error is skipped.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(errors.recv().await.is_none());
    }
}
