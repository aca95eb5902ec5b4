//! Integration tests for hooks driven through client operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use kvhub_client::{EventKind, HookMode, HookOptions, KeyFilter, hook_fn};
use kvhub_core::error::{AppError, ErrorKind};

use crate::helpers::{Recorder, memory_client};

#[tokio::test]
async fn test_prefix_filtered_set_hook_fires_once() {
    let client = memory_client();
    let recorder = Recorder::new();

    let (_id, mut errors, _unregister) = client
        .register_hook(
            recorder.handler(),
            HookOptions::new()
                .with_event(EventKind::Set)
                .with_key_filter(KeyFilter::prefix("user:")),
        )
        .await;

    client.set("user:1", &"alice").await.unwrap();
    client.set("admin:1", &"root").await.unwrap();
    client.delete("user:1").await.unwrap();

    assert_eq!(recorder.calls(), 1);
    assert_eq!(
        recorder.events().await,
        vec![(EventKind::Set, "user:1".to_string())]
    );
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn test_hook_sees_every_event_kind() {
    let client = memory_client();
    let recorder = Recorder::new();
    let (_id, _errors, _unregister) = client
        .register_hook(recorder.handler(), HookOptions::new())
        .await;

    client.set("a", &1).await.unwrap();
    client.set_raw("b", b"raw".to_vec()).await.unwrap();
    client.delete("a").await.unwrap();
    client
        .batch_set(vec![("c", 3), ("d", 4)])
        .await
        .unwrap();
    client
        .batch_delete(&["c".to_string(), "d".to_string()])
        .await
        .unwrap();

    assert_eq!(
        recorder.events().await,
        vec![
            (EventKind::Set, "a".to_string()),
            (EventKind::SetRaw, "b".to_string()),
            (EventKind::Delete, "a".to_string()),
            (EventKind::BatchSet, "c".to_string()),
            (EventKind::BatchSet, "d".to_string()),
            (EventKind::BatchDelete, "c".to_string()),
            (EventKind::BatchDelete, "d".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unregister_through_client_is_idempotent() {
    let client = memory_client();
    let recorder = Recorder::new();
    let (id, mut errors, unregister) = client
        .register_hook(recorder.handler(), HookOptions::new())
        .await;

    client.set("k", &1).await.unwrap();
    assert!(unregister.call().await);
    assert!(!unregister.call().await);
    assert!(!client.hooks().unregister(id).await);

    client.set("k", &2).await.unwrap();
    assert_eq!(recorder.calls(), 1);
    assert!(errors.recv().await.is_none());
}

#[tokio::test]
async fn test_failing_hook_does_not_fail_operation() {
    let client = memory_client();
    let (_id, mut errors, _unregister) = client
        .register_hook(
            hook_fn(|_cancel, event| async move {
                Err(AppError::hook(format!("rejected {}", event.key)))
            }),
            HookOptions::new(),
        )
        .await;

    client.set("k", &"v").await.unwrap();
    let stored: Option<String> = client.get("k").await.unwrap();
    assert_eq!(stored.as_deref(), Some("v"));

    let err = errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Hook);
    assert!(err.message.contains("rejected k"));
}

#[tokio::test(start_paused = true)]
async fn test_sync_hook_delays_caller() {
    let client = memory_client();
    let (_id, _errors, _unregister) = client
        .register_hook(
            hook_fn(|_cancel, _event| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            }),
            HookOptions::new().with_mode(HookMode::Synchronous),
        )
        .await;

    let start = Instant::now();
    client.set("k", &1).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_async_hook_does_not_delay_caller() {
    let client = memory_client();
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&finished);
    let (_id, _errors, _unregister) = client
        .register_hook(
            hook_fn(move |_cancel, _event| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            HookOptions::new().asynchronous(),
        )
        .await;

    let start = Instant::now();
    client.set("k", &1).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(10));
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_hook_reports_deadline() {
    let client = memory_client();
    let (_id, mut errors, _unregister) = client
        .register_hook(
            hook_fn(|_cancel, _event| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }),
            HookOptions::new().with_timeout(Duration::from_millis(20)),
        )
        .await;

    let start = Instant::now();
    client.set("k", &1).await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(200));

    let err = errors.recv().await.unwrap();
    assert!(err.is_deadline_exceeded());
}

#[tokio::test]
async fn test_hooks_skip_failed_operations() {
    let client = memory_client();
    let recorder = Recorder::new();
    let (_id, _errors, _unregister) = client
        .register_hook(recorder.handler(), HookOptions::new())
        .await;

    let err = client.set("", &1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(recorder.calls(), 0);
}
