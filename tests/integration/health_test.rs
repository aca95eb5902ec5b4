//! Integration tests for one-shot health and the periodic monitor.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use kvhub_client::{HealthOptions, probe_fn};
use kvhub_core::error::{AppError, ErrorKind};

use crate::helpers::memory_client;

#[tokio::test]
async fn test_health_with_failing_probe() {
    let client = memory_client();
    let cancel = CancellationToken::new();
    let checks = vec![
        probe_fn("ok", |_cancel, _client| async { Ok(()) }),
        probe_fn("db", |_cancel, _client| async {
            Err(AppError::service_unavailable("db unreachable"))
        }),
    ];

    let err = client.health(&cancel, &checks).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Health);
    assert!(err.message.starts_with("1 of 3 health checks failed"));
    assert!(err.message.contains("'db'"));
}

#[tokio::test]
async fn test_health_probe_can_use_client() {
    let client = memory_client();
    client.set("probe:key", &true).await.unwrap();

    let checks = vec![probe_fn("read-back", |_cancel, client| async move {
        match client.get::<bool>("probe:key").await? {
            Some(true) => Ok(()),
            _ => Err(AppError::health("probe key missing")),
        }
    })];

    client
        .health(&CancellationToken::new(), &checks)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_monitor_reports_until_cancelled() {
    let client = memory_client();
    let cancel = CancellationToken::new();
    let options = HealthOptions::new(Duration::from_secs(1)).with_check(probe_fn(
        "flaky",
        |_cancel, _client| async { Err(AppError::service_unavailable("down")) },
    ));

    let mut status = client.health_check(cancel.clone(), options);

    let first = status.recv().await.unwrap();
    assert_eq!(first.unwrap_err().kind, ErrorKind::Health);
    let second = status.recv().await.unwrap();
    assert!(second.is_err());

    cancel.cancel();
    while status.recv().await.is_some() {}
}
