//! KvHub Monitor: connects to the configured store, logs every write seen
//! by a hook, and reports store health until interrupted.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use kvhub_client::{Client, HealthOptions, HookOptions, hook_fn};
use kvhub_core::config::KvConfig;
use kvhub_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("KVHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match KvConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Monitor error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &KvConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: KvConfig) -> Result<(), AppError> {
    tracing::info!(
        provider = %config.store.provider,
        "Starting KvHub monitor v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = Client::from_config(&config.store).await?;

    let (hook_id, mut hook_errors, unregister) = client
        .register_hook(
            hook_fn(|_cancel, event| async move {
                tracing::info!(
                    event = %event.kind,
                    key = %event.key,
                    bytes = event.value.as_ref().map(|v| v.len()).unwrap_or(0),
                    "Key changed"
                );
                Ok(())
            }),
            HookOptions::new().asynchronous(),
        )
        .await;
    tracing::debug!(%hook_id, "Change logger registered");

    let cancel = CancellationToken::new();
    let mut status = client.health_check(cancel.clone(), HealthOptions::from_config(&config.health));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            Some(err) = hook_errors.recv() => {
                tracing::warn!(error = %err, "Change logger failed");
            }
            tick = status.recv() => match tick {
                Some(Ok(())) => tracing::info!("Store healthy"),
                Some(Err(e)) => tracing::warn!(error = %e, "Store unhealthy"),
                None => break,
            },
        }
    }

    cancel.cancel();
    unregister.call().await;
    tracing::info!("KvHub monitor stopped");
    Ok(())
}
