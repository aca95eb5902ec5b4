//! # kvhub-client
//!
//! Key-value client for KvHub. Wraps a store backend and a value codec and
//! adds two extension points:
//!
//! - **Hooks**: callbacks run after successful `set`, `set_raw`, `delete`,
//!   `batch_set`, and `batch_delete` calls (see [`kvhub_hooks`])
//! - **Health**: one-shot aggregated probes and a cancellable periodic monitor

pub mod client;
pub mod codec;
pub mod health;

pub use client::Client;
pub use codec::JsonCodec;
pub use health::{
    DEFAULT_HEALTH_INTERVAL, FnProbe, HealthFunc, HealthOptions, HealthProbe, HealthStatus,
    probe_fn,
};
pub use kvhub_hooks::{
    EventKind, HookErrors, HookEvent, HookHandler, HookMode, HookOptions, KeyFilter, Unregister,
    hook_fn,
};
