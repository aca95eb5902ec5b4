//! # kvhub-hooks
//!
//! Event hooks for KvHub clients. Provides:
//!
//! - Registration with event-kind and key filters (prefix, suffix, set, regex)
//! - Synchronous hooks with optional timeout, and fire-and-forget asynchronous hooks
//! - A bounded, best-effort error stream per hook
//! - Snapshot-then-execute dispatch, so hooks may register or unregister hooks

pub mod hooks;

pub use hooks::definitions::{EventKind, HookEvent, HookMode, HookOptions};
pub use hooks::filter::KeyFilter;
pub use hooks::handler::{FnHook, HookHandler, hook_fn};
pub use hooks::registry::{HooksRegistry, Unregister};
pub use hooks::sink::{ERROR_SINK_CAPACITY, HookErrors};
