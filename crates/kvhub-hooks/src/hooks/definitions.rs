//! Event kinds, hook events, and registration options.

use std::collections::HashSet;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::filter::KeyFilter;

/// Operation outcomes that can trigger hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A typed value was encoded and stored.
    Set,
    /// Raw bytes were stored without encoding.
    SetRaw,
    /// A key was deleted.
    Delete,
    /// A key was stored as part of a batch.
    BatchSet,
    /// A key was deleted as part of a batch.
    BatchDelete,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 5] = [
        Self::Set,
        Self::SetRaw,
        Self::Delete,
        Self::BatchSet,
        Self::BatchDelete,
    ];

    /// Returns the string name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::SetRaw => "set_raw",
            Self::Delete => "delete",
            Self::BatchSet => "batch_set",
            Self::BatchDelete => "batch_delete",
        }
    }

    /// Returns whether this event was produced by a batch operation.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::BatchSet | Self::BatchDelete)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a hook handler receives for one matched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    /// The kind of operation that succeeded.
    pub kind: EventKind,
    /// The key the operation touched.
    pub key: String,
    /// The stored bytes, for set-style events. `None` for deletes.
    pub value: Option<Bytes>,
}

impl HookEvent {
    /// Creates a new hook event.
    pub fn new(kind: EventKind, key: impl Into<String>, value: Option<Bytes>) -> Self {
        Self {
            kind,
            key: key.into(),
            value,
        }
    }
}

/// How a matched hook is executed relative to the triggering operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    /// Runs on the caller's path; the operation returns after the hook does
    /// (or after its timeout elapses).
    #[default]
    Synchronous,
    /// Runs on its own task; the operation never waits for it.
    Asynchronous,
}

/// Options controlling which operations a hook sees and how it runs.
///
/// The default matches every event kind and every key, synchronously,
/// with no timeout.
#[derive(Debug, Clone, Default)]
pub struct HookOptions {
    /// Event kinds this hook cares about. Empty means all kinds.
    pub events: HashSet<EventKind>,
    /// Key predicate. `None` means all keys.
    pub key_filter: Option<KeyFilter>,
    /// Execution mode.
    pub mode: HookMode,
    /// Deadline for synchronous hooks. Zero means unbounded.
    /// Ignored for asynchronous hooks.
    pub timeout: Duration,
}

impl HookOptions {
    /// Creates options that match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the hook to the given event kind (may be called repeatedly).
    pub fn with_event(mut self, kind: EventKind) -> Self {
        self.events.insert(kind);
        self
    }

    /// Restricts the hook to the given event kinds.
    pub fn with_events(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.events.extend(kinds);
        self
    }

    /// Restricts the hook to keys accepted by `filter`.
    pub fn with_key_filter(mut self, filter: KeyFilter) -> Self {
        self.key_filter = Some(filter);
        self
    }

    /// Sets the execution mode.
    pub fn with_mode(mut self, mode: HookMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs the hook asynchronously.
    pub fn asynchronous(self) -> Self {
        self.with_mode(HookMode::Asynchronous)
    }

    /// Bounds a synchronous hook by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns whether an operation of `kind` on `key` should trigger the hook.
    pub fn matches(&self, kind: EventKind, key: &str) -> bool {
        if !self.events.is_empty() && !self.events.contains(&kind) {
            return false;
        }
        self.key_filter
            .as_ref()
            .map(|filter| filter.matches(key))
            .unwrap_or(true)
    }
}
