//! Hook system: definitions, key filters, registry, and dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod filter;
pub mod handler;
pub mod registry;
pub mod sink;

pub use definitions::{EventKind, HookEvent, HookMode, HookOptions};
pub use filter::KeyFilter;
pub use handler::{FnHook, HookHandler, hook_fn};
pub use registry::{HooksRegistry, Unregister};
pub use sink::{ERROR_SINK_CAPACITY, HookErrors};
