//! Capability traits defined in `kvhub-core` and implemented by other crates.

pub mod codec;
pub mod store;

pub use codec::Codec;
pub use store::{BatchStore, HealthChecker, Store};
