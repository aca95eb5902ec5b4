//! # kvhub-store
//!
//! Store backends for KvHub:
//!
//! - **memory**: in-process store using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! Both provide the base, batch, and health capabilities. The backend is
//! selected at runtime by [`StoreManager`].

pub mod manager;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use manager::StoreManager;
