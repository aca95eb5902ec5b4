//! Core type definitions used across the KvHub workspace.

pub mod id;

pub use id::*;
