//! Integration tests for the KvHub client.

mod helpers;

mod client_test;
mod health_test;
mod hooks_test;
