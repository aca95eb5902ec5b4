//! Integration tests for client reads and writes.

use serde::{Deserialize, Serialize};

use kvhub_core::error::ErrorKind;

use crate::helpers::memory_client;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    age: u32,
}

#[tokio::test]
async fn test_set_and_get_typed_value() {
    let client = memory_client();
    let profile = Profile {
        name: "alice".into(),
        age: 30,
    };

    client.set("user:1", &profile).await.unwrap();

    let loaded: Option<Profile> = client.get("user:1").await.unwrap();
    assert_eq!(loaded, Some(profile));
    let missing: Option<Profile> = client.get("user:2").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_set_raw_stores_bytes_verbatim() {
    let client = memory_client();
    client
        .set_raw("blob", bytes::Bytes::from_static(b"\x00\x01not json"))
        .await
        .unwrap();

    let raw = client.get_raw("blob").await.unwrap().unwrap();
    assert_eq!(&raw[..], b"\x00\x01not json");

    let err = client.get::<serde_json::Value>("blob").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Codec);
}

#[tokio::test]
async fn test_batch_roundtrip_and_list() {
    let client = memory_client();
    client
        .batch_set(vec![("user:1", 1), ("user:2", 2), ("admin:1", 3)])
        .await
        .unwrap();

    assert_eq!(
        client.list("user:").await.unwrap(),
        vec!["user:1".to_string(), "user:2".to_string()]
    );

    let keys = vec!["user:1".to_string(), "nope".to_string()];
    let values: Vec<Option<i32>> = client.batch_get(&keys).await.unwrap();
    assert_eq!(values, vec![Some(1), None]);

    client
        .batch_delete(&["user:1".to_string(), "user:2".to_string()])
        .await
        .unwrap();
    assert!(client.list("user:").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_key_rejected() {
    let client = memory_client();
    let err = client.delete("").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
