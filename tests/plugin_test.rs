//! Integration tests for the plugin provider and tools over HTTP

mod common;

use common::{spawn_mock_zep, FakeZep, TEST_API_KEY};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use zep_memory::plugin::{Credentials, ToolParameters, ZepConnector, PROBE_USER_ID};
use zep_memory::{MemoryError, ZepMemoryProvider};

async fn provider(fake: Arc<FakeZep>) -> ZepMemoryProvider {
    let base_url = spawn_mock_zep(fake).await;
    ZepMemoryProvider::new(Arc::new(ZepConnector {
        base_url,
        ..Default::default()
    }))
}

fn credentials(key: &str) -> Credentials {
    Credentials::from([("api_key".to_string(), key.to_string())])
}

fn params(value: serde_json::Value) -> ToolParameters {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_validate_credentials() {
    let provider = provider(FakeZep::new()).await;

    assert_ok!(provider.validate_credentials(&credentials(TEST_API_KEY)).await);

    let err = assert_err!(provider.validate_credentials(&credentials("revoked")).await);
    match err {
        MemoryError::CredentialValidation(msg) => assert!(msg.contains("invalid api key")),
        other => panic!("Expected CredentialValidation, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_validate_credentials_with_existing_probe_user() {
    let fake = FakeZep::new();
    fake.add_user(PROBE_USER_ID);
    let provider = provider(fake).await;

    assert_ok!(provider.validate_credentials(&credentials(TEST_API_KEY)).await);
}

#[tokio::test]
async fn test_add_and_get_with_caller_session() {
    let fake = FakeZep::new();
    let provider = provider(fake.clone()).await;
    let creds = credentials(TEST_API_KEY);

    let messages = provider
        .invoke(
            "add-memory",
            &creds,
            &params(json!({
                "session_id": "support-7",
                "user_id": "bob",
                "role_type": "user",
                "content": "my order is late"
            })),
        )
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].as_text(),
        "Successfully added message to memory session support-7"
    );
    assert_eq!(fake.owner("support-7").as_deref(), Some("bob"));

    let messages = provider
        .invoke("get-memory", &creds, &params(json!({"session_id": "support-7"})))
        .await
        .unwrap();
    assert_eq!(
        messages[0].as_text(),
        "Memory Context for Session support-7:\nuser: my order is late"
    );
}

#[tokio::test]
async fn test_add_memory_remote_failure_is_wrapped() {
    let provider = provider(FakeZep::new()).await;

    let err = provider
        .invoke(
            "add-memory",
            &credentials("revoked"),
            &params(json!({"session_id": "s", "role_type": "user", "content": "x"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::MemoryWrite(_)));
    assert!(err.to_string().starts_with("Error adding memory: "));
}

#[tokio::test]
async fn test_get_memory_unknown_session_is_empty() {
    let provider = provider(FakeZep::new()).await;

    let messages = provider
        .invoke("get-memory", &credentials(TEST_API_KEY), &ToolParameters::new())
        .await
        .unwrap();
    assert_eq!(messages[0].as_text(), "");
}
