//! Plugin provider: credential validation and tool lookup

use super::tools::{AddMemoryTool, GetMemoryTool, PluginTool};
use super::{BackendConnector, Credentials, ToolInvokeMessage, ToolParameters, ZepConnector};
use crate::error::{MemoryError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// User looked up to prove the API key works; it need not exist
pub const PROBE_USER_ID: &str = "auth-check-dify-plugin";

/// Provider for the Zep memory plugin tools
pub struct ZepMemoryProvider {
    connector: Arc<dyn BackendConnector>,
    tools: Vec<Box<dyn PluginTool>>,
}

impl Default for ZepMemoryProvider {
    fn default() -> Self {
        Self::new(Arc::new(ZepConnector::default()))
    }
}

impl ZepMemoryProvider {
    pub fn new(connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            connector,
            tools: vec![Box::new(AddMemoryTool), Box::new(GetMemoryTool)],
        }
    }

    /// Names of the registered tools
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Check that `api_key` is present and accepted by the remote service
    ///
    /// A "user not found" answer to the probe still proves the key is valid.
    pub async fn validate_credentials(&self, credentials: &Credentials) -> Result<()> {
        let api_key = match credentials.get("api_key") {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(MemoryError::CredentialValidation(
                    "api_key is required".to_string(),
                ))
            }
        };

        let backend = self
            .connector
            .connect(api_key)
            .map_err(|e| MemoryError::CredentialValidation(e.to_string()))?;

        match backend.get_user(PROBE_USER_ID).await {
            Ok(user) => {
                debug!("Credential probe found user: {}", user.is_some());
                info!("Zep credentials validated");
                Ok(())
            }
            Err(e) => {
                warn!("Credential validation failed: {}", e);
                Err(MemoryError::CredentialValidation(e.to_string()))
            }
        }
    }

    /// Invoke a tool by name with the caller's credentials
    pub async fn invoke(
        &self,
        tool_name: &str,
        credentials: &Credentials,
        params: &ToolParameters,
    ) -> Result<Vec<ToolInvokeMessage>> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == tool_name)
            .ok_or_else(|| MemoryError::UnknownTool(tool_name.to_string()))?;

        let api_key = credentials.get("api_key").map(String::as_str).unwrap_or_default();
        let backend = self.connector.connect(api_key)?;

        tool.invoke(backend, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryBackend, MockMemoryBackend};
    use crate::types::User;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    /// Hands out one prepared backend
    struct OnceConnector {
        backend: Mutex<Option<Arc<dyn MemoryBackend>>>,
    }

    impl OnceConnector {
        fn new(backend: MockMemoryBackend) -> Arc<Self> {
            Arc::new(Self {
                backend: Mutex::new(Some(Arc::new(backend))),
            })
        }
    }

    impl BackendConnector for OnceConnector {
        fn connect(&self, _api_key: &str) -> Result<Arc<dyn MemoryBackend>> {
            self.backend
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| MemoryError::Configuration("already connected".to_string()))
        }
    }

    fn credentials(key: &str) -> Credentials {
        Credentials::from([("api_key".to_string(), key.to_string())])
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let provider = ZepMemoryProvider::new(OnceConnector::new(MockMemoryBackend::new()));

        let err = provider
            .validate_credentials(&Credentials::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Credential validation failed: api_key is required");

        let err = provider.validate_credentials(&credentials("")).await.unwrap_err();
        assert!(matches!(err, MemoryError::CredentialValidation(_)));
    }

    #[tokio::test]
    async fn test_probe_user_not_found_is_valid() {
        let mut backend = MockMemoryBackend::new();
        backend
            .expect_get_user()
            .with(eq(PROBE_USER_ID))
            .times(1)
            .returning(|_| Ok(None));

        let provider = ZepMemoryProvider::new(OnceConnector::new(backend));
        provider.validate_credentials(&credentials("z_key")).await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_user_found_is_valid() {
        let mut backend = MockMemoryBackend::new();
        backend.expect_get_user().returning(|id| {
            Ok(Some(User {
                user_id: id.to_string(),
            }))
        });

        let provider = ZepMemoryProvider::new(OnceConnector::new(backend));
        assert!(provider.validate_credentials(&credentials("z_key")).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_failure_carries_message() {
        let mut backend = MockMemoryBackend::new();
        backend.expect_get_user().returning(|_| {
            Err(MemoryError::RemoteFailure {
                status: 401,
                message: "invalid api key".to_string(),
            })
        });

        let provider = ZepMemoryProvider::new(OnceConnector::new(backend));
        match provider.validate_credentials(&credentials("bad")).await {
            Err(MemoryError::CredentialValidation(msg)) => assert!(msg.contains("invalid api key")),
            other => panic!("Expected CredentialValidation, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let provider = ZepMemoryProvider::new(OnceConnector::new(MockMemoryBackend::new()));
        let err = provider
            .invoke("zep-memory", &credentials("k"), &ToolParameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::UnknownTool(_)));
        assert_eq!(provider.tool_names(), vec!["add-memory", "get-memory"]);
    }
}
