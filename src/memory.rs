//! Memory façade over the remote client
//!
//! Adds the "ensure session exists" rule in front of every append and renders
//! results as text for the tool surfaces.

use crate::client::MemoryBackend;
use crate::error::{MemoryError, Result};
use crate::types::{MemoryData, Message, RoleType, SessionKey};
use std::sync::Arc;
use tracing::{debug, info};

/// Session-aware wrapper around a [`MemoryBackend`]
#[derive(Clone)]
pub struct MemoryFacade {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryFacade {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    /// Create the session if the remote service does not know it
    ///
    /// Existing sessions are left untouched, whoever owns them.
    pub async fn ensure_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        if self.backend.get_session(session_id).await?.is_some() {
            debug!("Session {} already exists", session_id);
            return Ok(());
        }

        self.backend.add_session(session_id, user_id).await?;
        info!("Created session {} for user {}", session_id, user_id);
        Ok(())
    }

    /// Append one message, returning a confirmation text
    pub async fn add_message(
        &self,
        session: &SessionKey,
        role_type: &str,
        content: &str,
    ) -> Result<String> {
        let role: RoleType = role_type.parse()?;

        self.ensure_session(&session.session_id, &session.user_id)
            .await?;
        self.backend
            .add_messages(&session.session_id, &[Message::new(role, content)])
            .await?;

        debug!("Added {} message to session {}", role, session.session_id);

        let data = MemoryData::with_message(
            session.session_id.clone(),
            format!(
                "Successfully added message to memory session {}",
                session.session_id
            ),
        );
        Ok(data.to_text())
    }

    /// Fetch the memory context for a session
    ///
    /// Returns `Ok(None)` when the session does not exist yet.
    pub async fn get_memory(&self, session_id: &str) -> Result<Option<MemoryData>> {
        match self.backend.get_memory(session_id).await {
            Ok(Some(memory)) => Ok(Some(MemoryData::with_context(session_id, memory.context))),
            Ok(None) => {
                debug!("No memory yet for session {}", session_id);
                Ok(None)
            }
            Err(e) => Err(MemoryError::MemoryRetrieval(e.to_string())),
        }
    }

    /// Fetch the memory context rendered as text, empty when there is none
    pub async fn get_memory_text(&self, session_id: &str) -> Result<String> {
        Ok(self
            .get_memory(session_id)
            .await?
            .map(|data| data.to_text())
            .unwrap_or_default())
    }
}
