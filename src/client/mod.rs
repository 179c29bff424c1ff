//! Remote memory service client
//!
//! Provides the narrow interface the façade consumes, and the hosted Zep
//! implementation of it. Absent sessions and users are reported as `None`.

pub mod zep;

use crate::error::Result;
use crate::types::{Memory, Message, Session, User};
use async_trait::async_trait;

pub use zep::{ZepClient, ZepClientConfig};

/// Operations required from the remote memory service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Look up a session, `None` if it does not exist
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// Create a session owned by `user_id`
    async fn add_session(&self, session_id: &str, user_id: &str) -> Result<Session>;

    /// Append messages to a session, in order
    async fn add_messages(&self, session_id: &str, messages: &[Message]) -> Result<()>;

    /// Fetch the current memory snapshot, `None` if the session does not exist
    async fn get_memory(&self, session_id: &str) -> Result<Option<Memory>>;

    /// Look up a user, `None` if it does not exist
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
}
