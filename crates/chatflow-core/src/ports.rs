//! Trait seams toward the outside world.
//!
//! The engine produces side effects only through an [`Executor`] and
//! consumes messages only through a [`MessageReceiver`]. Implementations
//! live in adapter crates (or in [`crate::testkit`] for tests).

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ChatId, File, Message, SessionState, TransferToMenu};

/// Sink for all outbound actions.
///
/// Each call is synchronous from the caller's view; retries are the
/// implementation's concern. Implementations must be safe for concurrent
/// use, as handler tasks share one executor.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Deliver a message to the chat.
    async fn send_message(&self, chat_id: &ChatId, message: &Message, platform: &str)
    -> Result<()>;

    /// Persist the observation (already JSON-encoded) for the chat.
    async fn set_observation(&self, chat_id: &ChatId, observation: &str) -> Result<()>;

    /// Persist the route the next message will be dispatched against.
    async fn set_route(&self, chat_id: &ChatId, route: &str) -> Result<()>;

    /// Terminate the session.
    async fn end_session(&self, chat_id: &ChatId, action_id: &str) -> Result<()>;

    /// Hand the conversation off to another menu.
    async fn transfer_to_menu(
        &self,
        chat_id: &ChatId,
        transfer: &TransferToMenu,
        message: &Message,
    ) -> Result<()>;

    /// Upload a file from a local path.
    async fn upload_file(&self, path: &Path) -> Result<File>;

    /// Fetch a file by its identifier.
    async fn get_file(&self, file_id: &str) -> Result<File>;
}

/// One inbound unit of work: the session it belongs to and the message.
#[derive(Debug, Clone)]
pub struct Inbound<Obs> {
    pub state: SessionState<Obs>,
    pub message: Message,
}

/// Source of session/message pairs.
///
/// Implementations own the transport (connection, reconnection,
/// deserialization). Returning `None` signals shutdown.
#[async_trait]
pub trait MessageReceiver<Obs>: Send {
    async fn recv(&mut self) -> Option<Inbound<Obs>>;
}
