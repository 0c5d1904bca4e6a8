//! Handler-facing context.
//!
//! A `ChatContext` is built per invocation and handed to the route
//! handler. It carries immutable copies of the session state and message,
//! the cancellation scope, and the executor. Every side-effecting method
//! checks the scope first and returns its error without performing the
//! effect.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::domain::{File, Message, Route, SessionState, TextMessage};
use crate::ports::Executor;

use super::scope::CancelScope;

/// Per-invocation facade passed to route handlers.
pub struct ChatContext<Obs> {
    scope: CancelScope,
    state: SessionState<Obs>,
    message: Message,
    executor: Arc<dyn Executor>,
}

impl<Obs> ChatContext<Obs> {
    pub(crate) fn new(
        scope: CancelScope,
        state: SessionState<Obs>,
        message: Message,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            scope,
            state,
            message,
            executor,
        }
    }

    /// The session state this invocation runs against.
    pub fn state(&self) -> &SessionState<Obs> {
        &self.state
    }

    /// The message being processed.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The invocation's cancellation scope.
    pub fn scope(&self) -> &CancelScope {
        &self.scope
    }

    /// The current observation.
    pub fn observation(&self) -> &Obs {
        &self.state.observation
    }

    /// The current navigation route.
    pub fn route(&self) -> &Route {
        &self.state.route
    }

    /// A route value with `segment` appended, intended to be returned from
    /// the handler.
    ///
    /// On a cancelled scope the route is returned unchanged, so a
    /// cancelled handler's control flow still produces a well-typed,
    /// non-moving result.
    pub fn next_route(&self, segment: impl Into<String>) -> Route {
        if self.scope.err().is_some() {
            return self.state.route.clone();
        }
        self.state.route.next(segment)
    }

    /// Send a message to this chat.
    pub async fn send_message(&self, message: Message) -> Result<()> {
        if let Some(err) = self.scope.err() {
            return Err(err.into());
        }
        self.executor
            .send_message(&self.state.chat_id, &message, &self.state.platform)
            .await
    }

    /// Send a plain text message (detail-only).
    pub async fn send_text_message(&self, text: impl Into<String>) -> Result<()> {
        let message = Message {
            text: TextMessage {
                detail: text.into(),
                ..Default::default()
            },
            ..Default::default()
        };
        self.send_message(message).await
    }

    /// Upload a local file.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<File> {
        if let Some(err) = self.scope.err() {
            return Err(err.into());
        }
        self.executor.upload_file(path.as_ref()).await
    }

    /// Upload in-memory bytes under a filename.
    ///
    /// The bytes are written to a temporary file that preserves the
    /// extension (so the upstream service can infer the media type), then
    /// uploaded. The temporary file is removed on every exit path; a write
    /// error aborts the upload.
    pub async fn load_file_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<File> {
        if let Some(err) = self.scope.err() {
            return Err(err.into());
        }

        let (base, ext) = match file_name.rfind('.') {
            Some(pos) if pos > 0 => file_name.split_at(pos),
            _ => (file_name, ""),
        };

        // NamedTempFile removes itself on drop, covering all exit paths.
        let temp = tempfile::Builder::new()
            .prefix(&format!("{base}-"))
            .suffix(ext)
            .tempfile()
            .context("failed to create temporary upload file")?;

        tokio::fs::write(temp.path(), bytes)
            .await
            .context("failed to write temporary upload file")?;

        self.executor.upload_file(temp.path()).await
    }

    /// Fetch a file by its identifier.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        if let Some(err) = self.scope.err() {
            return Err(err.into());
        }
        self.executor.get_file(file_id).await
    }
}

impl<Obs: Serialize> ChatContext<Obs> {
    /// Serialize and persist a new observation for this chat.
    pub async fn set_observation(&self, observation: &Obs) -> Result<()> {
        if let Some(err) = self.scope.err() {
            return Err(err.into());
        }
        let encoded =
            serde_json::to_string(observation).context("failed to serialize observation")?;
        self.executor
            .set_observation(&self.state.chat_id, &encoded)
            .await
    }
}
