//! Test harness: capturing executor and assertion helper.
//!
//! `CapturingExecutor` records every action a handler performs;
//! `EngineHarness` runs the engine against one and asserts the captured
//! sequence plus the final return. Session-terminating calls fail with a
//! distinct error so tests catch accidental exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatId, File, Message, RouteReturn, SessionState, TransferToMenu};
use crate::engine::Engine;
use crate::ports::Executor;

/// Error message raised when a test handler ends the session.
pub const PREMATURE_END: &str = "session ended prematurely during testing";
/// Error message raised when a test handler transfers the session.
pub const PREMATURE_TRANSFER: &str = "session transferred prematurely during testing";

/// One recorded side effect, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendMessage(Message),
    SetObservation(String),
    SetRoute(String),
    UploadFile(PathBuf),
    GetFile(String),
}

/// Executor that records actions instead of performing them.
#[derive(Default)]
pub struct CapturingExecutor {
    actions: Mutex<Vec<Action>>,
}

impl CapturingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded actions, in order.
    pub async fn actions(&self) -> Vec<Action> {
        self.actions.lock().await.clone()
    }

    /// Drop all recorded actions.
    pub async fn clear(&self) {
        self.actions.lock().await.clear();
    }

    async fn record(&self, action: Action) {
        self.actions.lock().await.push(action);
    }
}

#[async_trait]
impl Executor for CapturingExecutor {
    async fn send_message(
        &self,
        _chat_id: &ChatId,
        message: &Message,
        _platform: &str,
    ) -> Result<()> {
        self.record(Action::SendMessage(message.clone())).await;
        Ok(())
    }

    async fn set_observation(&self, _chat_id: &ChatId, observation: &str) -> Result<()> {
        self.record(Action::SetObservation(observation.to_string()))
            .await;
        Ok(())
    }

    async fn set_route(&self, _chat_id: &ChatId, route: &str) -> Result<()> {
        self.record(Action::SetRoute(route.to_string())).await;
        Ok(())
    }

    async fn end_session(&self, _chat_id: &ChatId, _action_id: &str) -> Result<()> {
        bail!(PREMATURE_END)
    }

    async fn transfer_to_menu(
        &self,
        _chat_id: &ChatId,
        _transfer: &TransferToMenu,
        _message: &Message,
    ) -> Result<()> {
        bail!(PREMATURE_TRANSFER)
    }

    async fn upload_file(&self, path: &Path) -> Result<File> {
        self.record(Action::UploadFile(path.to_path_buf())).await;
        Ok(File {
            id: "test-id".into(),
            url: "test-url".into(),
            name: path.to_string_lossy().into_owned(),
            ..Default::default()
        })
    }

    async fn get_file(&self, file_id: &str) -> Result<File> {
        self.record(Action::GetFile(file_id.to_string())).await;
        Ok(File {
            id: file_id.to_string(),
            url: "test-url".into(),
            name: "test".into(),
            ..Default::default()
        })
    }
}

/// Assertion helper over engine executions.
pub struct EngineHarness<Obs> {
    engine: Engine<Obs>,
}

impl<Obs: Send + 'static> EngineHarness<Obs> {
    pub fn new(engine: Engine<Obs>) -> Self {
        Self { engine }
    }

    /// The wrapped engine, for registrations after construction.
    pub fn engine_mut(&mut self) -> &mut Engine<Obs> {
        &mut self.engine
    }

    /// Execute and return whatever happened, for free-form asserts.
    pub async fn run(
        &self,
        state: SessionState<Obs>,
        message: Message,
    ) -> (Result<RouteReturn, crate::error::EngineError>, Vec<Action>) {
        let executor = Arc::new(CapturingExecutor::new());
        let result = self.engine.execute(state, message, executor.clone()).await;
        (result, executor.actions().await)
    }

    /// Execute and assert the captured action sequence (positional, by
    /// kind and payload) and the final return.
    ///
    /// # Panics
    ///
    /// Panics on execution error or on any mismatch; intended for tests.
    pub async fn execute_expecting(
        &self,
        state: SessionState<Obs>,
        message: Message,
        expected_actions: &[Action],
        expected_return: &RouteReturn,
    ) {
        let (result, actions) = self.run(state, message).await;
        let returned = match result {
            Ok(returned) => returned,
            Err(err) => panic!("execute returned error: {err}"),
        };

        assert_eq!(
            actions, expected_actions,
            "captured actions differ from expected"
        );
        assert_eq!(
            &returned, expected_return,
            "engine return differs from expected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Route;
    use crate::engine::ChatContext;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestObs {
        value: String,
    }

    fn create_test_state(route: &str) -> SessionState<TestObs> {
        SessionState {
            session_id: 1,
            chat_id: ChatId::new("user-1", "company-1"),
            user: Default::default(),
            menu: Default::default(),
            route: Route::parse(route, '/'),
            direction_in: true,
            observation: TestObs::default(),
            platform: "whatsapp".into(),
            last_update: String::new(),
            dt_created: String::new(),
        }
    }

    #[tokio::test]
    async fn test_capturing_executor_records_in_order() {
        let executor = CapturingExecutor::new();
        let chat = ChatId::new("u", "c");

        executor
            .send_message(&chat, &Message::from_text("a"), "whatsapp")
            .await
            .unwrap();
        executor.set_route(&chat, "menu").await.unwrap();
        executor.get_file(&chat.user_id).await.unwrap();

        let actions = executor.actions().await;
        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], Action::SendMessage(_)));
        assert_eq!(actions[1], Action::SetRoute("menu".into()));
        assert_eq!(actions[2], Action::GetFile("u".into()));
    }

    #[tokio::test]
    async fn test_premature_termination_errors() {
        let executor = CapturingExecutor::new();
        let chat = ChatId::new("u", "c");

        let end = executor.end_session(&chat, "done").await;
        assert_eq!(end.unwrap_err().to_string(), PREMATURE_END);

        let transfer = executor
            .transfer_to_menu(
                &chat,
                &TransferToMenu {
                    menu_id: 2,
                    route: "start".into(),
                },
                &Message::from_text("bye"),
            )
            .await;
        assert_eq!(transfer.unwrap_err().to_string(), PREMATURE_TRANSFER);
    }

    #[tokio::test]
    async fn test_harness_happy_path() {
        let mut engine = Engine::new();
        engine.register("start", |ctx: ChatContext<TestObs>| async move {
            ctx.send_text_message("Hi").await.ok();
            Some(RouteReturn::NextRoute(ctx.next_route("menu")))
        });
        let harness = EngineHarness::new(engine);

        harness
            .execute_expecting(
                create_test_state("start"),
                Message::from_text("hello"),
                &[Action::SendMessage(Message::from_text("Hi"))],
                &RouteReturn::NextRoute(Route::parse("start/menu", '/')),
            )
            .await;
    }

    #[tokio::test]
    #[should_panic(expected = "captured actions differ")]
    async fn test_harness_flags_unexpected_actions() {
        let mut engine = Engine::new();
        engine.register("start", |ctx: ChatContext<TestObs>| async move {
            ctx.send_text_message("surprise").await.ok();
            None
        });
        let harness = EngineHarness::new(engine);

        harness
            .execute_expecting(
                create_test_state("start"),
                Message::from_text("hello"),
                &[],
                &RouteReturn::NextRoute(Route::parse("start/start", '/')),
            )
            .await;
    }
}
