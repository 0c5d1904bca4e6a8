//! Chatbot application: receiver loop and result handling.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{Message, RouteReturn, SessionState};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::ports::{Executor, Inbound, MessageReceiver};

/// The dispatcher: owns the engine, the message receiver, and the
/// executor, and drives the per-message pipeline.
pub struct ChatbotApp<Obs> {
    engine: Engine<Obs>,
    receiver: Box<dyn MessageReceiver<Obs>>,
    executor: Arc<dyn Executor>,
}

impl<Obs: Clone + Send + 'static> ChatbotApp<Obs> {
    pub fn new(
        engine: Engine<Obs>,
        receiver: impl MessageReceiver<Obs> + 'static,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            engine,
            receiver: Box::new(receiver),
            executor,
        }
    }

    /// The engine, for registrations before [`start`](Self::start).
    pub fn engine_mut(&mut self) -> &mut Engine<Obs> {
        &mut self.engine
    }

    /// Validate the registry, then consume messages until the receiver
    /// closes. Per-message failures are logged and do not stop the loop.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        self.engine.validate().inspect_err(|err| {
            error!(error = %err, "route validation failed");
        })?;

        info!("consuming messages");
        loop {
            let Some(Inbound { state, message }) = self.receiver.recv().await else {
                break;
            };

            if let Err(err) = self.handle_message(state, message).await {
                error!(error = %err, "failed to handle message");
            }
        }

        warn!("message stream closed, shutting down");
        Ok(())
    }

    /// Run one message through the engine and translate the return into
    /// executor side effects.
    ///
    /// Redirects re-enter the pipeline in the same turn with the target
    /// appended to the route history, so runaway redirect chains converge
    /// on the engine's loop guard. Executor failures are logged, never
    /// retried.
    pub async fn handle_message(
        &self,
        mut state: SessionState<Obs>,
        message: Message,
    ) -> Result<(), EngineError> {
        loop {
            let returned = self
                .engine
                .execute(state.clone(), message.clone(), self.executor.clone())
                .await?;

            match returned {
                RouteReturn::Redirect(target) => {
                    if let Err(err) = self.executor.set_route(&state.chat_id, &target).await {
                        error!(chat = ?state.chat_id, error = %err, "failed to set redirect route");
                    }
                    state.route = state.route.next(target);
                }
                RouteReturn::NextRoute(route) => {
                    if let Err(err) = self
                        .executor
                        .set_route(&state.chat_id, route.current())
                        .await
                    {
                        error!(chat = ?state.chat_id, error = %err, "failed to set next route");
                    }
                    return Ok(());
                }
                RouteReturn::EndSession(end) => {
                    if let Err(err) = self.executor.end_session(&state.chat_id, &end.id).await {
                        error!(chat = ?state.chat_id, error = %err, "failed to end session");
                    }
                    return Ok(());
                }
                RouteReturn::TransferToMenu(transfer) => {
                    if let Err(err) = self
                        .executor
                        .transfer_to_menu(&state.chat_id, &transfer, &message)
                        .await
                    {
                        error!(chat = ?state.chat_id, error = %err, "failed to transfer to menu");
                    }
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, Route};
    use crate::engine::{ChatContext, RouteTrigger};
    use crate::testkit::{Action, CapturingExecutor};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestObs {
        value: String,
    }

    struct ChannelReceiver {
        rx: mpsc::Receiver<Inbound<TestObs>>,
    }

    #[async_trait]
    impl MessageReceiver<TestObs> for ChannelReceiver {
        async fn recv(&mut self) -> Option<Inbound<TestObs>> {
            self.rx.recv().await
        }
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

    fn create_test_app(engine: Engine<TestObs>) -> (ChatbotApp<TestObs>, Arc<CapturingExecutor>) {
        let executor = Arc::new(CapturingExecutor::new());
        let (_tx, rx) = mpsc::channel(1);
        let app = ChatbotApp::new(engine, ChannelReceiver { rx }, executor.clone());
        (app, executor)
    }

    #[tokio::test]
    async fn test_next_route_sets_route() {
        let mut engine = Engine::new();
        engine.register("start", |ctx: ChatContext<TestObs>| async move {
            Some(RouteReturn::NextRoute(ctx.next_route("menu")))
        });
        let (app, executor) = create_test_app(engine);

        app.handle_message(create_test_state("start"), Message::from_text("hi"))
            .await
            .unwrap();

        assert_eq!(
            executor.actions().await,
            vec![Action::SetRoute("menu".into())]
        );
    }

    #[tokio::test]
    async fn test_redirect_executes_target_in_same_turn() {
        let mut engine = Engine::new();
        engine.register("start", |_ctx: ChatContext<TestObs>| async move {
            Some(RouteReturn::redirect("menu"))
        });
        engine.register("menu", |ctx: ChatContext<TestObs>| async move {
            ctx.send_text_message("You are here").await.ok();
            Some(RouteReturn::NextRoute(ctx.next_route("menu_wait")))
        });
        let (app, executor) = create_test_app(engine);

        app.handle_message(create_test_state("start"), Message::from_text("hi"))
            .await
            .unwrap();

        let actions = executor.actions().await;
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], Action::SetRoute("menu".into()));
        assert!(matches!(actions[1], Action::SendMessage(_)));
        assert_eq!(actions[2], Action::SetRoute("menu_wait".into()));
    }

    #[tokio::test]
    async fn test_self_redirect_converges_on_loop_guard() {
        let mut engine = Engine::new();
        engine.register("a", |_ctx: ChatContext<TestObs>| async move {
            Some(RouteReturn::redirect("a"))
        });
        engine.register("loop_route", |ctx: ChatContext<TestObs>| async move {
            Some(RouteReturn::NextRoute(ctx.next_route("start")))
        });
        let (app, executor) = create_test_app(engine);

        app.handle_message(create_test_state("a"), Message::from_text("hi"))
            .await
            .unwrap();

        let actions = executor.actions().await;
        // Each redirect appends "a" until the guard fires and the loop
        // fallback takes over.
        assert!(actions.contains(&Action::SetRoute("loop_route".into())));
        assert_eq!(actions.last(), Some(&Action::SetRoute("start".into())));
        assert_eq!(
            actions
                .iter()
                .filter(|action| **action == Action::SetRoute("a".into()))
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn test_trigger_redirect_spans_dispatch() {
        let mut engine = Engine::new();
        engine.register("start", |ctx: ChatContext<TestObs>| async move {
            ctx.send_text_message("never sent").await.ok();
            None
        });
        engine.register("help", |ctx: ChatContext<TestObs>| async move {
            ctx.send_text_message("Here to help").await.ok();
            None
        });
        engine.register_trigger(RouteTrigger::new("^help$", "help"));
        let (app, executor) = create_test_app(engine);

        app.handle_message(create_test_state("start"), Message::from_text("help"))
            .await
            .unwrap();

        let actions = executor.actions().await;
        assert_eq!(actions[0], Action::SetRoute("help".into()));
        match &actions[1] {
            Action::SendMessage(message) => assert_eq!(message.text.detail, "Here to help"),
            other => panic!("expected SendMessage, got {:?}", other),
        }
        // The help handler stayed on its route.
        assert_eq!(actions[2], Action::SetRoute("help".into()));
    }

    #[tokio::test]
    async fn test_engine_error_propagates() {
        let engine: Engine<TestObs> = Engine::new();
        let (app, executor) = create_test_app(engine);

        let result = app
            .handle_message(create_test_state("nowhere"), Message::from_text("hi"))
            .await;

        assert!(matches!(result, Err(EngineError::RouteNotFound(_))));
        assert!(executor.actions().await.is_empty());
    }

    #[tokio::test]
    async fn test_start_fails_on_invalid_registry() {
        let engine: Engine<TestObs> = Engine::new();
        let (mut app, _executor) = create_test_app(engine);

        assert!(matches!(
            app.start().await,
            Err(EngineError::MissingRequiredRoute(_))
        ));
    }

    #[tokio::test]
    async fn test_start_consumes_until_stream_closes() {
        let mut engine = Engine::new();
        engine.register("start", |ctx: ChatContext<TestObs>| async move {
            Some(RouteReturn::NextRoute(ctx.next_route("menu")))
        });
        engine.register("timeout_route", |_ctx: ChatContext<TestObs>| async move {
            None
        });
        engine.register("loop_route", |_ctx: ChatContext<TestObs>| async move { None });
        engine.register("menu", |_ctx: ChatContext<TestObs>| async move { None });

        let executor = Arc::new(CapturingExecutor::new());
        let (tx, rx) = mpsc::channel(4);
        let mut app = ChatbotApp::new(engine, ChannelReceiver { rx }, executor.clone());

        tx.send(Inbound {
            state: create_test_state("start"),
            message: Message::from_text("one"),
        })
        .await
        .unwrap();
        tx.send(Inbound {
            state: create_test_state("start"),
            message: Message::from_text("two"),
        })
        .await
        .unwrap();
        drop(tx);

        app.start().await.unwrap();

        assert_eq!(
            executor.actions().await,
            vec![
                Action::SetRoute("menu".into()),
                Action::SetRoute("menu".into()),
            ]
        );
    }
}
