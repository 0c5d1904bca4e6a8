//! Conversational routing engine.
//!
//! Incoming messages, each carrying a persisted session state and a
//! navigation route, are dispatched to registered handlers keyed by the
//! current route. Handlers receive a [`ChatContext`] and return what should
//! happen next: advance the route, redirect in the same turn, end the
//! session, or transfer to another menu.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatflow_core::{ChatbotApp, ChatContext, Engine, RouteReturn, RouteTrigger};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Obs {
//!     step: u32,
//! }
//!
//! # async fn setup(receiver: impl chatflow_core::MessageReceiver<Obs> + 'static,
//! #                executor: Arc<dyn chatflow_core::Executor>) -> anyhow::Result<()> {
//! let mut engine = Engine::new();
//! engine.register("start", |ctx: ChatContext<Obs>| async move {
//!     ctx.send_text_message("Hello!").await.ok();
//!     Some(RouteReturn::NextRoute(ctx.next_route("menu")))
//! });
//! engine.register("menu", |_ctx: ChatContext<Obs>| async move { None });
//! engine.register("timeout_route", |_ctx: ChatContext<Obs>| async move { None });
//! engine.register("loop_route", |_ctx: ChatContext<Obs>| async move { None });
//! engine.register_trigger(RouteTrigger::new("^help$", "menu"));
//!
//! let mut app = ChatbotApp::new(engine, receiver, executor);
//! app.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod testkit;

pub use app::ChatbotApp;
pub use domain::{
    Button, ButtonType, ChatId, EndSession, File, FileKind, Menu, Message, Route, RouteReturn,
    SessionState, TextMessage, TransferToMenu, User,
};
pub use engine::{
    CancelScope, ChatContext, Engine, HandlerOptions, LoopLimit, ProtectedRoute, RouteHandler,
    RouteTrigger, TimeoutRoute,
};
pub use error::EngineError;
pub use ports::{Executor, Inbound, MessageReceiver};
