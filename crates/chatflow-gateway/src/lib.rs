//! Gateway adapters for the chatflow engine.
//!
//! Connects the engine's trait seams to the outside world: the broker
//! envelope format and channel-fed receiver on the inbound side, the
//! HTTP/JSON action client on the outbound side.
//!
//! # Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatflow_core::{ChatbotApp, Engine};
//! use chatflow_gateway::{ActionClient, EnvelopeReceiver, GatewayConfig};
//! use tokio::sync::mpsc;
//!
//! # #[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
//! # struct Obs;
//! # async fn wire(engine: Engine<Obs>) -> anyhow::Result<()> {
//! let config = GatewayConfig::from_env()?;
//!
//! // The broker transport pushes raw payload frames into this channel.
//! let (frames_tx, frames_rx) = mpsc::channel(64);
//! # let _ = frames_tx;
//! let receiver = EnvelopeReceiver::<Obs>::new(frames_rx);
//!
//! let client = Arc::new(ActionClient::new(
//!     config.action_api_url,
//!     config.action_api_user,
//!     config.action_api_password,
//! ));
//!
//! let mut app = ChatbotApp::new(engine, receiver, client);
//! app.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dto;
pub mod envelope;
pub mod receiver;

pub use client::ActionClient;
pub use config::GatewayConfig;
pub use envelope::{EnvelopeError, QueueEnvelope, decode};
pub use receiver::EnvelopeReceiver;
