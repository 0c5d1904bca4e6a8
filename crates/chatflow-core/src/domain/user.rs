//! Session identity and state.
//!
//! `SessionState` is generic over the observation payload `Obs`, the
//! deployment-defined structured data carried across messages of one
//! session. The engine treats it as opaque; handlers read and replace it
//! through the context.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::route::Route;

/// Identifies a chat by the (user, company) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChatId {
    pub user_id: String,
    pub company_id: String,
}

impl ChatId {
    pub fn new(user_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: company_id.into(),
        }
    }

    /// A valid identifier needs both halves.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_empty() || self.company_id.is_empty()
    }
}

/// User identity data persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// National taxpayer registry number.
    pub cpf: String,
    /// Set when the user has authenticated.
    pub authorization_code: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl User {
    pub fn is_empty(&self) -> bool {
        self == &User::default()
    }
}

/// Menu context the session is currently attached to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Menu {
    pub fn is_empty(&self) -> bool {
        self.id < 1
    }
}

/// The complete state of one chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState<Obs> {
    pub session_id: i64,
    pub chat_id: ChatId,
    pub user: User,
    pub menu: Menu,
    /// Navigation history; drives handler resolution.
    pub route: Route,
    /// True for inbound messages.
    pub direction_in: bool,
    /// Deployment-defined session data.
    pub observation: Obs,
    /// Messaging platform tag (e.g. "whatsapp").
    pub platform: String,
    pub last_update: String,
    pub dt_created: String,
}

impl<Obs> SessionState<Obs> {
    pub fn is_empty(&self) -> bool {
        self.chat_id.is_empty()
    }
}

impl<Obs: DeserializeOwned> SessionState<Obs> {
    /// Replace the observation by deserializing its wire (JSON string)
    /// form.
    pub fn load_observation(&mut self, observation: &str) -> Result<(), serde_json::Error> {
        self.observation = serde_json::from_str(observation)?;
        Ok(())
    }
}
