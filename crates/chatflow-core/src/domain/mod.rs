//! Domain values: routes, messages, files, sessions, and handler returns.

mod action;
mod file;
mod message;
mod route;
mod user;

pub use action::{EndSession, RouteReturn, TransferToMenu};
pub use file::{File, FileKind};
pub use message::{
    Button, ButtonError, ButtonType, MAX_BUTTON_DETAIL, MAX_BUTTON_TITLE, Message, TextMessage,
};
pub use route::{DEFAULT_SEPARATOR, Route};
pub use user::{ChatId, Menu, SessionState, User};
