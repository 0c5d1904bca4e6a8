//! Handler return values.

use super::route::Route;

/// Terminates the conversation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSession {
    /// Identifier of the end action to report upstream.
    pub id: String,
}

impl EndSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Hands the conversation off to another menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferToMenu {
    pub menu_id: i64,
    /// Route the user lands on inside the target menu.
    pub route: String,
}

/// What a route handler decided.
///
/// Handlers return `Option<RouteReturn>`; `None` means "stay on the
/// current route" and is resolved by the engine before it reaches the
/// dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteReturn {
    /// Advance to a new current route; the handler for it runs on the
    /// user's next message.
    NextRoute(Route),
    /// Execute the target route's handler immediately, in the same turn.
    Redirect(String),
    /// End the session.
    EndSession(EndSession),
    /// Transfer to another menu.
    TransferToMenu(TransferToMenu),
}

impl RouteReturn {
    /// Convenience constructor for a redirect.
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::Redirect(target.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_constructor() {
        assert_eq!(
            RouteReturn::redirect("help"),
            RouteReturn::Redirect("help".to_string())
        );
    }
}
