//! Error types for the routing engine.

use thiserror::Error;

/// Engine error types.
///
/// Configuration variants are produced by [`Engine::validate`] before the
/// app starts; the runtime variants come out of `execute`.
///
/// [`Engine::validate`]: crate::engine::Engine::validate
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("required route '{0}' is not registered")]
    MissingRequiredRoute(String),

    #[error("trigger route '{route}' (regex: {regex}) is not registered")]
    DanglingTriggerRoute { route: String, regex: String },

    #[error("trigger route '{route}' in route '{handler}' (regex: {regex}) is not registered")]
    DanglingHandlerTriggerRoute {
        handler: String,
        route: String,
        regex: String,
    },

    #[error("fallback route '{0}' from default options is not registered")]
    DanglingFallbackRoute(String),

    #[error("handler deadline exceeded")]
    DeadlineExceeded,

    #[error("handler cancelled: {0}")]
    Cancelled(String),

    #[error("handler for route '{0}' terminated without a result")]
    HandlerFailed(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
