//! Handler execution options.

use std::time::Duration;

/// Route redirected to when a handler exceeds its deadline.
pub const DEFAULT_TIMEOUT_ROUTE: &str = "timeout_route";
/// Route redirected to when the loop guard fires.
pub const DEFAULT_LOOP_ROUTE: &str = "loop_route";
/// Default handler deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default consecutive-repeat limit before the loop guard fires.
pub const DEFAULT_LOOP_COUNT: usize = 3;

/// Deadline configuration for handler execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutRoute {
    /// Maximum duration the handler may run.
    pub duration: Duration,
    /// Route redirected to when the deadline expires.
    pub route: String,
}

impl Default for TimeoutRoute {
    fn default() -> Self {
        Self {
            duration: DEFAULT_TIMEOUT,
            route: DEFAULT_TIMEOUT_ROUTE.to_string(),
        }
    }
}

/// Loop protection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopLimit {
    /// Maximum consecutive executions of the same route.
    pub count: usize,
    /// Route redirected to when the limit is exceeded.
    pub route: String,
}

impl Default for LoopLimit {
    fn default() -> Self {
        Self {
            count: DEFAULT_LOOP_COUNT,
            route: DEFAULT_LOOP_ROUTE.to_string(),
        }
    }
}

/// Access protection configuration.
///
/// Only consulted when the engine carries a protection predicate; see
/// [`Engine::set_protection_predicate`](crate::engine::Engine::set_protection_predicate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoute {
    /// Route redirected to when access is denied.
    pub route: String,
}

/// A pattern-based pre-emption rule.
///
/// When the message text matches `regex`, dispatch is redirected to
/// `route` before the current handler runs. Useful for global commands
/// like "help" or "cancel".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTrigger {
    /// Regular expression matched against the message's entire text.
    pub regex: String,
    /// Target route on match.
    pub route: String,
}

impl RouteTrigger {
    pub fn new(regex: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            route: route.into(),
        }
    }
}

/// Behavior and constraints for handler execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    pub timeout: Option<TimeoutRoute>,
    pub loop_limit: Option<LoopLimit>,
    pub protected: Option<ProtectedRoute>,
    /// Per-route triggers. Validated at startup; reserved for route-scoped
    /// pre-emption.
    pub triggers: Vec<RouteTrigger>,
}

impl HandlerOptions {
    /// The engine-wide defaults: 5 minute timeout, loop limit 3, no
    /// protection.
    pub fn defaults() -> Self {
        Self {
            timeout: Some(TimeoutRoute::default()),
            loop_limit: Some(LoopLimit::default()),
            protected: None,
            triggers: Vec::new(),
        }
    }

    /// Overlay `other` onto `self`: set fields replace, unset fields
    /// preserve the base.
    pub fn merge(&mut self, other: HandlerOptions) {
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.loop_limit.is_some() {
            self.loop_limit = other.loop_limit;
        }
        if other.protected.is_some() {
            self.protected = other.protected;
        }
        if !other.triggers.is_empty() {
            self.triggers = other.triggers;
        }
    }

    /// Routes referenced by fallbacks, for validation.
    pub fn fallback_routes(&self) -> Vec<&str> {
        let mut routes = Vec::new();
        if let Some(timeout) = &self.timeout {
            routes.push(timeout.route.as_str());
        }
        if let Some(loop_limit) = &self.loop_limit {
            routes.push(loop_limit.route.as_str());
        }
        if let Some(protected) = &self.protected {
            routes.push(protected.route.as_str());
        }
        routes
    }
}
