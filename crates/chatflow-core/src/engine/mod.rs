//! Route registry and dispatch pipeline.
//!
//! The engine owns the registered routes, the global trigger list, and the
//! composed default options. `execute` runs one message through the
//! pipeline: trigger pre-emption, loop guard, optional protection check,
//! then bounded handler invocation. The engine performs no I/O of its own;
//! all side effects flow through the caller-supplied executor.

mod context;
mod options;
mod scope;

pub use context::ChatContext;
pub use options::{
    DEFAULT_LOOP_COUNT, DEFAULT_LOOP_ROUTE, DEFAULT_TIMEOUT, DEFAULT_TIMEOUT_ROUTE,
    HandlerOptions, LoopLimit, ProtectedRoute, RouteTrigger, TimeoutRoute,
};
pub use scope::CancelScope;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::{Message, RouteReturn, SessionState};
use crate::error::EngineError;
use crate::ports::Executor;

/// Future returned by a route handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Option<RouteReturn>> + Send>>;

/// A route handler: consumes the invocation context, produces the next
/// step. Returning `None` means "stay on the current route".
///
/// Implemented for any `Fn(ChatContext<Obs>) -> impl Future` closure, so
/// plain async closures register directly.
pub trait RouteHandler<Obs>: Send + Sync {
    fn call(&self, ctx: ChatContext<Obs>) -> HandlerFuture;
}

impl<Obs, F, Fut> RouteHandler<Obs> for F
where
    F: Fn(ChatContext<Obs>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<RouteReturn>> + Send + 'static,
{
    fn call(&self, ctx: ChatContext<Obs>) -> HandlerFuture {
        Box::pin(self(ctx))
    }
}

/// Predicate deciding whether the session may enter a protected route.
pub type ProtectionPredicate<Obs> = Arc<dyn Fn(&SessionState<Obs>) -> bool + Send + Sync>;

/// A registered handler with its resolved options.
struct RouteEntry<Obs> {
    options: HandlerOptions,
    handler: Arc<dyn RouteHandler<Obs>>,
}

/// Route registry and dispatch pipeline.
///
/// Registration happens during setup, before the app starts; afterwards
/// the engine is read-only and safe to share across handler tasks.
pub struct Engine<Obs> {
    routes: HashMap<String, RouteEntry<Obs>>,
    defaults: HandlerOptions,
    triggers: Vec<RouteTrigger>,
    protection: Option<ProtectionPredicate<Obs>>,
}

impl<Obs> Default for Engine<Obs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Obs> Engine<Obs> {
    /// An engine with the stock defaults: 5 minute timeout redirecting to
    /// `"timeout_route"`, loop limit 3 redirecting to `"loop_route"`, no
    /// protection.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            defaults: HandlerOptions::defaults(),
            triggers: Vec::new(),
            protection: None,
        }
    }

    /// An engine whose defaults are the stock defaults overlaid with
    /// `options`.
    pub fn with_defaults(options: HandlerOptions) -> Self {
        let mut defaults = HandlerOptions::defaults();
        defaults.merge(options);
        Self {
            routes: HashMap::new(),
            defaults,
            triggers: Vec::new(),
            protection: None,
        }
    }

    /// Register a handler under `name` with the engine defaults.
    ///
    /// The name is normalized (trimmed, lowercased) before insertion.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered; duplicate registration is
    /// a programmer error at setup time.
    pub fn register(&mut self, name: &str, handler: impl RouteHandler<Obs> + 'static) {
        self.register_with_options(name, handler, HandlerOptions::default());
    }

    /// Register a handler with options overlaid onto the engine defaults.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered.
    pub fn register_with_options(
        &mut self,
        name: &str,
        handler: impl RouteHandler<Obs> + 'static,
        options: HandlerOptions,
    ) {
        let name = name.trim().to_lowercase();
        if self.routes.contains_key(&name) {
            panic!("route already registered: {name}");
        }

        let mut resolved = self.defaults.clone();
        resolved.merge(options);

        self.routes.insert(
            name,
            RouteEntry {
                options: resolved,
                handler: Arc::new(handler),
            },
        );
    }

    /// Append a global trigger. Triggers are evaluated in registration
    /// order before every dispatch.
    pub fn register_trigger(&mut self, trigger: RouteTrigger) {
        self.triggers.push(trigger);
    }

    /// Install the predicate consulted for routes carrying `protected`
    /// options. Without a predicate (the default), protection is inert.
    pub fn set_protection_predicate(
        &mut self,
        predicate: impl Fn(&SessionState<Obs>) -> bool + Send + Sync + 'static,
    ) {
        self.protection = Some(Arc::new(predicate));
    }

    /// Registered route names.
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }

    /// The composed default options.
    pub fn default_options(&self) -> &HandlerOptions {
        &self.defaults
    }

    /// The global trigger list.
    pub fn triggers(&self) -> &[RouteTrigger] {
        &self.triggers
    }

    /// Check the registry is coherent before starting.
    ///
    /// Fails when the `"start"` route is missing, or when any route
    /// referenced by a global trigger, a per-handler trigger, or a
    /// default-option fallback (timeout / loop / protection) is not
    /// registered.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.routes.contains_key("start") {
            return Err(EngineError::MissingRequiredRoute("start".into()));
        }

        for trigger in &self.triggers {
            if !self.routes.contains_key(&trigger.route) {
                return Err(EngineError::DanglingTriggerRoute {
                    route: trigger.route.clone(),
                    regex: trigger.regex.clone(),
                });
            }
        }

        for (name, entry) in &self.routes {
            for trigger in &entry.options.triggers {
                if !self.routes.contains_key(&trigger.route) {
                    return Err(EngineError::DanglingHandlerTriggerRoute {
                        handler: name.clone(),
                        route: trigger.route.clone(),
                        regex: trigger.regex.clone(),
                    });
                }
            }
        }

        for fallback in self.defaults.fallback_routes() {
            if !self.routes.contains_key(fallback) {
                return Err(EngineError::DanglingFallbackRoute(fallback.to_string()));
            }
        }

        info!(routes = self.routes.len(), "routes validated");
        Ok(())
    }

    /// First trigger whose regex matches `text` and whose target differs
    /// from the current route. Matches targeting the current route are
    /// skipped (prevents self-loop redirects); invalid regexes are logged
    /// and skipped.
    fn apply_triggers(&self, text: &str, current: &str) -> Option<&str> {
        for trigger in &self.triggers {
            let re = match Regex::new(&trigger.regex) {
                Ok(re) => re,
                Err(err) => {
                    error!(regex = %trigger.regex, error = %err, "invalid trigger regex, skipping");
                    continue;
                }
            };

            if re.is_match(text) && trigger.route != current {
                return Some(&trigger.route);
            }
        }
        None
    }
}

impl<Obs: Send + 'static> Engine<Obs> {
    /// Run one message through the pipeline.
    ///
    /// Order: trigger pre-emption, loop guard, protection (when a
    /// predicate is installed), then handler invocation bounded by the
    /// route's timeout. A handler that misses its deadline is abandoned
    /// and the timeout fallback redirect is returned; its late result is
    /// dropped by the one-slot channel.
    pub async fn execute(
        &self,
        state: SessionState<Obs>,
        message: Message,
        executor: Arc<dyn Executor>,
    ) -> Result<RouteReturn, EngineError> {
        let text = message.entire_text();
        if let Some(target) = self.apply_triggers(&text, state.route.current()) {
            info!(route = target, "trigger pre-empted dispatch");
            return Ok(RouteReturn::redirect(target));
        }

        let loop_limit = self.defaults.loop_limit.clone().unwrap_or_default();
        let repeated = state.route.current_repeated();
        if repeated > loop_limit.count && state.route.current() != loop_limit.route {
            error!(route = %state.route.current(), repeated, "loop detected");
            return Ok(RouteReturn::Redirect(loop_limit.route));
        }

        let current = state.route.current().to_string();
        let Some(entry) = self.routes.get(&current) else {
            return Err(EngineError::RouteNotFound(current));
        };

        if let (Some(predicate), Some(protected)) =
            (self.protection.as_ref(), entry.options.protected.as_ref())
            && !predicate(&state)
        {
            warn!(route = %current, fallback = %protected.route, "protected route denied");
            return Ok(RouteReturn::Redirect(protected.route.clone()));
        }

        let timeout = entry.options.timeout.clone().unwrap_or_default();
        let scope = CancelScope::with_timeout(timeout.duration);

        // The engine keeps only the route; the context owns the state.
        let route = state.route.clone();
        let ctx = ChatContext::new(scope.clone(), state, message, executor);

        // Capacity 1 lets an abandoned handler publish without blocking.
        let (tx, mut rx) = mpsc::channel(1);
        let handler = entry.handler.clone();
        tokio::spawn(async move {
            let returned = handler.call(ctx).await;
            let _ = tx.try_send(returned);
        });

        tokio::select! {
            outcome = tokio::time::timeout_at(scope.deadline(), rx.recv()) => match outcome {
                Ok(Some(Some(returned))) => Ok(returned),
                // Null return: stay on the current route.
                Ok(Some(None)) => {
                    debug!(route = %current, "handler stayed on current route");
                    Ok(RouteReturn::NextRoute(route.next(current)))
                }
                // Sender dropped without publishing: the handler task died.
                Ok(None) => Err(EngineError::HandlerFailed(current)),
                Err(_) => {
                    error!(route = %current, "handler timeout");
                    Ok(RouteReturn::Redirect(timeout.route))
                }
            },
            cause = scope.cancelled() => Err(EngineError::Cancelled(cause)),
        }
    }
}
