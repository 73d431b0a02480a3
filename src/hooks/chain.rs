//! The before-each-route hook chain.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{join_all, BoxFuture};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::request::RequestInfo;
use crate::routing::RouteMatch;

pub const DEFAULT_FAILURE_CODE: &str = "BEFORE_EACH_ROUTE_FAILURE";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Resolution Failure";

/// What a hook sees: the match result (possibly a miss) and the request head.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub route_match: RouteMatch,
    pub request: Arc<RequestInfo>,
}

/// A hook's verdict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutcome {
    pub resolve: bool,
    /// Merged into the request body when every hook resolves.
    pub data: Option<Map<String, Value>>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl HookOutcome {
    pub fn pass() -> Self {
        Self {
            resolve: true,
            ..Self::default()
        }
    }

    pub fn pass_with(data: Map<String, Value>) -> Self {
        Self {
            resolve: true,
            data: Some(data),
            ..Self::default()
        }
    }

    /// Reject with the default code and message.
    pub fn reject() -> Self {
        Self::default()
    }

    pub fn reject_with(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resolve: false,
            data: None,
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }
}

/// A predicate run before every non-preflight request.
///
/// Implemented for any `Fn(HookContext) -> impl Future<Output = HookOutcome>`.
pub trait Hook: Send + Sync {
    fn before_route(&self, ctx: HookContext) -> BoxFuture<'static, HookOutcome>;
}

impl<F, Fut> Hook for F
where
    F: Fn(HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = HookOutcome> + Send + 'static,
{
    fn before_route(&self, ctx: HookContext) -> BoxFuture<'static, HookOutcome> {
        Box::pin(self(ctx))
    }
}

/// The failure that stops a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct HookRejection {
    /// Registration index of the rejecting hook.
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Ordered list of hooks owned by one server instance.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl Hook + 'static) {
        self.hooks.push(Arc::new(hook));
        tracing::debug!(hooks = self.hooks.len(), "Before-each-route hook registered");
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook concurrently and wait for all of them.
    ///
    /// Returns the merged hook data (registration order, later keys win) or the
    /// rejection of the first rejecting hook in registration order.
    pub async fn run(&self, ctx: HookContext) -> Result<Map<String, Value>, HookRejection> {
        let outcomes = join_all(self.hooks.iter().map(|hook| hook.before_route(ctx.clone()))).await;

        let mut merged = Map::new();
        let mut rejection = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            if !outcome.resolve {
                if rejection.is_none() {
                    rejection = Some(HookRejection {
                        index,
                        code: outcome.code.unwrap_or_else(|| DEFAULT_FAILURE_CODE.to_string()),
                        message: outcome
                            .message
                            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                    });
                }
                continue;
            }
            if let Some(data) = outcome.data {
                merged.extend(data);
            }
        }

        match rejection {
            Some(rejection) => Err(rejection),
            None => Ok(merged),
        }
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain").field("hooks", &self.hooks.len()).finish()
    }
}
