//! Ready-made hooks.

use axum::http::{header, HeaderName};
use futures_util::future::BoxFuture;

use crate::hooks::chain::{Hook, HookContext, HookOutcome};

/// Rejects requests to non-public routes that carry no credentials header.
///
/// Requests that matched no route pass, so they still end in a 404.
#[derive(Debug, Clone)]
pub struct RequireAuthorization {
    headers: Vec<HeaderName>,
}

impl RequireAuthorization {
    pub const CODE: &'static str = "UNAUTHORIZED";

    /// Accept either `Authorization` or `jax-client-token`.
    pub fn new() -> Self {
        Self {
            headers: vec![
                header::AUTHORIZATION,
                HeaderName::from_static("jax-client-token"),
            ],
        }
    }

    /// Accept only the given headers as credentials.
    pub fn with_headers(headers: Vec<HeaderName>) -> Self {
        Self { headers }
    }
}

impl Default for RequireAuthorization {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for RequireAuthorization {
    fn before_route(&self, ctx: HookContext) -> BoxFuture<'static, HookOutcome> {
        let outcome = match ctx.route_match.route() {
            Some(route) if !route.is_public() => {
                let headers = ctx.request.headers();
                if self.headers.iter().any(|h| headers.contains_key(h)) {
                    HookOutcome::pass()
                } else {
                    HookOutcome::reject_with(Self::CODE, "Authorization required")
                }
            }
            _ => HookOutcome::pass(),
        };
        Box::pin(std::future::ready(outcome))
    }
}
