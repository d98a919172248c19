//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Store (method, compiled pattern, handler) triples in declaration order
//! - Resolve the first route whose method and pattern match
//! - Decompose the query string and build the handler's [`RequestContext`]
//! - Fall back to an explicit not-found response
//!
//! # Design Decisions
//! - First match wins: declaration order is authoritative, so more specific
//!   patterns must be registered before patterns that could shadow them
//! - The router is generic over handler state and knows nothing about it
//! - Immutable after construction (shared via Arc without locks)

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::routing::matcher::{PathPattern, PatternError};

/// Decoded JSON request body. Non-object bodies are represented as empty.
pub type Payload = Map<String, Value>;

/// Response extension naming the pattern that served the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

/// Everything a handler gets to see about a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Named path captures.
    pub params: HashMap<String, String>,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    pub body: Payload,
}

impl RequestContext {
    /// A named path capture.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A query parameter, treating blank values as absent.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// A body field that holds a non-empty string.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.body
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A request handler invoked by the dispatcher.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, state: S, ctx: RequestContext) -> BoxFuture<'static, Response>;
}

impl<S, F, Fut, R> Handler<S> for F
where
    F: Fn(S, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, state: S, ctx: RequestContext) -> BoxFuture<'static, Response> {
        let fut = self(state, ctx);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct Route<S> {
    method: Method,
    pattern: PathPattern,
    handler: Box<dyn Handler<S>>,
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Ordered route table with first-match-wins dispatch.
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<S> Router<S>
where
    S: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` + `pattern`.
    pub fn route<H>(&mut self, method: Method, pattern: &str, handler: H) -> Result<&mut Self, PatternError>
    where
        H: Handler<S>,
    {
        let pattern = PathPattern::compile(pattern)?;
        tracing::debug!(method = %method, pattern = %pattern, "Route registered");
        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    /// Registered routes as (method, pattern) pairs, in dispatch order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.pattern.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch a request to the first matching route.
    pub async fn dispatch(&self, state: S, method: Method, path_and_query: &str, body: Payload) -> Response {
        for route in &self.routes {
            if route.method != method {
                continue;
            }
            let Some(matched) = route.pattern.match_path(path_and_query) else {
                continue;
            };

            tracing::debug!(
                method = %method,
                target = %path_and_query,
                pattern = %route.pattern,
                "Route matched"
            );

            let query = matched
                .query
                .as_deref()
                .map(parse_query)
                .unwrap_or_default();

            let path = path_and_query
                .split_once('?')
                .map_or(path_and_query, |(path, _)| path)
                .to_string();

            let ctx = RequestContext {
                method,
                path,
                params: matched.params,
                query,
                body,
            };
            let mut response = route.handler.call(state, ctx).await;
            response
                .extensions_mut()
                .insert(MatchedRoute(route.pattern.as_str().to_string()));
            return response;
        }

        tracing::debug!(method = %method, target = %path_and_query, "No route matched");
        endpoint_not_found()
    }
}

/// Decompose `key=value&key=value` into a map. Later duplicates win.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Terminal response for requests no route accepts.
pub fn endpoint_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Endpoint not found").into_response()
}
