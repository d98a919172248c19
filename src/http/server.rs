//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that feeds every request to the dispatcher
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bound and decode request bodies
//! - Record per-request metrics
//! - Serve on a listener until shutdown
//!
//! # Design Decisions
//! - The body is read before route resolution, so an oversized body gets
//!   413 even when no route would have matched

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::request;
use crate::http::tasks::{task_routes, TaskState};
use crate::observability::metrics;
use crate::routing::{MatchedRoute, PatternError, Router as Dispatcher};
use crate::store::DocumentStore;

/// Application state injected into the catch-all handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<TaskState>>,
    pub tasks: TaskState,
    pub max_body_size: usize,
}

/// HTTP server for the task service.
pub struct HttpServer {
    router: axum::Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server over `store`.
    pub fn new(config: ServiceConfig, store: Arc<DocumentStore>) -> Result<Self, PatternError> {
        let dispatcher = Arc::new(task_routes()?);
        tracing::info!(routes = dispatcher.len(), table = %config.store.table, "Route table compiled");

        let state = AppState {
            dispatcher,
            tasks: TaskState::new(store, &config.store.table),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: decode the body and hand the request to the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = request::request_id(&parts.headers).to_string();
    let method = parts.method;
    let method_str = method.to_string();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target,
        "Dispatching request"
    );

    let payload = match request::read_payload(body, state.max_body_size).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
            metrics::record_request(&method_str, 413, "none", start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let response = state
        .dispatcher
        .dispatch(state.tasks.clone(), method, &target, payload)
        .await;

    let route = response
        .extensions()
        .get::<MatchedRoute>()
        .map_or("none", |m| m.0.as_str());
    metrics::record_request(&method_str, response.status().as_u16(), route, start_time);

    if route == "none" {
        tracing::warn!(request_id = %request_id, target = %target, "No route matched");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tower::ServiceExt;

    fn server(max_body_size: usize) -> HttpServer {
        let mut config = ServiceConfig::default();
        config.security.max_body_size = max_body_size;
        HttpServer::new(config, Arc::new(DocumentStore::in_memory())).unwrap()
    }

    #[tokio::test]
    async fn test_create_through_layers() {
        let app = server(1024).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tasks")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"A","description":"B"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key(request::X_REQUEST_ID));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let task: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(task["title"], "A");
        assert!(task["id"].is_string());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = server(1024).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tasks")
                    .header(request::X_REQUEST_ID, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[request::X_REQUEST_ID], "req-42");
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let app = server(1024).router();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Endpoint not found");
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let app = server(8).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tasks")
                    .body(Body::from(r#"{"title":"A","description":"B"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_body_checked_before_routing() {
        let app = server(8).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/nope")
                    .body(Body::from(r#"{"title":"A","description":"B"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
