//! HTTP server setup and request forwarding.
//!
//! # Responsibilities
//! - Create the Axum Router with the forwarding handler
//! - Wire up middleware (correlation ID, tracing, timeout)
//! - Forward every request to the Git RPC backend
//! - Answer overloaded Git RPCs with a busy response the client can display

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{AsStatus, GitRpcClient, RpcError, Status};
use crate::config::ProxyConfig;
use crate::git::{write_overload_response, GitOperation, TracingReporter};
use crate::http::request::{correlation_id, make_request_span, MakeCorrelationId, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: GitRpcClient,
}

/// HTTP front-end for the Git RPC backend.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, RpcError> {
        let backend = GitRpcClient::new(&config.backend, &config.timeouts)?;
        let router = Self::build_router(&config, AppState { backend });
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeCorrelationId))
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the server without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Forward a request to the backend, translating failures.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let correlation_id = correlation_id(&request).into_owned();
    let operation = GitOperation::from_path(request.uri().path());

    tracing::debug!(
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Forwarding request"
    );

    match state.backend.call(request).await {
        Ok(response) => response,
        Err(err) => error_response(&err, operation, &correlation_id),
    }
}

/// Map a failed backend call to the response the client sees.
fn error_response(err: &RpcError, operation: Option<GitOperation>, correlation_id: &str) -> Response {
    let status = err.as_status();
    metrics::record_backend_error(status.map_or("TRANSPORT", |s| s.code.as_str()));

    if let Some(operation) = operation {
        let mut body = Vec::new();
        if write_overload_response(Some(err), &mut body, correlation_id, operation, &TracingReporter) {
            tracing::warn!(
                correlation_id = %correlation_id,
                operation = %operation,
                error = %err,
                "Backend overloaded, sending busy response"
            );
            return (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, operation.result_content_type()),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response();
        }
    } else if status.is_some_and(Status::is_capacity_exceeded) {
        tracing::warn!(correlation_id = %correlation_id, error = %err, "Backend overloaded");
        return (StatusCode::SERVICE_UNAVAILABLE, "Backend is overloaded, try again later").into_response();
    }

    tracing::error!(correlation_id = %correlation_id, error = %err, "Backend request failed");
    (StatusCode::BAD_GATEWAY, "Backend request failed").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Code, StatusDetail};
    use axum::http::HeaderValue;
    use tower::ServiceExt;

    fn overloaded() -> RpcError {
        RpcError::Status(Status::new(Code::ResourceExhausted, "concurrency limit").with_detail(
            StatusDetail::LimitError {
                error_message: String::new(),
                retry_after_secs: 1,
            },
        ))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_overloaded_push_gets_busy_response() {
        let response = error_response(&overloaded(), Some(GitOperation::ReceivePack), "abc123");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-git-receive-pack-result"
        );
        let body = body_bytes(response).await;
        assert!(body.starts_with(b"0023\x01001aunpack server is busy\n0000"));
    }

    #[tokio::test]
    async fn test_overloaded_info_refs_gets_503() {
        let response = error_response(&overloaded(), None, "abc123");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_other_failures_get_502() {
        let err = RpcError::Status(Status::new(Code::Internal, "boom"));
        let response = error_response(&err, Some(GitOperation::UploadPack), "abc123");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unreachable_backend_echoes_request_id() {
        let mut config = ProxyConfig::default();
        config.backend.address = "127.0.0.1:1".into();
        let router = HttpServer::new(config).unwrap().into_router();

        let request = Request::post("/group/project.git/git-upload-pack")
            .header(X_REQUEST_ID, "client-supplied")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get(X_REQUEST_ID),
            Some(&HeaderValue::from_static("client-supplied"))
        );
    }
}
