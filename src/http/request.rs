//! Request correlation.
//!
//! # Responsibilities
//! - Accept a client-supplied `X-Request-Id` or generate one (UUID v4)
//! - Expose it as the correlation ID shown in busy messages and logs
//!
//! # Design Decisions
//! - The ID is attached as early as possible, before tracing spans open
//! - Client-supplied IDs are kept verbatim; their length is bounded only
//!   where they are echoed back into Git protocol output

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates correlation IDs for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Correlation ID of `request`, or `""` when none was attached.
///
/// Header bytes that are not valid UTF-8 are replaced with U+FFFD.
pub fn correlation_id<B>(request: &Request<B>) -> Cow<'_, str> {
    request
        .extensions()
        .get::<RequestId>()
        .map_or(Cow::Borrowed(""), |id| String::from_utf8_lossy(id.header_value().as_bytes()))
}

/// Span for one proxied request.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        correlation_id = %correlation_id(request),
    )
}
