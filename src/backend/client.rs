//! HTTP client for the Git RPC backend.
//!
//! # Responsibilities
//! - Forward Git smart-HTTP requests to the backend with their body streamed
//! - Hand successful responses back untouched for streaming
//! - Turn error responses into a structured [`Status`]

use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, Request, Response, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::backend::status::{AsStatus, Code, Status};
use crate::config::{BackendConfig, TimeoutConfig};

/// Upper bound on an error body read from the backend.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Errors from a backend call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection refused, reset, timed out while connecting, ...
    #[error("backend request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// The backend answered with a status error.
    #[error("backend returned {0}")]
    Status(#[from] Status),

    #[error("invalid backend address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("failed to build backend request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("failed to read backend error body: {0}")]
    Body(#[from] axum::Error),
}

impl AsStatus for RpcError {
    fn as_status(&self) -> Option<&Status> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// Client for the Git RPC backend.
#[derive(Clone)]
pub struct GitRpcClient {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl GitRpcClient {
    /// Create a client for the configured backend.
    pub fn new(backend: &BackendConfig, timeouts: &TimeoutConfig) -> Result<Self, RpcError> {
        let authority = Authority::from_str(&backend.address).map_err(|source| RpcError::InvalidAddress {
            address: backend.address.clone(),
            source,
        })?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { client, authority })
    }

    /// Forward `request` to the backend.
    ///
    /// Only the authority of the URI is rewritten; path, query, method and
    /// headers (including `X-Request-Id`) go through unchanged.
    pub async fn call(&self, request: Request<Body>) -> Result<Response<Body>, RpcError> {
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts).map_err(axum::http::Error::from)?;
        parts.headers.remove(header::HOST);

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.map(Body::new));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_ERROR_BODY).await?;
        Err(RpcError::Status(decode_status(status.as_u16(), &bytes)))
    }
}

/// Decode a backend error body, falling back to the HTTP status when it is
/// not a JSON status.
fn decode_status(http_status: u16, body: &[u8]) -> Status {
    match serde_json::from_slice::<Status>(body) {
        Ok(status) => status,
        Err(_) => Status::new(
            Code::from_http_status(http_status),
            String::from_utf8_lossy(body).trim(),
        ),
    }
}
