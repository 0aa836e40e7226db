//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (correlation ID attached, request span opened)
//!     → backend client forwards the request
//!     → on failure: server.rs maps the error, rendering a busy
//!       response for overloaded Git RPCs
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeCorrelationId, X_REQUEST_ID};
pub use server::HttpServer;
