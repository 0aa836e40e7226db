//! Git RPC backend subsystem.
//!
//! # Data Flow
//! ```text
//! Git request from http/server.rs
//!     → client.rs (rewrite authority, forward with streamed body)
//!     → backend
//!     → 2xx: response streamed back to the client
//!     → otherwise: status.rs (decode JSON status) → RpcError::Status
//! ```
//!
//! # Design Decisions
//! - Error bodies are small and read in full; success bodies are never buffered
//! - A [`status::Status`] is the `source()` of its [`client::RpcError`] so
//!   it can be found by walking the error chain

pub mod client;
pub mod status;

pub use client::{GitRpcClient, RpcError};
pub use status::{AsStatus, Code, Status, StatusDetail};
