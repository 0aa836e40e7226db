//! Git smart-HTTP protocol pieces used when the backend is overloaded.
//!
//! # Data Flow
//! ```text
//! RpcError from backend
//!     → overload.rs (find Status in error chain, check for LimitError)
//!     → sanitize.rs (bound the correlation ID)
//!     → busy.rs (push or fetch busy response)
//!     → pktline.rs (frame bytes onto the sink)
//! ```

pub mod busy;
pub mod overload;
pub mod pktline;
pub mod sanitize;

#[cfg(test)]
mod testing;

pub use busy::GitOperation;
pub use overload::{write_overload_response, CorrelationContext, ErrorReporter, TracingReporter};
