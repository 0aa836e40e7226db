//! Overload detection for failed backend calls.
//!
//! When the backend rejects a Git RPC because it is at capacity, the client
//! should see a readable "try again later" message instead of a dropped
//! connection. [`write_overload_response`] looks for the capacity-exceeded
//! detail in an error chain and renders the matching busy response.

use std::io::{self, Write};

use crate::backend::status::AsStatus;
use crate::git::busy::GitOperation;
use crate::git::sanitize::sanitize_correlation_id;
use crate::observability::metrics;

/// Read-only access to the correlation ID of the in-flight request.
pub trait CorrelationContext {
    fn correlation_id(&self) -> &str;
}

impl CorrelationContext for str {
    fn correlation_id(&self) -> &str {
        self
    }
}

impl CorrelationContext for String {
    fn correlation_id(&self) -> &str {
        self
    }
}

/// Sink for failures that must not replace the error already being handled.
pub trait ErrorReporter {
    fn report(&self, correlation_id: &str, operation: GitOperation, err: &io::Error);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, correlation_id: &str, operation: GitOperation, err: &io::Error) {
        tracing::error!(
            correlation_id = %correlation_id,
            operation = %operation,
            error = %err,
            "Failed to write overload response"
        );
    }
}

/// Render a busy response into `w` if `err` carries a capacity-exceeded detail.
///
/// Returns `true` when an overload was detected, even if rendering then
/// failed. Errors without a status, statuses without the detail and `None`
/// leave `w` untouched and return `false`. Write failures go to `reporter`
/// and are never returned.
pub fn write_overload_response<E, W, C, R>(
    err: Option<&E>,
    w: &mut W,
    ctx: &C,
    operation: GitOperation,
    reporter: &R,
) -> bool
where
    E: AsStatus + ?Sized,
    W: Write + ?Sized,
    C: CorrelationContext + ?Sized,
    R: ErrorReporter + ?Sized,
{
    let Some(status) = err.and_then(|e| e.as_status()) else {
        return false;
    };
    if !status.is_capacity_exceeded() {
        return false;
    }

    let sanitized = sanitize_correlation_id(ctx.correlation_id());
    match operation.write_busy(w, &sanitized) {
        Ok(()) => metrics::record_overload_response(operation),
        Err(write_err) => reporter.report(&sanitized, operation, &write_err),
    }
    true
}
