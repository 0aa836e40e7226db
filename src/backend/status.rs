//! Structured status errors returned by the Git RPC backend.
//!
//! Mirrors the gRPC status model: a canonical code, a message and a list of
//! typed details. The backend sends it as JSON on any non-2xx response.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Type URL of the capacity-exceeded detail.
pub const LIMIT_ERROR_TYPE: &str = "type.googleapis.com/gitaly.LimitError";

/// Canonical status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    Ok,
    Cancelled,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
    /// Also used for codes this proxy does not know.
    #[serde(other)]
    Unknown,
}

impl Code {
    /// Best-effort mapping for backend responses that carry no JSON status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::Aborted,
            429 => Self::ResourceExhausted,
            501 => Self::Unimplemented,
            502 | 503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed detail attached to a [`Status`].
///
/// Details are classified by their `@type` alone. A detail whose other
/// fields are missing or malformed still keeps its type, and one that
/// cannot be classified becomes [`StatusDetail::Unknown`] instead of
/// failing the whole status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDetail {
    /// The backend turned the call away because a concurrency or resource
    /// limit was reached.
    LimitError {
        error_message: String,
        retry_after_secs: u64,
    },

    /// Any detail type this proxy does not understand.
    Unknown,
}

impl StatusDetail {
    fn from_value(value: &Value) -> Self {
        if value.get("@type").and_then(Value::as_str) != Some(LIMIT_ERROR_TYPE) {
            return Self::Unknown;
        }
        Self::LimitError {
            error_message: value
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            retry_after_secs: value
                .get("retry_after_secs")
                .and_then(Value::as_u64)
                .unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for StatusDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Status-bearing error returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Status {
    pub code: Code,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "details_or_empty")]
    pub details: Vec<StatusDetail>,
}

/// `"details": null` reads as no details.
fn details_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<StatusDetail>, D::Error> {
    Ok(Option::<Vec<StatusDetail>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: StatusDetail) -> Self {
        self.details.push(detail);
        self
    }

    /// True when any detail is a [`StatusDetail::LimitError`].
    pub fn is_capacity_exceeded(&self) -> bool {
        self.details
            .iter()
            .any(|detail| matches!(detail, StatusDetail::LimitError { .. }))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for Status {}

/// Capability of exposing a backend [`Status`].
pub trait AsStatus {
    fn as_status(&self) -> Option<&Status>;
}

impl AsStatus for Status {
    fn as_status(&self) -> Option<&Status> {
        Some(self)
    }
}

/// Walks the `source()` chain and returns the first [`Status`] found.
impl AsStatus for dyn Error + 'static {
    fn as_status(&self) -> Option<&Status> {
        let mut current: Option<&(dyn Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(status) = err.downcast_ref::<Status>() {
                return Some(status);
            }
            current = err.source();
        }
        None
    }
}

impl AsStatus for dyn Error + Send + Sync + 'static {
    fn as_status(&self) -> Option<&Status> {
        let err: &(dyn Error + 'static) = self;
        err.as_status()
    }
}
