//! Git smart-HTTP proxy that degrades gracefully when its backend is overloaded.

pub mod backend;
pub mod config;
pub mod git;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
