//! HTTP server exposing the OIDC token introspection endpoint.
//!
//! Wires [`oidc_introspection`] into an axum application backed by the
//! in-memory token resolver and service catalog seeded from configuration.

pub mod config;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{IntrospectionServer, ServerBuilder, ServerError, build_app};
