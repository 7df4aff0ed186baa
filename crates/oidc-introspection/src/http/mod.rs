//! HTTP handlers for the introspection endpoint.
//!
//! - [`introspect`] - `GET|POST <issuer>/introspect`
//! - [`client_auth`] - `client_secret_basic` / `client_secret_post`
//! - [`error`] - OAuth error responses for [`AuthError`](crate::AuthError)

pub mod client_auth;
pub mod error;
pub mod introspect;

use std::sync::Arc;

use axum::{Router, routing::get};

pub use client_auth::{authenticate_client, parse_basic_auth};
pub use introspect::{
    IntrospectionParams, IntrospectionState, dynamic_introspect_handler, introspect_handler,
    request_url,
};

use crate::config::IntrospectionConfig;
use crate::introspection::IntrospectionCore;

/// Builds a router serving the introspection endpoint at `path`.
pub fn introspection_router(core: Arc<IntrospectionCore>, path: &str) -> Router {
    Router::new()
        .route(path, get(introspect_handler).post(introspect_handler))
        .with_state(IntrospectionState::new(core))
}

/// Builds the router for a configuration.
///
/// Serves `endpoint_path()`. With `allow_dynamic_issuers` the router also
/// accepts `<issuer path>/**/introspect`, leaving the tenant decision to
/// the issuer gate.
pub fn introspection_router_from_config(
    core: Arc<IntrospectionCore>,
    config: &IntrospectionConfig,
) -> Router {
    let router = introspection_router(Arc::clone(&core), &config.endpoint_path());
    if !config.allow_dynamic_issuers {
        return router;
    }

    let tenant_path = format!("{}/{{*tenant}}", config.issuer_path());
    router.merge(
        Router::new()
            .route(
                &tenant_path,
                get(dynamic_introspect_handler).post(dynamic_introspect_handler),
            )
            .with_state(IntrospectionState::new(core)),
    )
}
