//! Token introspection endpoint handler (RFC 7662).
//!
//! # Usage
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use oidc_introspection::http::introspect_handler;
//!
//! let app = Router::new()
//!     .route("/oidc/introspect", get(introspect_handler).post(introspect_handler))
//!     .with_state(introspection_state);
//! ```
//!
//! # Request Format
//!
//! ```text
//! POST /oidc/introspect
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <client_credentials>
//! Accept: application/token-introspection+jwt
//!
//! token=<token_to_introspect>&token_type_hint=access_token
//! ```
//!
//! `GET` reads the same parameters from the query string; `POST` also
//! accepts a JSON body.
//!
//! # Response
//!
//! JSON with `active: true/false` by default, or a compact JWT when the
//! JWT media type is requested.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use url::Url;

use crate::config::INTROSPECTION_ENDPOINT;
use crate::error::AuthError;
use crate::http::client_auth::{authenticate_client, parse_basic_auth};
use crate::introspection::IntrospectionCore;
use crate::token::IntrospectionRequest;
use crate::types::TokenType;

// =============================================================================
// State Types
// =============================================================================

/// State required for the introspection endpoint.
#[derive(Clone)]
pub struct IntrospectionState {
    /// The introspection core.
    pub core: Arc<IntrospectionCore>,
}

impl IntrospectionState {
    /// Creates a new introspection state.
    pub fn new(core: Arc<IntrospectionCore>) -> Self {
        Self { core }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Introspection request parameters.
#[derive(Debug, Default, Deserialize)]
pub struct IntrospectionParams {
    /// The token to introspect.
    #[serde(default)]
    pub token: Option<String>,

    /// Optional hint about the token type.
    #[serde(default)]
    pub token_type_hint: Option<String>,

    /// Client ID (for `client_secret_post`).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (for `client_secret_post`).
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl IntrospectionParams {
    /// Converts to an IntrospectionRequest. Missing or empty tokens yield `None`.
    fn to_introspection_request(&self) -> Option<IntrospectionRequest> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        Some(IntrospectionRequest {
            token: token.to_string(),
            token_type_hint: self
                .token_type_hint
                .as_deref()
                .and_then(TokenType::from_hint),
        })
    }
}

/// Reads parameters from the query (GET) or the form/JSON body (POST).
async fn parse_params(request: Request) -> Result<IntrospectionParams, AuthError> {
    if request.method() == Method::GET {
        return Query::<IntrospectionParams>::try_from_uri(request.uri())
            .map(|Query(params)| params)
            .map_err(|e| AuthError::invalid_request(e.body_text()));
    }

    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

    if is_json {
        Json::<IntrospectionParams>::from_request(request, &())
            .await
            .map(|Json(params)| params)
            .map_err(|e| AuthError::invalid_request(e.body_text()))
    } else {
        Form::<IntrospectionParams>::from_request(request, &())
            .await
            .map(|Form(params)| params)
            .map_err(|e| AuthError::invalid_request(e.body_text()))
    }
}

/// Reconstructs the externally visible request URL.
///
/// Honors `X-Forwarded-Proto` and `X-Forwarded-Host` set by a reverse proxy.
pub fn request_url(headers: &HeaderMap, uri: &Uri) -> Option<Url> {
    let forwarded = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let scheme = forwarded("x-forwarded-proto")
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    let host = forwarded("x-forwarded-host")
        .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
        .or_else(|| uri.authority().map(|a| a.as_str()))?;

    Url::parse(&format!("{}://{}{}", scheme, host, uri.path())).ok()
}

// =============================================================================
// Handler
// =============================================================================

/// Token introspection endpoint handler.
///
/// # Response
///
/// - 200 OK with JSON body, or with a compact JWT when
///   `Accept: application/token-introspection+jwt`
/// - 400 Bad Request: issuer mismatch or missing token parameter
/// - 400 Bad Request (text/plain): JWT form could not be produced
/// - 401 Unauthorized: Invalid client credentials
pub async fn introspect_handler(
    State(state): State<IntrospectionState>,
    request: Request,
) -> Response {
    let headers = request.headers().clone();

    let issuer_ok = request_url(&headers, request.uri())
        .is_some_and(|url| state.core.validate_issuer(&url));
    if !issuer_ok {
        return AuthError::InvalidIssuer.into_response();
    }

    let params = match parse_params(request).await {
        Ok(params) => params,
        Err(e) => return e.into_response(),
    };

    let Some(introspection_request) = params.to_introspection_request() else {
        return AuthError::invalid_request("Missing required 'token' parameter").into_response();
    };

    let basic_auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth);
    let basic_auth_ref = basic_auth
        .as_ref()
        .map(|(id, secret)| (id.as_str(), secret.as_str()));

    let client = match authenticate_client(
        state.core.catalog(),
        basic_auth_ref,
        params.client_id.as_deref(),
        params.client_secret.as_deref(),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!(error = %e, "Introspection: client authentication failed");
            return e.into_response();
        }
    };

    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    state
        .core
        .handle(&introspection_request, accept, &client.client_id)
        .await
}

/// Introspection handler for tenant paths below the issuer.
///
/// Serves `<issuer path>/**/introspect`; any other path is 404. The issuer
/// gate then decides whether the tenant issuer is accepted.
pub async fn dynamic_introspect_handler(
    state: State<IntrospectionState>,
    request: Request,
) -> Response {
    if !is_endpoint_path(request.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    introspect_handler(state, request).await
}

fn is_endpoint_path(path: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment == INTROSPECTION_ENDPOINT)
}

// =============================================================================
// Tests
// =============================================================================
