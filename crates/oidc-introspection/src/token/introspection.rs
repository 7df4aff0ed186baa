//! Token introspection (RFC 7662)
//!
//! Protocol types of the introspection endpoint: the request parameters, the
//! introspection body with its OIDC issuer and DPoP extensions, and the
//! OAuth error body.
//!
//! # Security Considerations
//!
//! - Never reveal why a token is inactive (expired vs unknown vs invalid)
//! - An inactive body carries `active` and nothing else
//!
//! # References
//!
//! - [RFC 7662 - OAuth 2.0 Token Introspection](https://tools.ietf.org/html/rfc7662)
//! - [RFC 9449 - OAuth 2.0 Demonstrating Proof of Possession](https://tools.ietf.org/html/rfc9449)

use serde::{Deserialize, Serialize};

use crate::types::TokenType;

// =============================================================================
// Request Types
// =============================================================================

/// Token introspection request per RFC 7662.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionRequest {
    /// The token to introspect.
    pub token: String,

    /// Optional hint about the token type.
    ///
    /// The server may identify the token type even without this hint.
    #[serde(default)]
    pub token_type_hint: Option<TokenType>,
}

// =============================================================================
// Response Types
// =============================================================================

/// DPoP confirmation: the thumbprint of the key a token is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DPopConfirmation {
    /// JWK SHA-256 thumbprint.
    pub jkt: String,
}

/// Token introspection body per RFC 7662.
///
/// If the token is unknown, expired or otherwise invalid, the body contains
/// only `active: false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionBody {
    /// Whether the token is currently active. Always present.
    pub active: bool,

    /// Issuer of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Space-separated scopes granted to the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Client the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Subject of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Type of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Issued at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Intended audience of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Key binding for DPoP-bound tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpop_confirmation: Option<DPopConfirmation>,
}

impl IntrospectionBody {
    /// Creates an inactive body (used for unknown/expired/invalid tokens).
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Default::default()
        }
    }

    /// Creates an active body with no claims.
    #[must_use]
    pub fn active() -> Self {
        Self {
            active: true,
            ..Default::default()
        }
    }

    /// Sets the issuer.
    #[must_use]
    pub fn with_iss(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the client ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// Sets the issued at time.
    #[must_use]
    pub fn with_iat(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Sets the audience.
    #[must_use]
    pub fn with_aud(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Sets the DPoP confirmation thumbprint.
    #[must_use]
    pub fn with_dpop_confirmation(mut self, jkt: impl Into<String>) -> Self {
        self.dpop_confirmation = Some(DPopConfirmation { jkt: jkt.into() });
        self
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// OAuth error body returned by the introspection endpoint.
///
/// Per RFC 7662, unknown tokens are not errors. These errors cover malformed
/// requests, issuer mismatch and client authentication failures.
#[derive(Debug, Clone, Serialize)]
pub struct IntrospectionError {
    /// The error code.
    pub error: IntrospectionErrorCode,

    /// Optional human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntrospectionError {
    /// Creates a new introspection error.
    #[must_use]
    pub fn new(error: IntrospectionErrorCode) -> Self {
        Self {
            error,
            error_description: None,
        }
    }

    /// Creates a new introspection error with a description.
    #[must_use]
    pub fn with_description(error: IntrospectionErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }

    /// Creates an `invalid_request` error.
    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::with_description(IntrospectionErrorCode::InvalidRequest, description)
    }

    /// Creates an `invalid_client` error.
    #[must_use]
    pub fn invalid_client(description: impl Into<String>) -> Self {
        Self::with_description(IntrospectionErrorCode::InvalidClient, description)
    }

    /// Creates the error returned when the request issuer does not match.
    #[must_use]
    pub fn invalid_issuer() -> Self {
        Self::invalid_request("Invalid issuer")
    }
}

impl std::fmt::Display for IntrospectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error.as_str())?;
        if let Some(ref desc) = self.error_description {
            write!(f, ": {}", desc)?;
        }
        Ok(())
    }
}

impl std::error::Error for IntrospectionError {}

/// Introspection error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionErrorCode {
    /// The request is missing a required parameter or is otherwise malformed.
    InvalidRequest,

    /// Client authentication failed.
    InvalidClient,

    /// The server failed while handling the request.
    ServerError,
}

impl IntrospectionErrorCode {
    /// Returns the error code as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::ServerError => "server_error",
        }
    }
}

impl std::fmt::Display for IntrospectionErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspection_request_deserialization() {
        let json = r#"{"token": "abc123"}"#;
        let request: IntrospectionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.token, "abc123");
        assert!(request.token_type_hint.is_none());

        let json = r#"{"token": "abc123", "token_type_hint": "refresh_token"}"#;
        let request: IntrospectionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.token_type_hint, Some(TokenType::RefreshToken));
    }

    #[test]
    fn test_inactive_body_serializes_to_active_only() {
        let body = IntrospectionBody::inactive();
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"active":false}"#);
    }

    #[test]
    fn test_active_body_serialization() {
        let body = IntrospectionBody::active()
            .with_iss("https://sso.example.org/oidc")
            .with_scope("openid profile")
            .with_client_id("sp-client")
            .with_sub("casuser")
            .with_dpop_confirmation("0ZcOCORZNYy-DWpqq30jZyJGHTN0d2HglBV3uiguA4I");

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["iss"], "https://sso.example.org/oidc");
        assert_eq!(value["scope"], "openid profile");
        assert_eq!(value["client_id"], "sp-client");
        assert_eq!(
            value["dpop_confirmation"]["jkt"],
            "0ZcOCORZNYy-DWpqq30jZyJGHTN0d2HglBV3uiguA4I"
        );
        assert!(value.get("exp").is_none());
    }

    #[test]
    fn test_body_round_trips_through_json_value() {
        let body = IntrospectionBody::active()
            .with_scope("openid")
            .with_iat(1_700_000_000)
            .with_exp(1_700_003_600);
        let value = serde_json::to_value(&body).unwrap();
        let parsed: IntrospectionBody = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn test_invalid_issuer_error() {
        let error = IntrospectionError::invalid_issuer();
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "invalid_request", "error_description": "Invalid issuer"})
        );
    }

    #[test]
    fn test_introspection_error_serialization() {
        let error = IntrospectionError::new(IntrospectionErrorCode::InvalidClient);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("invalid_client"));
        assert!(!json.contains("error_description"));
    }

    #[test]
    fn test_introspection_error_display() {
        let error = IntrospectionError::invalid_client("Authentication failed");
        assert_eq!(error.to_string(), "invalid_client: Authentication failed");

        let error = IntrospectionError::new(IntrospectionErrorCode::InvalidRequest);
        assert_eq!(error.to_string(), "invalid_request");
    }
}
