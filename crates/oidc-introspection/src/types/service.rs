//! Registered service domain types.
//!
//! A registered service is a relying party known to the service catalog. It
//! carries the client credentials used to call the introspection endpoint and
//! the crypto policy applied to JWT-formatted introspection responses.

use regex::Regex;
use serde::{Deserialize, Serialize};

// =============================================================================
// Registered Service
// =============================================================================

/// A relying party registered in the service catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredService {
    /// Numeric identifier. Lower ids are matched first.
    pub id: u64,

    /// Human-readable display name.
    pub name: String,

    /// Regular expression matched against token service URLs.
    pub service_id: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// Client secret used for authenticating introspection calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Issuer override for tokens issued to this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// JWS algorithm for signed introspection responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_signed_response_alg: Option<String>,

    /// JWE key management algorithm for encrypted introspection responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_encrypted_response_alg: Option<String>,

    /// JWE content encryption algorithm for encrypted introspection responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_encrypted_response_enc: Option<String>,

    /// Base64url-encoded symmetric key for `dir` encryption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_encryption_key: Option<String>,
}

impl RegisteredService {
    /// Creates a service with no secret, issuer override or crypto policy.
    #[must_use]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        service_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            service_id: service_id.into(),
            client_id: client_id.into(),
            client_secret: None,
            issuer: None,
            introspection_signed_response_alg: None,
            introspection_encrypted_response_alg: None,
            introspection_encrypted_response_enc: None,
            introspection_encryption_key: None,
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the issuer override.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Requests signed introspection responses with the given JWS algorithm.
    #[must_use]
    pub fn with_signed_response_alg(mut self, alg: impl Into<String>) -> Self {
        self.introspection_signed_response_alg = Some(alg.into());
        self
    }

    /// Requests encrypted introspection responses.
    #[must_use]
    pub fn with_encrypted_response(
        mut self,
        alg: impl Into<String>,
        enc: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.introspection_encrypted_response_alg = Some(alg.into());
        self.introspection_encrypted_response_enc = Some(enc.into());
        self.introspection_encryption_key = Some(key.into());
        self
    }

    /// Compiles the service-id pattern, anchored at both ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn service_pattern(&self) -> Result<Regex, ServiceValidationError> {
        Regex::new(&format!("^(?:{})$", self.service_id))
            .map_err(|e| ServiceValidationError::InvalidServiceId(e.to_string()))
    }

    /// Validates the registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client id, name or service id is empty, or if
    /// the service id is not a valid regular expression.
    pub fn validate(&self) -> Result<(), ServiceValidationError> {
        if self.client_id.is_empty() {
            return Err(ServiceValidationError::EmptyClientId);
        }

        if self.name.is_empty() {
            return Err(ServiceValidationError::EmptyName);
        }

        if self.service_id.is_empty() {
            return Err(ServiceValidationError::EmptyServiceId);
        }

        self.service_pattern().map(|_| ())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during service validation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Service name cannot be empty.
    #[error("Service name cannot be empty")]
    EmptyName,

    /// Service id pattern cannot be empty.
    #[error("Service id cannot be empty")]
    EmptyServiceId,

    /// Service id pattern is not a valid regular expression.
    #[error("Invalid service id pattern: {0}")]
    InvalidServiceId(String),
}
