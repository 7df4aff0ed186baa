//! Introspection endpoint configuration.
//!
//! Covers the issuer the endpoint answers for, the server signing key used
//! for JWT-formatted responses, and protocol audit settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crypto::SigningAlgorithm;

/// Path segment of the introspection endpoint below the issuer.
pub const INTROSPECTION_ENDPOINT: &str = "introspect";

/// Root introspection configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [introspection]
/// issuer = "https://sso.example.org/oidc"
///
/// [introspection.signing]
/// algorithm = "RS256"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntrospectionConfig {
    /// Issuer URL this server answers for.
    /// The introspection endpoint lives at `<issuer>/introspect`.
    pub issuer: String,

    /// Accept requests whose derived issuer extends the configured issuer
    /// with additional path segments (`<issuer>/<tenant>/introspect`).
    pub allow_dynamic_issuers: bool,

    /// Signing key configuration for JWT-formatted responses.
    pub signing: SigningConfig,

    /// Protocol audit configuration.
    pub audit: AuditConfig,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080/oidc".to_string(),
            allow_dynamic_issuers: false,
            signing: SigningConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

/// Token signing configuration.
///
/// When no key paths are given a fresh key pair is generated at start-up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "RS256", "RS384", "ES384" (case-insensitive)
    pub algorithm: String,

    /// Key ID placed in the JWS header. Generated when absent.
    pub key_id: Option<String>,

    /// PEM-encoded private key.
    pub private_key_path: Option<PathBuf>,

    /// PEM-encoded public key.
    pub public_key_path: Option<PathBuf>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
            key_id: None,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Emit protocol audit records for JWT introspection responses.
    pub enabled: bool,

    /// Include the produced JWT in the audit record.
    pub include_payload: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_payload: true,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl IntrospectionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty or not an absolute http(s) URL
    /// - The signing algorithm is not supported
    ///
    /// Returns `ConfigError::Missing` if only one of the key paths is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        let issuer = Url::parse(&self.issuer).map_err(|e| {
            ConfigError::InvalidValue(format!("issuer '{}' is not a URL: {}", self.issuer, e))
        })?;
        if !matches!(issuer.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "issuer '{}' must use http or https",
                self.issuer
            )));
        }
        if issuer.query().is_some() || issuer.fragment().is_some() {
            return Err(ConfigError::InvalidValue(format!(
                "issuer '{}' must not carry a query or fragment",
                self.issuer
            )));
        }

        if self.signing.algorithm.parse::<SigningAlgorithm>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be RS256, RS384, or ES384",
                self.signing.algorithm
            )));
        }

        match (
            &self.signing.private_key_path,
            &self.signing.public_key_path,
        ) {
            (Some(_), None) => {
                return Err(ConfigError::Missing("signing.public_key_path".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing(
                    "signing.private_key_path".to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the issuer without a trailing slash.
    #[must_use]
    pub fn normalized_issuer(&self) -> String {
        self.issuer.trim_end_matches('/').to_string()
    }

    /// Returns the route path of the introspection endpoint.
    ///
    /// Derived from the issuer path, e.g. `https://sso.example.org/oidc`
    /// yields `/oidc/introspect`.
    #[must_use]
    pub fn endpoint_path(&self) -> String {
        format!("{}/{}", self.issuer_path(), INTROSPECTION_ENDPOINT)
    }

    /// Returns the issuer URL path without a trailing slash (empty at the root).
    #[must_use]
    pub fn issuer_path(&self) -> String {
        Url::parse(&self.issuer)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IntrospectionConfig::default();
        assert_eq!(config.issuer, "http://localhost:8080/oidc");
        assert!(!config.allow_dynamic_issuers);
        assert_eq!(config.signing.algorithm, "RS256");
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_default_config_validates() {
        let config = IntrospectionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_issuer_fails_validation() {
        let config = IntrospectionConfig {
            issuer: String::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_relative_issuer_fails_validation() {
        let config = IntrospectionConfig {
            issuer: "/oidc".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = IntrospectionConfig {
            issuer: "ftp://sso.example.org/oidc".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_algorithm_fails_validation() {
        let mut config = IntrospectionConfig::default();
        config.signing.algorithm = "HS256".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("signing algorithm"));
    }

    #[test]
    fn test_valid_algorithms() {
        for alg in ["RS256", "RS384", "ES384", "rs256", "Es384"] {
            let mut config = IntrospectionConfig::default();
            config.signing.algorithm = alg.to_string();
            assert!(
                config.validate().is_ok(),
                "Algorithm {} should be valid",
                alg
            );
        }
    }

    #[test]
    fn test_half_configured_key_pair_fails_validation() {
        let mut config = IntrospectionConfig::default();
        config.signing.private_key_path = Some(PathBuf::from("private.pem"));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(err.to_string().contains("public_key_path"));
    }

    #[test]
    fn test_endpoint_path_follows_issuer() {
        let config = IntrospectionConfig {
            issuer: "https://sso.example.org/cas/oidc/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_path(), "/cas/oidc/introspect");
        assert_eq!(config.issuer_path(), "/cas/oidc");
        assert_eq!(config.normalized_issuer(), "https://sso.example.org/cas/oidc");

        let config = IntrospectionConfig {
            issuer: "https://sso.example.org".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_path(), "/introspect");
        assert_eq!(config.issuer_path(), "");
    }

    #[test]
    fn test_serde_defaults_fill_missing_sections() {
        let config: IntrospectionConfig =
            serde_json::from_str(r#"{"issuer": "https://sso.example.org/oidc"}"#).unwrap();
        assert_eq!(config.issuer, "https://sso.example.org/oidc");
        assert_eq!(config.signing.algorithm, "RS256");
        assert!(config.audit.include_payload);
    }
}
