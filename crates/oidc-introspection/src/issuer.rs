//! Issuer determination and validation.
//!
//! The issuer of an introspection endpoint is the base URL the endpoint is
//! mounted under. Requests are only served when the URL they arrived at
//! resolves to that issuer.

use url::Url;

use crate::config::IntrospectionConfig;
use crate::types::RegisteredService;

/// Issuer policy of the server.
pub trait IssuerService: Send + Sync {
    /// Returns the issuer for tokens owned by a service.
    ///
    /// A service-level issuer override wins over the configured issuer.
    fn determine_issuer(&self, service: Option<&RegisteredService>) -> String;

    /// Returns `true` if the issuer derived from `request_url` is acceptable
    /// for the endpoint path segment `endpoint`.
    fn validate_issuer(&self, request_url: &Url, endpoint: &str) -> bool;
}

/// Issuer service backed by static configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredIssuerService {
    issuer: String,
    allow_dynamic_issuers: bool,
}

impl ConfiguredIssuerService {
    /// Creates an issuer service for a fixed issuer.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        let issuer: String = issuer.into();
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
            allow_dynamic_issuers: false,
        }
    }

    /// Also accepts issuers extending the configured one with extra path segments.
    #[must_use]
    pub fn with_dynamic_issuers(mut self, allow: bool) -> Self {
        self.allow_dynamic_issuers = allow;
        self
    }

    /// Builds the issuer service from configuration.
    #[must_use]
    pub fn from_config(config: &IntrospectionConfig) -> Self {
        Self::new(config.normalized_issuer()).with_dynamic_issuers(config.allow_dynamic_issuers)
    }

    /// The configured issuer, without a trailing slash.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

/// Strips query, fragment, the endpoint suffix and trailing slashes from a
/// request URL.
fn derive_issuer(request_url: &Url, endpoint: &str) -> String {
    let mut base = request_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let url = base.as_str().trim_end_matches('/');
    let suffix = format!("/{}", endpoint.trim_matches('/'));
    url.strip_suffix(suffix.as_str())
        .unwrap_or(url)
        .trim_end_matches('/')
        .to_string()
}

impl IssuerService for ConfiguredIssuerService {
    fn determine_issuer(&self, service: Option<&RegisteredService>) -> String {
        service
            .and_then(|s| s.issuer.as_deref())
            .map(|issuer| issuer.trim().trim_end_matches('/'))
            .filter(|issuer| !issuer.is_empty())
            .unwrap_or(&self.issuer)
            .to_string()
    }

    fn validate_issuer(&self, request_url: &Url, endpoint: &str) -> bool {
        let derived = derive_issuer(request_url, endpoint).to_lowercase();
        let configured = self.issuer.to_lowercase();

        let valid = derived == configured
            || (self.allow_dynamic_issuers && derived.starts_with(&format!("{configured}/")));

        if !valid {
            tracing::debug!(
                derived = %derived,
                configured = %configured,
                "Request issuer does not match configured issuer"
            );
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_exact_issuer_passes() {
        let service = ConfiguredIssuerService::new("https://sso.example.org/cas/oidc");
        assert!(service.validate_issuer(
            &url("https://sso.example.org/cas/oidc/introspect"),
            "introspect"
        ));
    }

    #[test]
    fn test_issuer_comparison_ignores_case_and_trailing_slash() {
        let service = ConfiguredIssuerService::new("https://SSO.example.org/cas/oidc/");
        assert!(service.validate_issuer(
            &url("https://sso.example.org/cas/oidc/introspect/"),
            "introspect"
        ));
        assert!(service.validate_issuer(
            &url("https://sso.example.org/CAS/OIDC/introspect"),
            "introspect"
        ));
    }

    #[test]
    fn test_query_string_is_ignored() {
        let service = ConfiguredIssuerService::new("https://sso.example.org/oidc");
        assert!(service.validate_issuer(
            &url("https://sso.example.org/oidc/introspect?token=AT-1"),
            "introspect"
        ));
    }

    #[test]
    fn test_foreign_host_fails() {
        let service = ConfiguredIssuerService::new("https://sso.example.org/oidc");
        assert!(!service.validate_issuer(
            &url("https://attacker.example/oidc/introspect"),
            "introspect"
        ));
    }

    #[test]
    fn test_dynamic_issuers() {
        let strict = ConfiguredIssuerService::new("https://sso.example.org/oidc");
        let dynamic = strict.clone().with_dynamic_issuers(true);
        let tenant = url("https://sso.example.org/oidc/tenant-a/introspect");

        assert!(!strict.validate_issuer(&tenant, "introspect"));
        assert!(dynamic.validate_issuer(&tenant, "introspect"));

        // Prefix must end at a path boundary
        assert!(!dynamic.validate_issuer(
            &url("https://sso.example.org/oidcx/introspect"),
            "introspect"
        ));
    }

    #[test]
    fn test_determine_issuer_prefers_service_override() {
        let issuers = ConfiguredIssuerService::new("https://sso.example.org/oidc");
        let service = RegisteredService::new(1, "Tenant", "https://tenant\\..*", "tenant")
            .with_issuer("https://tenant.example.org/oidc/");

        assert_eq!(
            issuers.determine_issuer(Some(&service)),
            "https://tenant.example.org/oidc"
        );
        assert_eq!(issuers.determine_issuer(None), "https://sso.example.org/oidc");

        let blank = service.with_issuer("  ");
        assert_eq!(
            issuers.determine_issuer(Some(&blank)),
            "https://sso.example.org/oidc"
        );
    }

    #[test]
    fn test_from_config() {
        let config = IntrospectionConfig {
            issuer: "https://sso.example.org/oidc/".to_string(),
            allow_dynamic_issuers: true,
            ..Default::default()
        };
        let service = ConfiguredIssuerService::from_config(&config);
        assert_eq!(service.issuer(), "https://sso.example.org/oidc");
        assert!(service.validate_issuer(
            &url("https://sso.example.org/oidc/t1/introspect"),
            "introspect"
        ));
    }
}
