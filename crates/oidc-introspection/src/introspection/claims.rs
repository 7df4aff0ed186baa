//! Claim set wrapping an introspection body for JWT responses.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::token::IntrospectionBody;

/// Header of an unsigned JWT.
const UNSIGNED_HEADER: &str = r#"{"alg":"none","typ":"JWT"}"#;

/// JWT claim set of an introspection response (RFC 9701).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer, resolved for the signing context.
    pub iss: String,

    /// Audience: the client id of the registered service.
    pub aud: String,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Unique identifier of this response.
    pub jti: String,

    /// The introspection body as a nested object.
    pub token_introspection: serde_json::Value,
}

impl ClaimSet {
    /// Packages an introspection body with a fresh `iat` and `jti`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be converted to JSON.
    pub fn package(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        body: &IntrospectionBody,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            iss: issuer.into(),
            aud: audience.into(),
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_introspection: serde_json::to_value(body)?,
        })
    }

    /// Serializes the claims as an unsigned compact JWT.
    ///
    /// The signature segment is empty, so the result ends with `.`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized.
    pub fn to_unsigned_jwt(&self) -> Result<String, serde_json::Error> {
        let payload = serde_json::to_vec(self)?;
        Ok(format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(UNSIGNED_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_segment(segment: &str) -> serde_json::Value {
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_package_nests_body() {
        let body = IntrospectionBody::active()
            .with_scope("openid profile")
            .with_client_id("sp-client");
        let claims = ClaimSet::package("https://sso.example.org/oidc", "sp-client", &body).unwrap();

        assert_eq!(claims.aud, "sp-client");
        assert!(claims.token_introspection.is_object());
        assert_eq!(claims.token_introspection["scope"], "openid profile");
        assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_jti_is_unique() {
        let body = IntrospectionBody::inactive();
        let first = ClaimSet::package("iss", "aud", &body).unwrap();
        let second = ClaimSet::package("iss", "aud", &body).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_unsigned_jwt_shape() {
        let body = IntrospectionBody::active().with_scope("openid");
        let claims = ClaimSet::package("https://sso.example.org/oidc", "sp-client", &body).unwrap();
        let token = claims.to_unsigned_jwt().unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].is_empty());

        assert_eq!(
            decode_segment(parts[0]),
            serde_json::json!({"alg": "none", "typ": "JWT"})
        );

        let payload = decode_segment(parts[1]);
        assert_eq!(payload["iss"], "https://sso.example.org/oidc");
        assert_eq!(
            payload["token_introspection"],
            serde_json::to_value(&body).unwrap()
        );
    }
}
