//! JWS signing of introspection claim sets.
//!
//! Supports RS256, RS384 and ES384 server keys. Keys are either loaded from
//! PEM files or generated at start-up.
//!
//! ## Example
//!
//! ```ignore
//! use oidc_introspection::crypto::jwt::{JwtService, SigningAlgorithm, SigningKeyPair};
//!
//! let key_pair = SigningKeyPair::generate(SigningAlgorithm::RS256)?;
//! let jwt_service = JwtService::new(key_pair);
//!
//! let token = jwt_service.encode(&claims)?;
//! let verified = jwt_service.decode::<ClaimSet>(&token)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use p384::SecretKey as EcSecretKey;
use p384::ecdsa::SigningKey as EcSigningKey;
use p384::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// `typ` header of signed introspection responses.
pub const INTROSPECTION_JWT_TYPE: &str = "token-introspection+jwt";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The algorithm name is not supported.
    #[error("Unsupported algorithm: {name}")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(name: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { name: name.into() }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a key-related error.
    #[must_use]
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::KeyGenerationError { .. } | Self::InvalidKey { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for introspection responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
    /// ECDSA with P-384 curve.
    ES384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            _ => Err(JwtError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// A signing key pair for JWT operations.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (public key) for verification.
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair {
    /// Generates a new key pair for the given algorithm.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if algorithm.is_rsa() {
            Self::generate_rsa(algorithm)
        } else {
            Self::generate_ec()
        }
    }

    /// Generates a new RSA key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails or algorithm is not RSA-based.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates a new EC key pair using the P-384 curve.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_ec() -> Result<Self, JwtError> {
        let secret_key = EcSecretKey::random(&mut OsRng);

        // jsonwebtoken only accepts PKCS8 for EC private keys
        let private_pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let decoding_key = ec_decoding_key(&secret_key)?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::ES384,
            encoding_key,
            decoding_key,
        })
    }

    /// Loads a key pair from PEM strings.
    ///
    /// EC private keys may be PKCS8 or SEC1 encoded; the public half is
    /// derived from the private key.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let (encoding_key, decoding_key) = if algorithm.is_rsa() {
            let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            (encoding_key, decoding_key)
        } else {
            let secret_key = EcSecretKey::from_pkcs8_pem(private_pem)
                .map_err(|e| e.to_string())
                .or_else(|_| EcSecretKey::from_sec1_pem(private_pem).map_err(|e| e.to_string()))
                .map_err(JwtError::invalid_key)?;
            let pkcs8_pem = secret_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let encoding_key = EncodingKey::from_ec_pem(pkcs8_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            (encoding_key, ec_decoding_key(&secret_key)?)
        };

        Ok(Self {
            kid: kid.into(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }

    /// Replaces the key ID.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = kid.into();
        self
    }
}

fn ec_decoding_key(secret_key: &EcSecretKey) -> Result<DecodingKey, JwtError> {
    let signing_key = EcSigningKey::from(secret_key);
    let point = signing_key.verifying_key().to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| JwtError::invalid_key("Missing x coordinate"))?;
    let y = point
        .y()
        .ok_or_else(|| JwtError::invalid_key("Missing y coordinate"))?;

    let x_b64 = URL_SAFE_NO_PAD.encode(x.as_slice());
    let y_b64 = URL_SAFE_NO_PAD.encode(y.as_slice());
    DecodingKey::from_ec_components(&x_b64, &y_b64)
        .map_err(|e| JwtError::invalid_key(e.to_string()))
}

// ============================================================================
// JWT Service
// ============================================================================

/// Signs and verifies introspection claim sets.
///
/// Thread-safe (`Send + Sync`); shared across requests behind an `Arc`.
#[derive(Debug)]
pub struct JwtService {
    signing_key: SigningKeyPair,
}

impl JwtService {
    /// Creates a new JWT service.
    #[must_use]
    pub fn new(signing_key: SigningKeyPair) -> Self {
        Self { signing_key }
    }

    /// Signs claims into a compact JWS.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        header.typ = Some(INTROSPECTION_JWT_TYPE.to_string());
        header.kid = Some(self.signing_key.kid.clone());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Verifies a compact JWS signed by this service and returns its claims.
    ///
    /// Introspection claim sets carry no `exp`, so only the signature and
    /// algorithm are checked.
    ///
    /// # Errors
    /// Returns an error if decoding or signature verification fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode(token, &self.signing_key.decoding_key, &validation).map_err(JwtError::from)
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm
    }

    /// Returns the current signing key ID.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.signing_key.kid
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct SampleClaims {
        iss: String,
        aud: String,
        token_introspection: serde_json::Value,
    }

    fn sample_claims() -> SampleClaims {
        SampleClaims {
            iss: "https://sso.example.org/oidc".to_string(),
            aud: "sp-client".to_string(),
            token_introspection: serde_json::json!({"active": true, "scope": "openid"}),
        }
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "RS256".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::RS256
        );
        assert_eq!(
            "es384".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::ES384
        );
        let err = "HS256".parse::<SigningAlgorithm>().unwrap_err();
        assert!(matches!(err, JwtError::UnsupportedAlgorithm { .. }));
    }

    #[test]
    fn test_generate_rsa_rejects_ec_algorithm() {
        let err = SigningKeyPair::generate_rsa(SigningAlgorithm::ES384).unwrap_err();
        assert!(err.is_key_error());
    }

    #[test]
    fn test_rs256_encode_decode() {
        let key_pair = SigningKeyPair::generate(SigningAlgorithm::RS256).unwrap();
        let service = JwtService::new(key_pair.with_kid("introspection-key"));

        let token = service.encode(&sample_claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = service.decode::<SampleClaims>(&token).unwrap();
        assert_eq!(decoded.claims, sample_claims());
        assert_eq!(decoded.header.alg, Algorithm::RS256);
        assert_eq!(decoded.header.kid.as_deref(), Some("introspection-key"));
        assert_eq!(decoded.header.typ.as_deref(), Some(INTROSPECTION_JWT_TYPE));
    }

    #[test]
    fn test_es384_encode_decode() {
        let key_pair = SigningKeyPair::generate_ec().unwrap();
        let service = JwtService::new(key_pair);
        assert_eq!(service.algorithm(), SigningAlgorithm::ES384);

        let token = service.encode(&sample_claims()).unwrap();
        let decoded = service.decode::<SampleClaims>(&token).unwrap();
        assert_eq!(decoded.claims.aud, "sp-client");
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let service1 =
            JwtService::new(SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap());
        let service2 =
            JwtService::new(SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap());

        let token = service1.encode(&sample_claims()).unwrap();
        let result = service2.decode::<SampleClaims>(&token);
        assert!(matches!(result.unwrap_err(), JwtError::InvalidSignature));
    }

    #[test]
    fn test_from_pem_round_trip() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        let key_pair = SigningKeyPair::from_pem(
            "pem-key",
            SigningAlgorithm::RS384,
            &private_pem,
            &public_pem,
        )
        .unwrap();
        let service = JwtService::new(key_pair);
        assert_eq!(service.current_kid(), "pem-key");

        let token = service.encode(&sample_claims()).unwrap();
        assert!(service.decode::<SampleClaims>(&token).is_ok());
    }

    #[test]
    fn test_ec_from_pem_accepts_pkcs8_and_sec1() {
        let secret_key = EcSecretKey::random(&mut OsRng);
        let pkcs8 = secret_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let sec1 = secret_key.to_sec1_pem(LineEnding::LF).unwrap();

        for pem in [&*pkcs8, &*sec1] {
            let key_pair =
                SigningKeyPair::from_pem("ec-key", SigningAlgorithm::ES384, pem, "").unwrap();
            let service = JwtService::new(key_pair);
            let token = service.encode(&sample_claims()).unwrap();
            assert!(service.decode::<SampleClaims>(&token).is_ok());
        }
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        let err = SigningKeyPair::from_pem("k", SigningAlgorithm::RS256, "nope", "nope")
            .unwrap_err();
        assert!(err.is_key_error());

        let err = SigningKeyPair::from_pem("k", SigningAlgorithm::ES384, "nope", "nope")
            .unwrap_err();
        assert!(err.is_key_error());
    }
}
