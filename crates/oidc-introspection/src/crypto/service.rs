//! Default cipher: server-key JWS plus per-service `dir` JWE.

use std::path::Path;
use std::sync::Arc;

use crate::config::SigningConfig;
use crate::crypto::jwe::{self, JweHeader};
use crate::crypto::jwt::{JwtService, SigningAlgorithm, SigningKeyPair};
use crate::crypto::{CipherError, IntrospectionCipher};
use crate::introspection::ClaimSet;
use crate::issuer::IssuerService;
use crate::types::RegisteredService;

/// Returns `true` when an algorithm setting asks for something.
fn is_requested(value: Option<&str>) -> bool {
    value
        .map(str::trim)
        .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

/// Cipher signing with the server key and encrypting with service keys.
pub struct JwtCipherService {
    issuers: Arc<dyn IssuerService>,
    jwt: JwtService,
}

impl JwtCipherService {
    /// Creates a cipher around an existing JWT service.
    #[must_use]
    pub fn new(issuers: Arc<dyn IssuerService>, jwt: JwtService) -> Self {
        Self { issuers, jwt }
    }

    /// Builds the cipher from signing configuration.
    ///
    /// Loads the key pair from the configured PEM files, or generates one
    /// when no paths are set.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is unsupported or the key cannot be
    /// read, parsed or generated.
    pub fn from_config(
        issuers: Arc<dyn IssuerService>,
        config: &SigningConfig,
    ) -> Result<Self, CipherError> {
        let algorithm: SigningAlgorithm = config.algorithm.parse()?;

        let key_pair = match (&config.private_key_path, &config.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                let private_pem = read_pem(private_path)?;
                let public_pem = read_pem(public_path)?;
                let kid = config
                    .key_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                SigningKeyPair::from_pem(kid, algorithm, &private_pem, &public_pem)?
            }
            _ => {
                let key_pair = SigningKeyPair::generate(algorithm)?;
                tracing::info!(
                    algorithm = %algorithm,
                    kid = %key_pair.kid,
                    "Generated introspection signing key"
                );
                match &config.key_id {
                    Some(kid) => key_pair.with_kid(kid.clone()),
                    None => key_pair,
                }
            }
        };

        Ok(Self::new(issuers, JwtService::new(key_pair)))
    }

    /// The JWT service used for signing.
    #[must_use]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    fn sign(&self, service: &RegisteredService, claims: &ClaimSet) -> Result<String, CipherError> {
        let requested = service
            .introspection_signed_response_alg
            .as_deref()
            .unwrap_or_default()
            .trim();
        let algorithm = requested
            .parse::<SigningAlgorithm>()
            .map_err(|_| CipherError::AlgorithmMismatch {
                requested: requested.to_string(),
                available: self.jwt.algorithm(),
            })?;
        if algorithm != self.jwt.algorithm() {
            return Err(CipherError::AlgorithmMismatch {
                requested: requested.to_string(),
                available: self.jwt.algorithm(),
            });
        }

        Ok(self.jwt.encode(claims)?)
    }

    fn encrypt(
        &self,
        service: &RegisteredService,
        plaintext: &[u8],
        nested: bool,
    ) -> Result<String, CipherError> {
        let encoded_key = service
            .introspection_encryption_key
            .as_deref()
            .ok_or_else(|| CipherError::MissingEncryptionKey {
                client_id: service.client_id.clone(),
            })?;
        let key = jwe::decode_key(encoded_key)?;

        let mut header = JweHeader {
            alg: service
                .introspection_encrypted_response_alg
                .clone()
                .unwrap_or_default(),
            enc: service
                .introspection_encrypted_response_enc
                .clone()
                .unwrap_or_default(),
            cty: None,
        };
        if nested {
            header = header.nested_jwt();
        }

        Ok(jwe::encrypt(&header, &key, plaintext)?)
    }
}

fn read_pem(path: &Path) -> Result<String, CipherError> {
    std::fs::read_to_string(path).map_err(|e| CipherError::KeyLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

impl IntrospectionCipher for JwtCipherService {
    fn should_sign(&self, service: &RegisteredService) -> bool {
        is_requested(service.introspection_signed_response_alg.as_deref())
    }

    fn should_encrypt(&self, service: &RegisteredService) -> bool {
        is_requested(service.introspection_encrypted_response_alg.as_deref())
            && is_requested(service.introspection_encrypted_response_enc.as_deref())
    }

    fn resolve_issuer(&self, service: &RegisteredService) -> String {
        self.issuers.determine_issuer(Some(service))
    }

    fn encode(&self, service: &RegisteredService, claims: &ClaimSet) -> Result<String, CipherError> {
        let sign = self.should_sign(service);
        let encrypt = self.should_encrypt(service);

        tracing::debug!(
            client_id = %service.client_id,
            sign,
            encrypt,
            "Encoding introspection claims"
        );

        match (sign, encrypt) {
            (true, true) => {
                let signed = self.sign(service, claims)?;
                self.encrypt(service, signed.as_bytes(), true)
            }
            (true, false) => self.sign(service, claims),
            (false, true) => {
                let payload = serde_json::to_vec(claims)?;
                self.encrypt(service, &payload, false)
            }
            (false, false) => Ok(claims.to_unsigned_jwt()?),
        }
    }
}
