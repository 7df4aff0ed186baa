//! Signing and encryption of introspection claim sets.
//!
//! The introspection core asks an [`IntrospectionCipher`] whether a
//! registered service wants signed and/or encrypted responses, and hands it
//! the claim set to encode when it does.
//!
//! [`JwtCipherService`] is the default implementation: JWS via
//! `jsonwebtoken` with the server key, JWE `dir`/`A256GCM` via `aes-gcm`
//! with the per-service key.

pub mod jwe;
pub mod jwt;
pub mod service;

pub use jwe::{JweError, JweHeader};
pub use jwt::{JwtError, JwtService, SigningAlgorithm, SigningKeyPair};
pub use service::JwtCipherService;

use crate::introspection::ClaimSet;
use crate::types::RegisteredService;

/// Signing/encryption capability used for JWT introspection responses.
pub trait IntrospectionCipher: Send + Sync {
    /// Returns `true` if responses for this service must be signed.
    fn should_sign(&self, service: &RegisteredService) -> bool;

    /// Returns `true` if responses for this service must be encrypted.
    fn should_encrypt(&self, service: &RegisteredService) -> bool;

    /// Returns the `iss` claim for responses to this service.
    fn resolve_issuer(&self, service: &RegisteredService) -> String;

    /// Encodes the claim set per the service's crypto policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be satisfied or a primitive fails.
    fn encode(&self, service: &RegisteredService, claims: &ClaimSet) -> Result<String, CipherError>;
}

/// Errors produced while signing or encrypting a claim set.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Signing failed.
    #[error(transparent)]
    Jwt(#[from] JwtError),

    /// Encryption failed.
    #[error(transparent)]
    Jwe(#[from] JweError),

    /// The service asks for a signing algorithm the server key cannot produce.
    #[error("Service requests {requested} but the server key signs with {available}")]
    AlgorithmMismatch {
        /// Algorithm requested by the service.
        requested: String,
        /// Algorithm of the server signing key.
        available: SigningAlgorithm,
    },

    /// The service asks for encryption but has no key.
    #[error("No encryption key registered for client '{client_id}'")]
    MissingEncryptionKey {
        /// Client id of the service.
        client_id: String,
    },

    /// The claim set could not be serialized.
    #[error("Failed to serialize claims: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The signing key could not be loaded.
    #[error("Failed to load signing key from {path}: {message}")]
    KeyLoad {
        /// Path of the key file.
        path: String,
        /// Description of the failure.
        message: String,
    },
}
