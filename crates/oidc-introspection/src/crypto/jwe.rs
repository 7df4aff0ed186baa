//! Compact JWE with direct key agreement and AES-256-GCM.
//!
//! Only `alg=dir` / `enc=A256GCM` is produced: the shared 256-bit key of the
//! registered service is used as the content-encryption key, so the
//! encrypted-key segment is empty.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits)
const TAG_SIZE: usize = 16;

/// Key management algorithm.
pub const ALG_DIR: &str = "dir";

/// Content encryption algorithm.
pub const ENC_A256GCM: &str = "A256GCM";

/// Errors produced while encrypting or decrypting a JWE.
#[derive(Debug, thiserror::Error)]
pub enum JweError {
    /// The key management or content encryption algorithm is not supported.
    #[error("Unsupported JWE algorithms: alg={alg}, enc={enc}")]
    UnsupportedAlgorithm {
        /// Requested key management algorithm.
        alg: String,
        /// Requested content encryption algorithm.
        enc: String,
    },

    /// The key is not valid base64url or has the wrong length.
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// The token is not a well-formed compact JWE.
    #[error("Malformed JWE: {0}")]
    Malformed(String),

    /// The AEAD operation failed.
    #[error("Encryption failed: {0}")]
    Crypto(String),
}

/// Protected header of the JWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    /// Key management algorithm.
    pub alg: String,

    /// Content encryption algorithm.
    pub enc: String,

    /// Content type; `JWT` when the plaintext is a signed JWT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

impl JweHeader {
    /// Creates a `dir` / `A256GCM` header.
    #[must_use]
    pub fn dir_a256gcm() -> Self {
        Self {
            alg: ALG_DIR.to_string(),
            enc: ENC_A256GCM.to_string(),
            cty: None,
        }
    }

    /// Marks the plaintext as a nested JWT.
    #[must_use]
    pub fn nested_jwt(mut self) -> Self {
        self.cty = Some("JWT".to_string());
        self
    }
}

/// Decodes a base64url (unpadded) 256-bit key.
///
/// # Errors
///
/// Returns `JweError::InvalidKey` if the key does not decode to 32 bytes.
pub fn decode_key(encoded: &str) -> Result<[u8; KEY_SIZE], JweError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim().trim_end_matches('='))
        .map_err(|e| JweError::InvalidKey(e.to_string()))?;
    <[u8; KEY_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
        JweError::InvalidKey(format!("expected {} bytes, got {}", KEY_SIZE, bytes.len()))
    })
}

/// Encrypts `plaintext` into a compact JWE.
///
/// # Errors
///
/// Returns an error if the header names anything other than `dir`/`A256GCM`
/// or if encryption fails.
pub fn encrypt(header: &JweHeader, key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<String, JweError> {
    if header.alg != ALG_DIR || header.enc != ENC_A256GCM {
        return Err(JweError::UnsupportedAlgorithm {
            alg: header.alg.clone(),
            enc: header.enc.clone(),
        });
    }

    let header_json =
        serde_json::to_vec(header).map_err(|e| JweError::Malformed(e.to_string()))?;
    let protected = URL_SAFE_NO_PAD.encode(header_json);

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| JweError::InvalidKey(format!("Failed to create cipher: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: protected.as_bytes(),
            },
        )
        .map_err(|e| JweError::Crypto(e.to_string()))?;

    // aes-gcm appends the tag to the ciphertext
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

    Ok(format!(
        "{}..{}.{}.{}",
        protected,
        URL_SAFE_NO_PAD.encode(nonce_bytes),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Decrypts a compact `dir` / `A256GCM` JWE.
///
/// # Errors
///
/// Returns an error if the token is malformed, uses other algorithms, or
/// fails authentication.
pub fn decrypt(token: &str, key: &[u8; KEY_SIZE]) -> Result<(JweHeader, Vec<u8>), JweError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [protected, encrypted_key, iv, ciphertext, tag] = *parts.as_slice() else {
        return Err(JweError::Malformed(format!(
            "expected 5 segments, got {}",
            parts.len()
        )));
    };
    if !encrypted_key.is_empty() {
        return Err(JweError::Malformed(
            "encrypted key must be empty for dir".to_string(),
        ));
    }

    let decode = |segment: &str| {
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| JweError::Malformed(e.to_string()))
    };

    let header: JweHeader = serde_json::from_slice(&decode(protected)?)
        .map_err(|e| JweError::Malformed(e.to_string()))?;
    if header.alg != ALG_DIR || header.enc != ENC_A256GCM {
        return Err(JweError::UnsupportedAlgorithm {
            alg: header.alg,
            enc: header.enc,
        });
    }

    let nonce_bytes = decode(iv)?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(JweError::Malformed("Invalid nonce size".to_string()));
    }

    let mut sealed = decode(ciphertext)?;
    sealed.extend_from_slice(&decode(tag)?);

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| JweError::InvalidKey(format!("Failed to create cipher: {e}")))?;
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &sealed,
                aad: protected.as_bytes(),
            },
        )
        .map_err(|e| JweError::Crypto(e.to_string()))?;

    Ok((header, plaintext))
}
