//! Client authentication for the introspection endpoint.
//!
//! Callers authenticate with `client_secret_basic` or `client_secret_post`.
//! Basic credentials take precedence over body parameters.

use sha2::{Digest, Sha256};

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ServiceCatalog;
use crate::types::RegisteredService;

/// Parses HTTP Basic authentication credentials.
///
/// Returns `(client_id, client_secret)` if the header is a valid Basic
/// header with `client_id:client_secret` encoded in base64.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Split on first colon (secret may contain colons)
    let (client_id, client_secret) = credentials.split_once(':')?;

    Some((client_id.to_string(), client_secret.to_string()))
}

/// Compares secrets through their SHA-256 digests.
fn secrets_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// Authenticates the calling client against the service catalog.
///
/// # Errors
///
/// Returns `AuthError::InvalidClient` if no credentials were presented, the
/// client is unknown or has no secret, or the secret does not match.
/// Catalog failures are returned as-is.
pub async fn authenticate_client(
    catalog: &dyn ServiceCatalog,
    basic_auth: Option<(&str, &str)>,
    body_client_id: Option<&str>,
    body_client_secret: Option<&str>,
) -> AuthResult<RegisteredService> {
    let (client_id, client_secret) = match (basic_auth, body_client_id, body_client_secret) {
        (Some((id, secret)), _, _) => (id, secret),
        (None, Some(id), Some(secret)) => (id, secret),
        _ => return Err(AuthError::invalid_client("Client authentication required")),
    };

    let Some(service) = catalog.find_by_client_id(client_id).await? else {
        tracing::debug!(client_id = %client_id, "Unknown client");
        return Err(AuthError::invalid_client("Client authentication failed"));
    };

    let authenticated = service
        .client_secret
        .as_deref()
        .is_some_and(|expected| secrets_match(client_secret, expected));
    if !authenticated {
        tracing::debug!(client_id = %client_id, "Client secret mismatch");
        return Err(AuthError::invalid_client("Client authentication failed"));
    }

    Ok(service)
}
