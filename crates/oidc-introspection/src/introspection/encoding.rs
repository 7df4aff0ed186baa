//! Response encoding selection.
//!
//! Plain JSON is the default. The JWT form is produced only when the client
//! asks for exactly [`INTROSPECTION_JWT_MEDIA_TYPE`]; it is signed and/or
//! encrypted when the registered service's crypto policy requires it.

use crate::crypto::{CipherError, IntrospectionCipher};
use crate::error::AuthError;
use crate::introspection::ClaimSet;
use crate::storage::ServiceCatalog;
use crate::token::IntrospectionBody;

/// Media type of JWT introspection responses (RFC 9701).
pub const INTROSPECTION_JWT_MEDIA_TYPE: &str = "application/token-introspection+jwt";

/// Returns `true` if the `Accept` value asks for the JWT form.
///
/// The whole value, trimmed, must equal the media type (case-insensitive).
/// Lists and parameters are not negotiated.
#[must_use]
pub fn requests_jwt(accept: Option<&str>) -> bool {
    accept.is_some_and(|value| value.trim().eq_ignore_ascii_case(INTROSPECTION_JWT_MEDIA_TYPE))
}

/// Encoded introspection response, ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum IntrospectionPayload {
    /// Plain JSON body.
    Json(IntrospectionBody),

    /// Compact JWT (unsigned, signed, or encrypted).
    Jwt {
        /// The compact serialization.
        token: String,
        /// Client id of the registered service.
        client_id: String,
        /// Display name of the registered service.
        service_name: String,
    },
}

/// Failure while producing the JWT form. Never shown to the caller.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionFailure {
    /// The claim set could not be serialized.
    #[error("Failed to serialize introspection claims: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Signing or encryption failed.
    #[error("Failed to sign or encrypt introspection claims: {0}")]
    Cipher(#[from] CipherError),

    /// No registered service exists for the client.
    #[error("No registered service found for client '{client_id}'")]
    ServiceNotFound {
        /// The client id that was looked up.
        client_id: String,
    },

    /// The service catalog could not be read.
    #[error("Registered service lookup failed: {0}")]
    Catalog(#[from] AuthError),
}

/// Chooses the representation of a finalized body.
///
/// The service is looked up by the body's `client_id`, or by the caller's
/// client id when the body has none (inactive tokens).
///
/// # Errors
///
/// Returns an [`IntrospectionFailure`] if the JWT form was requested and
/// could not be produced.
pub async fn select_encoding(
    catalog: &dyn ServiceCatalog,
    cipher: &dyn IntrospectionCipher,
    body: IntrospectionBody,
    accept: Option<&str>,
    caller_client_id: &str,
) -> Result<IntrospectionPayload, IntrospectionFailure> {
    if !requests_jwt(accept) {
        return Ok(IntrospectionPayload::Json(body));
    }

    let client_id = body.client_id.as_deref().unwrap_or(caller_client_id);
    let service = catalog
        .find_by_client_id(client_id)
        .await?
        .ok_or_else(|| IntrospectionFailure::ServiceNotFound {
            client_id: client_id.to_string(),
        })?;

    let claims = ClaimSet::package(cipher.resolve_issuer(&service), &service.client_id, &body)?;

    let secure = cipher.should_sign(&service) || cipher.should_encrypt(&service);
    let token = if secure {
        cipher.encode(&service, &claims)?
    } else {
        claims.to_unsigned_jwt()?
    };

    tracing::debug!(
        client_id = %service.client_id,
        secure,
        "Produced JWT introspection response"
    );

    Ok(IntrospectionPayload::Jwt {
        token,
        client_id: service.client_id,
        service_name: service.name,
    })
}
