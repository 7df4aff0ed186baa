//! Introspection body construction.
//!
//! [`base_body`] fills the RFC 7662 fields from the token record;
//! [`finalize_body`] adds the issuer, scope and DPoP confirmation.

use crate::issuer::IssuerService;
use crate::storage::ServiceCatalog;
use crate::token::IntrospectionBody;
use crate::types::TokenRecord;

/// Builds the base body for a resolved record.
///
/// Absent or expired records yield an inactive body.
#[must_use]
pub fn base_body(record: Option<&TokenRecord>, now: i64) -> IntrospectionBody {
    let Some(record) = record.filter(|r| !r.is_expired_at(now)) else {
        return IntrospectionBody::inactive();
    };

    let mut body = IntrospectionBody::active()
        .with_client_id(&record.client_id)
        .with_sub(&record.principal)
        .with_token_type(record.token_type.as_str())
        .with_iat(record.issued_at)
        .with_aud(&record.client_id);
    if let Some(exp) = record.expires_at {
        body = body.with_exp(exp);
    }
    body
}

/// Completes a base body with issuer, scope and DPoP confirmation.
///
/// Inactive bodies are returned unchanged. Lookup failures degrade to
/// omitted fields; this never fails.
pub async fn finalize_body(
    issuers: &dyn IssuerService,
    catalog: &dyn ServiceCatalog,
    record: Option<&TokenRecord>,
    mut body: IntrospectionBody,
) -> IntrospectionBody {
    let Some(record) = record else {
        return body;
    };
    if !body.active {
        return body;
    }

    if let Some(service_url) = record.service.as_deref() {
        let service = match catalog.find_by_service(service_url).await {
            Ok(service) => service,
            Err(e) => {
                tracing::warn!(error = %e, service = %service_url, "Registered service lookup failed");
                None
            }
        };
        body.iss = Some(issuers.determine_issuer(service.as_ref()));
    }

    body.scope = Some(record.scope_string());

    if let Some(jkt) = record.dpop_thumbprint() {
        body = body.with_dpop_confirmation(jkt);
    }

    tracing::debug!(
        active = body.active,
        iss = ?body.iss,
        dpop = body.dpop_confirmation.is_some(),
        "Introspection body built"
    );
    body
}
