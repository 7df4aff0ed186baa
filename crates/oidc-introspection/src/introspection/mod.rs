//! Introspection response pipeline.
//!
//! [`IntrospectionCore`] composes the collaborators a request flows through:
//!
//! 1. issuer gate ([`IntrospectionCore::validate_issuer`])
//! 2. token resolution ([`IntrospectionCore::resolve_token`])
//! 3. body building ([`builder`])
//! 4. encoding selection and claims packaging ([`encoding`], [`claims`])
//! 5. response assembly and audit ([`response`])
//!
//! Client authentication happens in the HTTP layer between steps 1 and 2.

pub mod builder;
pub mod claims;
pub mod encoding;
pub mod response;

use std::sync::Arc;

use axum::response::Response;
use time::OffsetDateTime;
use url::Url;

pub use claims::ClaimSet;
pub use encoding::{
    INTROSPECTION_JWT_MEDIA_TYPE, IntrospectionFailure, IntrospectionPayload, requests_jwt,
};
pub use response::JWT_FAILURE_MESSAGE;

use crate::audit::{AuditSink, sink_from_config};
use crate::config::{INTROSPECTION_ENDPOINT, IntrospectionConfig};
use crate::crypto::{CipherError, IntrospectionCipher, JwtCipherService};
use crate::issuer::{ConfiguredIssuerService, IssuerService};
use crate::storage::{ServiceCatalog, TokenResolver};
use crate::token::{IntrospectionBody, IntrospectionRequest};
use crate::types::TokenRecord;

/// The introspection core with its injected collaborators.
///
/// All collaborators are shared read-only across requests.
#[derive(Clone)]
pub struct IntrospectionCore {
    issuers: Arc<dyn IssuerService>,
    resolver: Arc<dyn TokenResolver>,
    catalog: Arc<dyn ServiceCatalog>,
    cipher: Arc<dyn IntrospectionCipher>,
    audit: Arc<dyn AuditSink>,
}

impl IntrospectionCore {
    /// Creates a core from its collaborators.
    #[must_use]
    pub fn new(
        issuers: Arc<dyn IssuerService>,
        resolver: Arc<dyn TokenResolver>,
        catalog: Arc<dyn ServiceCatalog>,
        cipher: Arc<dyn IntrospectionCipher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            issuers,
            resolver,
            catalog,
            cipher,
            audit,
        }
    }

    /// Builds a core with the default issuer service, cipher and audit sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing key cannot be loaded or generated.
    pub fn from_config(
        config: &IntrospectionConfig,
        resolver: Arc<dyn TokenResolver>,
        catalog: Arc<dyn ServiceCatalog>,
    ) -> Result<Self, CipherError> {
        let issuers: Arc<dyn IssuerService> = Arc::new(ConfiguredIssuerService::from_config(config));
        let cipher = JwtCipherService::from_config(Arc::clone(&issuers), &config.signing)?;

        Ok(Self::new(
            issuers,
            resolver,
            catalog,
            Arc::new(cipher),
            sink_from_config(&config.audit),
        ))
    }

    /// The registered-service catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ServiceCatalog {
        self.catalog.as_ref()
    }

    /// Returns `true` if the request URL resolves to an accepted issuer.
    #[must_use]
    pub fn validate_issuer(&self, request_url: &Url) -> bool {
        self.issuers
            .validate_issuer(request_url, INTROSPECTION_ENDPOINT)
    }

    /// Resolves the requested token. Resolver errors count as unresolved.
    pub async fn resolve_token(&self, request: &IntrospectionRequest) -> Option<TokenRecord> {
        match self
            .resolver
            .resolve(&request.token, request.token_type_hint)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Token resolution failed; reporting inactive");
                None
            }
        }
    }

    /// Builds the finalized introspection body for a resolved record.
    pub async fn introspect(&self, record: Option<&TokenRecord>) -> IntrospectionBody {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let body = builder::base_body(record, now);
        builder::finalize_body(self.issuers.as_ref(), self.catalog.as_ref(), record, body).await
    }

    /// Selects the response encoding for a finalized body.
    ///
    /// # Errors
    ///
    /// Returns an [`IntrospectionFailure`] if the JWT form was requested and
    /// could not be produced.
    pub async fn encode(
        &self,
        body: IntrospectionBody,
        accept: Option<&str>,
        caller_client_id: &str,
    ) -> Result<IntrospectionPayload, IntrospectionFailure> {
        encoding::select_encoding(
            self.catalog.as_ref(),
            self.cipher.as_ref(),
            body,
            accept,
            caller_client_id,
        )
        .await
    }

    /// Assembles the HTTP response, auditing JWT forms.
    #[must_use]
    pub fn respond(&self, result: Result<IntrospectionPayload, IntrospectionFailure>) -> Response {
        response::assemble(self.audit.as_ref(), result)
    }

    /// Runs resolution, body building, encoding and assembly for an
    /// authenticated caller.
    pub async fn handle(
        &self,
        request: &IntrospectionRequest,
        accept: Option<&str>,
        caller_client_id: &str,
    ) -> Response {
        let record = self.resolve_token(request).await;
        let body = self.introspect(record.as_ref()).await;
        tracing::debug!(active = body.active, "Token introspection completed");
        let result = self.encode(body, accept, caller_client_id).await;
        self.respond(result)
    }
}
