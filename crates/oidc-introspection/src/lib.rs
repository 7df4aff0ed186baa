//! # oidc-introspection
//!
//! Response-construction core of an OAuth 2.0 / OpenID Connect token
//! introspection endpoint.
//!
//! This crate provides:
//! - RFC 7662 introspection bodies with OIDC issuer and DPoP extensions
//! - JWT-formatted introspection responses (unsigned, signed, or signed and encrypted)
//! - Issuer validation for the introspection endpoint
//! - Collaborator traits for token resolution, the registered-service catalog,
//!   issuer determination, cryptography and audit, with default implementations
//! - An Axum handler wiring the pipeline together
//!
//! ## Overview
//!
//! A request flows through the issuer gate, client authentication and token
//! resolution before the [`introspection::IntrospectionCore`] builds the body,
//! selects the response encoding and assembles the final HTTP response.
//!
//! ## Modules
//!
//! - [`config`] - Introspection endpoint configuration
//! - [`error`] - Error types
//! - [`audit`] - Protocol audit records and sinks
//! - [`issuer`] - Issuer determination and validation
//! - [`types`] - Token records and registered services
//! - [`storage`] - Token resolver and service catalog traits
//! - [`token`] - Introspection protocol types
//! - [`crypto`] - Signing and encryption of introspection claims
//! - [`introspection`] - Body builder, encoding selector, claims packager, response assembler
//! - [`http`] - Axum HTTP handlers

pub mod audit;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod introspection;
pub mod issuer;
pub mod storage;
pub mod token;
pub mod types;

pub use audit::{AuditRecord, AuditSink, NoopAuditSink, TracingAuditSink};
pub use config::{AuditConfig, ConfigError, IntrospectionConfig, SigningConfig};
pub use crypto::{CipherError, IntrospectionCipher, JwtCipherService};
pub use error::{AuthError, ErrorCategory};
pub use http::{
    IntrospectionState, introspect_handler, introspection_router, introspection_router_from_config,
};
pub use introspection::{
    ClaimSet, INTROSPECTION_JWT_MEDIA_TYPE, IntrospectionCore, IntrospectionFailure,
    IntrospectionPayload,
};
pub use issuer::{ConfiguredIssuerService, IssuerService};
pub use storage::{InMemoryServiceCatalog, InMemoryTokenResolver, ServiceCatalog, TokenResolver};
pub use token::{DPopConfirmation, IntrospectionBody, IntrospectionRequest};
pub use types::{RegisteredService, TokenRecord, TokenType};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oidc_introspection::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::audit::{AuditRecord, AuditSink, NoopAuditSink, TracingAuditSink};
    pub use crate::config::{ConfigError, IntrospectionConfig};
    pub use crate::crypto::{CipherError, IntrospectionCipher, JwtCipherService};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::http::{
        IntrospectionState, introspect_handler, introspection_router,
        introspection_router_from_config,
    };
    pub use crate::introspection::{
        ClaimSet, INTROSPECTION_JWT_MEDIA_TYPE, IntrospectionCore, IntrospectionFailure,
        IntrospectionPayload,
    };
    pub use crate::issuer::{ConfiguredIssuerService, IssuerService};
    pub use crate::storage::{
        InMemoryServiceCatalog, InMemoryTokenResolver, ServiceCatalog, TokenResolver,
    };
    pub use crate::token::{DPopConfirmation, IntrospectionBody, IntrospectionRequest};
    pub use crate::types::{RegisteredService, TokenRecord, TokenType};
}
