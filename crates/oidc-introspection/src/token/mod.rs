//! Introspection protocol types.
//!
//! - Introspection requests (RFC 7662)
//! - Introspection bodies with OIDC issuer and DPoP confirmation
//! - OAuth error bodies

pub mod introspection;

pub use introspection::{
    DPopConfirmation, IntrospectionBody, IntrospectionError, IntrospectionErrorCode,
    IntrospectionRequest,
};
