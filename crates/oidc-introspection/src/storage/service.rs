//! Registered-service catalog trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::RegisteredService;

/// Read access to registered services.
///
/// The catalog is owned by the server; the introspection core only reads
/// from it.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Find the service whose service-id pattern matches a service URL.
    ///
    /// When several services match, the one with the lowest id wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    async fn find_by_service(&self, service: &str) -> AuthResult<Option<RegisteredService>>;

    /// Find a service by its OAuth client id.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredService>>;
}
