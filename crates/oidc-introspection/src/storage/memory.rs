//! In-memory token resolver and service catalog.
//!
//! Both stores are backed by `DashMap`, so lookups from concurrent requests
//! do not contend on a global lock.

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{ServiceCatalog, TokenResolver};
use crate::types::{RegisteredService, TokenRecord, TokenType};

// =============================================================================
// Token Resolver
// =============================================================================

/// Token resolver holding records in memory.
///
/// Expired records are reported as unknown but kept until removed.
#[derive(Debug, Default)]
pub struct InMemoryTokenResolver {
    tokens: DashMap<String, TokenRecord>,
}

impl InMemoryTokenResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver seeded with records.
    #[must_use]
    pub fn with_tokens(records: impl IntoIterator<Item = TokenRecord>) -> Self {
        let resolver = Self::new();
        for record in records {
            resolver.insert(record);
        }
        resolver
    }

    /// Inserts or replaces a record, keyed by its identifier.
    pub fn insert(&self, record: TokenRecord) {
        self.tokens.insert(record.id.clone(), record);
    }

    /// Removes a record.
    pub fn remove(&self, token: &str) -> Option<TokenRecord> {
        self.tokens.remove(token).map(|(_, record)| record)
    }

    /// Number of stored records, including expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenResolver for InMemoryTokenResolver {
    async fn resolve(
        &self,
        token: &str,
        hint: Option<TokenType>,
    ) -> AuthResult<Option<TokenRecord>> {
        let Some(record) = self.tokens.get(token).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        if let Some(hint) = hint
            && hint != record.token_type
        {
            tracing::trace!(
                hint = %hint,
                actual = %record.token_type,
                "Token type hint does not match resolved token"
            );
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if record.is_expired_at(now) {
            tracing::debug!(expires_at = ?record.expires_at, "Resolved token is expired");
            return Ok(None);
        }

        Ok(Some(record))
    }
}

// =============================================================================
// Service Catalog
// =============================================================================

/// Service catalog holding registrations in memory.
#[derive(Debug, Default)]
pub struct InMemoryServiceCatalog {
    services: DashMap<String, RegisteredService>,
    patterns: DashMap<String, (u64, Regex)>,
}

impl InMemoryServiceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with services.
    ///
    /// # Errors
    ///
    /// Returns an error if any service fails validation.
    pub fn with_services(services: impl IntoIterator<Item = RegisteredService>) -> AuthResult<Self> {
        let catalog = Self::new();
        for service in services {
            catalog.register(service)?;
        }
        Ok(catalog)
    }

    /// Registers or replaces a service, keyed by its client id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the service fails validation.
    pub fn register(&self, service: RegisteredService) -> AuthResult<()> {
        service.validate().map_err(|e| {
            AuthError::configuration(format!("service '{}': {}", service.name, e))
        })?;
        let pattern = service.service_pattern().map_err(|e| {
            AuthError::configuration(format!("service '{}': {}", service.name, e))
        })?;

        self.patterns
            .insert(service.client_id.clone(), (service.id, pattern));
        self.services.insert(service.client_id.clone(), service);
        Ok(())
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryServiceCatalog {
    async fn find_by_service(&self, service: &str) -> AuthResult<Option<RegisteredService>> {
        let client_id = self
            .patterns
            .iter()
            .filter(|entry| entry.value().1.is_match(service))
            .min_by_key(|entry| entry.value().0)
            .map(|entry| entry.key().clone());

        Ok(client_id.and_then(|id| self.services.get(&id).map(|entry| entry.value().clone())))
    }

    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredService>> {
        Ok(self
            .services
            .get(client_id)
            .map(|entry| entry.value().clone()))
    }
}
