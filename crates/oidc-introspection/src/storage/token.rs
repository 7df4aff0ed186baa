//! Token resolver trait.
//!
//! Defines the interface to the token registry. The introspection core never
//! stores tokens itself.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{TokenRecord, TokenType};

/// Resolves token identifiers to token records.
///
/// Implementations must be safe for concurrent use by many requests.
///
/// # Example
///
/// ```ignore
/// use oidc_introspection::storage::TokenResolver;
///
/// async fn example(resolver: &impl TokenResolver) {
///     match resolver.resolve("AT-1", None).await? {
///         Some(record) => println!("scopes: {}", record.scope_string()),
///         None => println!("unknown or expired"),
///     }
/// }
/// ```
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// Resolve a token identifier.
    ///
    /// Returns `None` if the token is unknown or expired. The hint may be
    /// used to narrow the lookup but must not cause a known token of the
    /// other type to be missed.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    async fn resolve(
        &self,
        token: &str,
        hint: Option<TokenType>,
    ) -> AuthResult<Option<TokenRecord>>;
}
