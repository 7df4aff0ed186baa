//! Resolved token records.
//!
//! A [`TokenRecord`] is what the token resolver hands back for a known,
//! unexpired token identifier. The introspection core only reads it.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Authentication attribute carrying the DPoP key thumbprint a token is bound to.
pub const DPOP_CONFIRMATION_ATTRIBUTE: &str = "DPoPConfirmation";

// =============================================================================
// Token Type
// =============================================================================

/// Kind of token held by a record.
///
/// Also used for the `token_type_hint` request parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// An OAuth 2.0 access token.
    #[default]
    AccessToken,
    /// An OAuth 2.0 refresh token.
    RefreshToken,
}

impl TokenType {
    /// Returns the token type as used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Parses a `token_type_hint` value. Unknown hints yield `None`.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint {
            "access_token" => Some(Self::AccessToken),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Token Record
// =============================================================================

/// A token resolved from the token registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token identifier as presented by the client.
    pub id: String,

    /// Service URL the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Client the token was issued to.
    pub client_id: String,

    /// Authenticated principal (subject).
    pub principal: String,

    /// Kind of token.
    #[serde(default)]
    pub token_type: TokenType,

    /// Granted scopes, kept in grant order.
    #[serde(default)]
    pub scopes: IndexSet<String>,

    /// Authentication attributes, each with one or more values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,

    /// Issued-at time (Unix timestamp).
    pub issued_at: i64,

    /// Expiration time (Unix timestamp). `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl TokenRecord {
    /// Creates an access token record issued now, with no service, scopes or attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            service: None,
            client_id: client_id.into(),
            principal: principal.into(),
            token_type: TokenType::AccessToken,
            scopes: IndexSet::new(),
            attributes: BTreeMap::new(),
            issued_at: OffsetDateTime::now_utc().unix_timestamp(),
            expires_at: None,
        }
    }

    /// Sets the owning service URL.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Adds granted scopes. Duplicates are ignored.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Appends values to an authentication attribute.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets the issued-at time.
    #[must_use]
    pub fn with_issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns `true` if the token is expired at the given Unix time.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Returns the granted scopes joined by single spaces, in grant order.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns all values of an authentication attribute.
    #[must_use]
    pub fn attribute_values(&self, name: &str) -> &[String] {
        self.attributes
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the DPoP key thumbprint this token is bound to.
    ///
    /// Only the first value of the attribute is considered.
    #[must_use]
    pub fn dpop_thumbprint(&self) -> Option<&str> {
        self.attribute_values(DPOP_CONFIRMATION_ATTRIBUTE)
            .first()
            .map(String::as_str)
    }
}
