//! Collaborator traits for token and service lookups.
//!
//! This module defines the interfaces the introspection core reads from:
//!
//! - [`TokenResolver`] - resolves a token identifier to a token record
//! - [`ServiceCatalog`] - registered services by service URL or client id
//!
//! # Implementations
//!
//! [`memory`] provides `dashmap`-backed implementations used by the server
//! binary and by tests. Persistent backends implement the same traits.

pub mod memory;
pub mod service;
pub mod token;

pub use memory::{InMemoryServiceCatalog, InMemoryTokenResolver};
pub use service::ServiceCatalog;
pub use token::TokenResolver;
