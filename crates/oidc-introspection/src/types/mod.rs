//! Domain types shared by the introspection pipeline.
//!
//! ## Domain Types
//!
//! - [`TokenRecord`] - A resolved access or refresh token
//! - [`TokenType`] - Kind of token held by a record
//! - [`RegisteredService`] - A relying party registered in the service catalog

pub mod service;
pub mod token;

pub use service::{RegisteredService, ServiceValidationError};
pub use token::{DPOP_CONFIRMATION_ATTRIBUTE, TokenRecord, TokenType};
