//! # Error Handling
//!
//! Error types for the credential bootstrap pipeline. Every layer returns the
//! most specific [`CredentialError`] variant it can; nothing is collapsed into a
//! generic failure on the way up to [`crate::CredentialResolver::resolve`].

pub mod tls;
pub mod types;

pub use tls::TlsError;
pub use types::{CredentialError, Result};
