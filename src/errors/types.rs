//! # Error Types
//!
//! The error taxonomy of the credential bootstrap pipeline, built on `thiserror`.

use std::path::PathBuf;

use super::tls::TlsError;

/// Result type for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors produced while bootstrapping, fetching, or decrypting a credential.
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// Missing or invalid static settings; fatal to the calling construction step.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The instance metadata service was unreachable or answered non-200.
    #[error("Instance metadata unavailable at {url}: {message}")]
    MetadataUnavailable { url: String, message: String },

    /// The token-issuing peer answered with a failure status or could not be reached.
    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed { message: String, status: Option<u16> },

    /// The token-issuing peer refused to issue a token for this identity.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The secret store rejected the request.
    #[error("Secret store access denied (status: {status}): {message}")]
    AccessDenied { status: u16, message: String },

    /// The secret store could not be reached or returned an unreadable body.
    #[error("Secret store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The requested key is absent from the secret bundle.
    #[error("Secret not found: {key}")]
    SecretNotFound { key: String },

    /// A Fernet key did not decode to exactly 32 bytes.
    #[error("Invalid Fernet key length: expected 32 bytes, got {length}")]
    InvalidKeyLength { length: usize },

    /// A Fernet token is shorter than the fixed header plus tag.
    #[error("Invalid Fernet token: {length} bytes is below the 57 byte minimum")]
    TokenTooShort { length: usize },

    /// A Fernet token carries a version byte other than 0x80.
    #[error("Unsupported Fernet version: {version:#04x}")]
    UnsupportedVersion { version: u8 },

    /// A key or token was not valid URL-safe base64.
    #[error("Invalid {field} encoding: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },

    /// HMAC verification of a Fernet token failed.
    #[error("Fernet token failed HMAC verification")]
    IntegrityFailure,

    /// The ciphertext was not block aligned or its padding was invalid.
    #[error("Malformed ciphertext: {reason}")]
    MalformedCiphertext { reason: String },

    /// The decrypted plaintext was not valid UTF-8.
    #[error("Decrypted plaintext is not valid UTF-8: {reason}")]
    Decoding { reason: String },

    /// The local ciphertext artifact could not be read.
    #[error("Failed to read ciphertext artifact at {path}: {source}")]
    LocalArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CredentialError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error that keeps its underlying cause
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    pub fn metadata_unavailable<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::MetadataUnavailable { url: url.into(), message: message.into() }
    }

    /// Exchange failure reported with an HTTP status from the peer.
    pub fn token_exchange_status(status: u16) -> Self {
        Self::TokenExchangeFailed { message: format!("HTTP {}", status), status: Some(status) }
    }

    /// Exchange failure without a status (transport error, unreadable body).
    pub fn token_exchange<S: Into<String>>(message: S) -> Self {
        Self::TokenExchangeFailed { message: message.into(), status: None }
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn access_denied<S: Into<String>>(status: u16, message: S) -> Self {
        Self::AccessDenied { status, message: message.into() }
    }

    pub fn store_unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable { message: message.into() }
    }

    pub fn secret_not_found<S: Into<String>>(key: S) -> Self {
        Self::SecretNotFound { key: key.into() }
    }

    pub fn invalid_encoding<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidEncoding { field, reason: reason.into() }
    }

    pub fn malformed_ciphertext<S: Into<String>>(reason: S) -> Self {
        Self::MalformedCiphertext { reason: reason.into() }
    }

    pub fn local_artifact_unreadable<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::LocalArtifactUnreadable { path: path.into(), source }
    }

    /// True when a token failed authentication. Callers should treat this as
    /// possible tampering rather than an ordinary I/O problem.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::IntegrityFailure)
    }

    /// HTTP status carried by the error, if the remote side supplied one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AccessDenied { status, .. } => Some(*status),
            Self::TokenExchangeFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable, log-friendly label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "configuration",
            Self::MetadataUnavailable { .. } => "metadata_unavailable",
            Self::TokenExchangeFailed { .. } => "token_exchange_failed",
            Self::Unauthorized { .. } => "unauthorized",
            Self::AccessDenied { .. } => "access_denied",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::SecretNotFound { .. } => "secret_not_found",
            Self::InvalidKeyLength { .. }
            | Self::TokenTooShort { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidEncoding { .. } => "invalid_input",
            Self::IntegrityFailure => "integrity_failure",
            Self::MalformedCiphertext { .. } => "malformed_ciphertext",
            Self::Decoding { .. } => "decoding",
            Self::LocalArtifactUnreadable { .. } => "local_artifact_unreadable",
        }
    }
}

impl From<TlsError> for CredentialError {
    fn from(error: TlsError) -> Self {
        Self::config_with_source("Invalid secret store TLS trust anchor", Box::new(error))
    }
}
