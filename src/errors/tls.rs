use std::path::PathBuf;

use thiserror::Error;

/// Trust-anchor failures surfaced while building the pinned secret-store client.
#[derive(Debug, Error)]
pub enum TlsError {
    /// TLS pinning has been enabled but no CA certificate path was provided.
    #[error("TLS is enabled but CA certificate path is not configured")]
    MissingCaPath,

    /// The CA certificate file could not be read.
    #[error("Failed to read CA certificate at {path}: {source}")]
    CaReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No certificates were found in the supplied PEM file.
    #[error("CA certificate file {path} does not contain any certificates")]
    EmptyCertificateChain { path: PathBuf },

    /// The PEM contents were malformed.
    #[error("CA certificate file {path} is not a valid PEM: {source}")]
    InvalidCertificatePem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate could not be installed into the client trust store.
    #[error("CA certificate from {path} was rejected by the TLS backend: {source}")]
    RejectedCertificate {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
}
