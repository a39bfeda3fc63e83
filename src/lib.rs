//! # credbridge
//!
//! Bootstraps application credentials at startup. A short-lived store token
//! is obtained (statically configured, or exchanged for machine identity
//! attested by the instance metadata service), a Fernet key is fetched from a
//! KV v2 secret store, and a locally stored Fernet token is decrypted with it.
//!
//! ```text
//! caller → CredentialResolver → token exchange → SecretStoreClient → FernetCodec → plaintext
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use credbridge::{BootstrapConfig, CredentialResolver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let resolver = CredentialResolver::from_config(BootstrapConfig::from_env()?)?;
//!     let host = resolver.resolve("FERNET_KEY_AZURE_OCR_HOST", "artifacts/azure_ocr_host.enc").await?;
//!     println!("resolved {} bytes", host.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{BootstrapConfig, ObservabilityConfig};
pub use errors::{CredentialError, Result};
pub use secrets::{
    AccessToken, CredentialManifest, CredentialResolver, FernetCodec, FernetKey, FernetToken,
    IdentityTokenExchanger, SecretBundle, SecretSource, SecretStoreClient, SecretString,
    TokenSource,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
