//! Credential bootstrap and decryption.
//!
//! # Architecture
//!
//! ```text
//! CredentialResolver ─▶ TokenSource (IdentityTokenExchanger | StaticTokenSource)
//!        │                   └─▶ instance metadata ─▶ token peer
//!        ├────────────▶ SecretSource (SecretStoreClient, KV v2, optional pinned CA)
//!        └────────────▶ local artifact ─▶ FernetCodec ─▶ plaintext
//! ```
//!
//! The resolver depends on [`TokenSource`] and [`SecretSource`] trait objects,
//! so tests and embedders can substitute either side.
//!
//! # Example
//!
//! ```rust,ignore
//! use credbridge::{BootstrapConfig, CredentialResolver};
//!
//! let resolver = CredentialResolver::from_config(BootstrapConfig::from_env()?)?;
//! let api_key = resolver.resolve("FERNET_KEY_AZURE_OCR_KEY", "artifacts/azure_ocr_key.enc").await?;
//! ```

pub mod client;
pub mod fernet;
pub mod identity;
pub mod manifest;
pub mod resolver;
pub mod store;
pub mod types;

pub use client::{SecretSource, StaticTokenSource, TokenSource};
pub use fernet::{FernetCodec, FernetKey, FernetToken, FERNET_VERSION, MIN_TOKEN_LEN};
pub use identity::{IdentityTokenExchanger, InstanceIdentity, DEFAULT_UNAUTHORIZED_MESSAGE};
pub use manifest::{CredentialEntry, CredentialManifest};
pub use resolver::CredentialResolver;
pub use store::SecretStoreClient;
pub use types::{AccessToken, SecretBundle, SecretString};
