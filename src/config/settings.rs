//! # Configuration Settings
//!
//! Startup configuration for the bootstrap pipeline. Everything here is read
//! once, validated, and then handed to component constructors; nothing reads
//! the environment at request time.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{CredentialError, Result};
use crate::secrets::SecretString;

pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254";
pub const DEFAULT_LOCAL_STORE_ADDR: &str = "http://localhost:8300";
pub const DEFAULT_CA_CERT_PATH: &str = "vault-droplet/ssl/ca.crt";
pub const DEFAULT_KV_MOUNT: &str = "sm-secrets";
pub const DEFAULT_SECRET_PATH: &str = "openapi_mongodb_credentials";

const METADATA_TIMEOUT_SECS: u64 = 5;
const EXCHANGE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Complete configuration for a [`crate::CredentialResolver`].
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub metadata: MetadataConfig,
    pub exchange: ExchangeConfig,
    pub store: StoreConfig,
}

/// Instance metadata endpoint used for identity attestation.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Base URL, e.g. `http://169.254.169.254`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_METADATA_URL.to_string(),
            timeout: Duration::from_secs(METADATA_TIMEOUT_SECS),
        }
    }
}

/// Token exchange settings.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Base URL of the token-issuing peer
    pub peer_url: Option<String>,
    /// Pre-provisioned token; bypasses the exchange entirely when set
    pub static_token: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            peer_url: None,
            static_token: None,
            timeout: Duration::from_secs(EXCHANGE_TIMEOUT_SECS),
        }
    }
}

/// KV v2 secret store settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL including scheme, e.g. `https://vault.internal:8200`
    pub address: String,
    /// When set, the store client trusts only the certificates in this file
    pub ca_cert_path: Option<PathBuf>,
    pub kv_mount: String,
    /// Logical path of the bundle holding the decryption keys
    pub secret_path: String,
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_LOCAL_STORE_ADDR.to_string(),
            ca_cert_path: None,
            kv_mount: DEFAULT_KV_MOUNT.to_string(),
            secret_path: DEFAULT_SECRET_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

impl StoreConfig {
    pub fn is_pinned(&self) -> bool {
        self.ca_cert_path.is_some()
    }
}

impl BootstrapConfig {
    /// Create configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `CREDBRIDGE_VAULT_TLS_ENABLED` or `SSL_FLAG`: enable the pinned TLS store
    /// - `CREDBRIDGE_VAULT_ADDR` or `VAULT_ADDR`: store host for TLS mode (required then)
    /// - `CREDBRIDGE_VAULT_CA_CERT`: CA file (default: `vault-droplet/ssl/ca.crt`)
    /// - `CREDBRIDGE_VAULT_LOCAL_ADDR`: plain HTTP store (default: `http://localhost:8300`)
    /// - `CREDBRIDGE_VAULT_KV_MOUNT`: KV mount (default: `sm-secrets`)
    /// - `CREDBRIDGE_VAULT_SECRET_PATH`: bundle path (default: `openapi_mongodb_credentials`)
    /// - `CREDBRIDGE_HTTP_TIMEOUT_SECS`: store request timeout (default: 10)
    /// - `CREDBRIDGE_TOKEN_PEER_ADDR` or `VAULT_RETRIEVER_ADDR`: token-issuing peer
    /// - `CREDBRIDGE_STATIC_TOKEN` or `HARDCODED_VAULT_TOKEN`: static token override
    /// - `CREDBRIDGE_METADATA_URL`: metadata base (default: `http://169.254.169.254`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |primary: &str, legacy: Option<&str>| {
            lookup(primary).or_else(|| legacy.and_then(&lookup)).and_then(non_placeholder)
        };

        let tls_enabled = setting("CREDBRIDGE_VAULT_TLS_ENABLED", Some("SSL_FLAG"))
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        let timeout = match setting("CREDBRIDGE_HTTP_TIMEOUT_SECS", None) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    CredentialError::config(format!("Invalid HTTP timeout: {}", raw))
                })?,
            None => Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        };

        let (address, ca_cert_path) = if tls_enabled {
            let host = setting("CREDBRIDGE_VAULT_ADDR", Some("VAULT_ADDR")).ok_or_else(|| {
                CredentialError::config("TLS is enabled but CREDBRIDGE_VAULT_ADDR is not set")
            })?;
            // An explicitly empty CA path is kept so the store client reports it.
            let ca = lookup("CREDBRIDGE_VAULT_CA_CERT")
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CA_CERT_PATH.to_string());
            (with_scheme(&host, "https"), Some(PathBuf::from(ca)))
        } else {
            let local = setting("CREDBRIDGE_VAULT_LOCAL_ADDR", None)
                .unwrap_or_else(|| DEFAULT_LOCAL_STORE_ADDR.to_string());
            (with_scheme(&local, "http"), None)
        };

        let store = StoreConfig {
            address,
            ca_cert_path,
            kv_mount: setting("CREDBRIDGE_VAULT_KV_MOUNT", None)
                .unwrap_or_else(|| DEFAULT_KV_MOUNT.to_string()),
            secret_path: setting("CREDBRIDGE_VAULT_SECRET_PATH", None)
                .unwrap_or_else(|| DEFAULT_SECRET_PATH.to_string()),
            timeout,
        };

        let static_token =
            setting("CREDBRIDGE_STATIC_TOKEN", Some("HARDCODED_VAULT_TOKEN")).map(SecretString::new);
        let peer_url = setting("CREDBRIDGE_TOKEN_PEER_ADDR", Some("VAULT_RETRIEVER_ADDR"))
            .map(|addr| with_scheme(&addr, "http"));

        if static_token.is_none() && peer_url.is_none() {
            return Err(CredentialError::config(
                "Either CREDBRIDGE_STATIC_TOKEN or CREDBRIDGE_TOKEN_PEER_ADDR must be set",
            ));
        }

        let metadata = MetadataConfig {
            base_url: setting("CREDBRIDGE_METADATA_URL", None)
                .map(|url| with_scheme(&url, "http"))
                .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            ..MetadataConfig::default()
        };

        Ok(Self {
            metadata,
            exchange: ExchangeConfig { peer_url, static_token, ..ExchangeConfig::default() },
            store,
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Reads `CREDBRIDGE_LOG_LEVEL` and `CREDBRIDGE_LOG_FORMAT` (`json` or `plain`).
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup("CREDBRIDGE_LOG_LEVEL")
                .and_then(non_placeholder)
                .unwrap_or(defaults.log_level),
            json_logging: lookup("CREDBRIDGE_LOG_FORMAT")
                .map(|format| format.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logging),
        }
    }

    /// Raise the level to `debug` for `--verbose`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }
}

/// Trim a raw value; empty strings and the literal `null` count as unset.
fn non_placeholder(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Prefix `scheme://` unless the address already carries a scheme.
fn with_scheme(address: &str, scheme: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else {
        format!("{}://{}", scheme, address)
    }
}
