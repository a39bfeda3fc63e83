//! KV v2 secret store client.
//!
//! Talks to the store's HTTP API directly. When a CA certificate is
//! configured the client trusts that certificate and nothing else; the
//! system root store is disabled.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::client::SecretSource;
use super::types::{AccessToken, SecretBundle};
use crate::config::{load_trust_anchors, StoreConfig};
use crate::errors::{CredentialError, Result};

const TOKEN_HEADER: &str = "X-Vault-Token";

#[derive(Debug, Deserialize)]
struct KvReadResponse {
    #[serde(default)]
    data: Option<KvDataEnvelope>,
}

#[derive(Debug, Deserialize)]
struct KvDataEnvelope {
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct StoreErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SecretStoreClient {
    client: Client,
    address: String,
    kv_mount: String,
    pinned: bool,
}

impl SecretStoreClient {
    /// Build the client, loading trust anchors once if TLS pinning is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Config`] when the CA file is missing,
    /// unreadable, or holds no usable certificate.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);

        let pinned = match config.ca_cert_path.as_deref() {
            Some(path) => {
                let anchors = load_trust_anchors(path)?;
                debug!(ca_path = %path.display(), anchors = anchors.len(), "Pinning secret store CA");
                builder = builder.tls_built_in_root_certs(false);
                for anchor in anchors {
                    builder = builder.add_root_certificate(anchor);
                }
                true
            }
            None => false,
        };

        let client = builder.build().map_err(|e| {
            CredentialError::config_with_source("Failed to build secret store HTTP client", Box::new(e))
        })?;

        Ok(Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            kv_mount: config.kv_mount.trim_matches('/').to_string(),
            pinned,
        })
    }

    /// Whether this client trusts only the configured CA.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// KV v2 read URL for a logical path.
    pub fn secret_url(&self, path: &str) -> String {
        format!("{}/v1/{}/data/{}", self.address, self.kv_mount, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SecretSource for SecretStoreClient {
    #[instrument(skip(self, token), fields(pinned = self.pinned))]
    async fn fetch_secret(&self, path: &str, token: &AccessToken) -> Result<SecretBundle> {
        let url = self.secret_url(path);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(TOKEN_HEADER, token.expose())
            .send()
            .await
            .map_err(|e| CredentialError::store_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<StoreErrorResponse>()
                .await
                .ok()
                .filter(|body| !body.errors.is_empty())
                .map(|body| body.errors.join("; "))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request rejected").to_string());
            warn!(status = status.as_u16(), "Secret store rejected read");
            return Err(CredentialError::access_denied(status.as_u16(), detail));
        }

        let body: KvReadResponse = response.json().await.map_err(|e| {
            CredentialError::store_unavailable(format!("Unreadable secret store response: {}", e))
        })?;

        let object = body
            .data
            .and_then(|envelope| envelope.data)
            .ok_or_else(|| CredentialError::secret_not_found(path))?;

        let bundle = SecretBundle::from_json_object(object);
        debug!(entries = bundle.len(), "Fetched secret bundle");
        Ok(bundle)
    }
}
