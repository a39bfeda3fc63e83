//! Machine-identity token exchange.
//!
//! The instance metadata service attests who we are (instance id and the
//! public keys provisioned on the machine); a token-issuing peer trades that
//! attestation for a short-lived store token.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::client::TokenSource;
use super::types::{AccessToken, SecretString};
use crate::config::{ExchangeConfig, MetadataConfig};
use crate::errors::{CredentialError, Result};

const ID_PATH: &str = "/metadata/v1/id";
const PUBLIC_KEYS_PATH: &str = "/metadata/v1/public-keys";
const EXCHANGE_PATH: &str = "/fetchVaultToken";
const SUCCESS_RESULT: &str = "success";

/// Message used when the peer refuses without saying why.
pub const DEFAULT_UNAUTHORIZED_MESSAGE: &str = "Unauthorized VM for accessing Vault token";

/// Attestation presented to the token-issuing peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdentity {
    pub vm_id: String,
    /// Newline-separated key list, trimmed of the trailing newline
    pub public_keys: String,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    result: String,
    #[serde(default)]
    token: Option<SecretString>,
    #[serde(default)]
    error: Option<String>,
}

/// Obtains store tokens either from static configuration or by exchanging
/// machine identity with a peer.
#[derive(Debug, Clone)]
pub struct IdentityTokenExchanger {
    metadata: MetadataConfig,
    exchange: ExchangeConfig,
    metadata_client: Client,
    exchange_client: Client,
}

impl IdentityTokenExchanger {
    /// Build the exchanger. Fails when neither a static token nor a peer is
    /// configured, since no token could ever be produced.
    pub fn new(metadata: MetadataConfig, exchange: ExchangeConfig) -> Result<Self> {
        let has_static = exchange.static_token.as_ref().is_some_and(|t| !t.is_empty());
        if !has_static && exchange.peer_url.is_none() {
            return Err(CredentialError::config(
                "Token exchange needs either a static token or a peer address",
            ));
        }

        let metadata_client = Client::builder().timeout(metadata.timeout).build().map_err(|e| {
            CredentialError::config_with_source("Failed to build metadata HTTP client", Box::new(e))
        })?;
        let exchange_client = Client::builder().timeout(exchange.timeout).build().map_err(|e| {
            CredentialError::config_with_source("Failed to build token peer HTTP client", Box::new(e))
        })?;

        Ok(Self { metadata, exchange, metadata_client, exchange_client })
    }

    /// Read this machine's identity from the metadata service.
    ///
    /// Both documents are requested concurrently; either failing aborts the
    /// exchange.
    #[instrument(skip(self), fields(metadata_url = %self.metadata.base_url))]
    pub async fn fetch_identity(&self) -> Result<InstanceIdentity> {
        let (vm_id, public_keys) =
            tokio::try_join!(self.fetch_metadata(ID_PATH), self.fetch_metadata(PUBLIC_KEYS_PATH))?;

        debug!(vm_id = %vm_id, key_bytes = public_keys.len(), "Read instance identity");
        Ok(InstanceIdentity { vm_id, public_keys })
    }

    /// GET one metadata document, trimmed of surrounding whitespace.
    async fn fetch_metadata(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.metadata.base_url.trim_end_matches('/'), path);

        let response = self
            .metadata_client
            .get(&url)
            .send()
            .await
            .map_err(|e| CredentialError::metadata_unavailable(&url, e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(CredentialError::metadata_unavailable(
                &url,
                format!("HTTP {}", response.status().as_u16()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CredentialError::metadata_unavailable(&url, e.to_string()))?;
        Ok(text.trim().to_string())
    }

    #[instrument(skip_all, fields(peer = %peer_url))]
    async fn exchange_identity(&self, peer_url: &str, identity: &InstanceIdentity) -> Result<AccessToken> {
        let url = format!("{}{}", peer_url.trim_end_matches('/'), EXCHANGE_PATH);

        let response = self
            .exchange_client
            .post(&url)
            .json(identity)
            .send()
            .await
            .map_err(|e| CredentialError::token_exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Token peer returned an error status");
            return Err(CredentialError::token_exchange_status(status.as_u16()));
        }

        let body: TokenExchangeResponse = response.json().await.map_err(|e| {
            CredentialError::token_exchange(format!("Unreadable token peer response: {}", e))
        })?;

        if body.result != SUCCESS_RESULT {
            let message = body
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UNAUTHORIZED_MESSAGE.to_string());
            warn!(result = %body.result, "Token peer refused this instance");
            return Err(CredentialError::unauthorized(message));
        }

        match body.token {
            Some(token) if !token.is_empty() => {
                info!("Obtained store token from peer");
                Ok(AccessToken::from(token))
            }
            _ => Err(CredentialError::token_exchange("Token peer reported success without a token")),
        }
    }
}

#[async_trait]
impl TokenSource for IdentityTokenExchanger {
    async fn obtain_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.exchange.static_token.as_ref().filter(|t| !t.is_empty()) {
            debug!("Using static store token");
            return Ok(AccessToken::from(token.clone()));
        }

        let peer_url = self.exchange.peer_url.as_deref().ok_or_else(|| {
            CredentialError::config("Token exchange needs either a static token or a peer address")
        })?;

        let identity = self.fetch_identity().await?;
        self.exchange_identity(peer_url, &identity).await
    }
}
