//! Seams between the resolver and its remote collaborators.

use async_trait::async_trait;

use super::types::{AccessToken, SecretBundle};
use crate::errors::Result;

/// Something that can produce a store access token.
///
/// Implementations MUST NOT log the token value.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a token for the secret store.
    ///
    /// # Errors
    ///
    /// - [`crate::CredentialError::MetadataUnavailable`] if instance identity cannot be read
    /// - [`crate::CredentialError::TokenExchangeFailed`] if the issuing peer fails
    /// - [`crate::CredentialError::Unauthorized`] if the peer refuses this identity
    async fn obtain_token(&self) -> Result<AccessToken>;
}

/// Something that can read a secret bundle from a logical path.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch the bundle stored at `path`.
    ///
    /// # Errors
    ///
    /// - [`crate::CredentialError::AccessDenied`] on any non-success status
    /// - [`crate::CredentialError::StoreUnavailable`] on transport or body errors
    /// - [`crate::CredentialError::SecretNotFound`] if the response holds no bundle
    async fn fetch_secret(&self, path: &str, token: &AccessToken) -> Result<SecretBundle>;
}

/// A token that was provisioned out of band. Never touches the network.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: AccessToken,
}

impl StaticTokenSource {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn obtain_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}
