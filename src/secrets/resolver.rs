//! The credential bootstrap pipeline.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::client::{SecretSource, StaticTokenSource, TokenSource};
use super::fernet::FernetCodec;
use super::identity::IdentityTokenExchanger;
use super::manifest::CredentialManifest;
use super::store::SecretStoreClient;
use super::types::{AccessToken, SecretString};
use crate::config::BootstrapConfig;
use crate::errors::{CredentialError, Result};

/// Turns a bundle key name and a local ciphertext artifact into plaintext.
///
/// Every call runs the whole pipeline: obtain a token, fetch the bundle, read
/// the artifact, decrypt. Nothing is cached between calls, so concurrent calls
/// are independent.
#[derive(Clone)]
pub struct CredentialResolver {
    tokens: Arc<dyn TokenSource>,
    store: Arc<dyn SecretSource>,
    secret_path: String,
}

impl CredentialResolver {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        store: Arc<dyn SecretSource>,
        secret_path: impl Into<String>,
    ) -> Self {
        Self { tokens, store, secret_path: secret_path.into() }
    }

    /// Wire up the token source and HTTP-backed store client.
    ///
    /// A non-empty static token is used as-is and never triggers identity
    /// exchange. Fails with a configuration error if the store's CA cannot be
    /// loaded or no token source is configured.
    pub fn from_config(config: BootstrapConfig) -> Result<Self> {
        let BootstrapConfig { metadata, exchange, store } = config;
        let secret_path = store.secret_path.clone();

        let tokens: Arc<dyn TokenSource> =
            match exchange.static_token.as_ref().filter(|token| !token.is_empty()) {
                Some(token) => Arc::new(StaticTokenSource::new(AccessToken::from(token.clone()))),
                None => Arc::new(IdentityTokenExchanger::new(metadata, exchange)?),
            };
        let store = SecretStoreClient::new(store)?;

        Ok(Self::new(tokens, Arc::new(store), secret_path))
    }

    /// Resolve one credential.
    ///
    /// The artifact is only read once the store has returned a usable key, so
    /// a store failure never touches the local filesystem.
    #[instrument(skip_all, fields(key = %secret_key_name))]
    pub async fn resolve(
        &self,
        secret_key_name: &str,
        local_ciphertext_path: impl AsRef<Path>,
    ) -> Result<SecretString> {
        let path = local_ciphertext_path.as_ref();

        let token = self.tokens.obtain_token().await?;
        let bundle = self.store.fetch_secret(&self.secret_path, &token).await?;

        let fernet_key = bundle.get(secret_key_name)?;
        if fernet_key.expose_secret().trim().is_empty() {
            return Err(CredentialError::config(format!(
                "Secret {} is set but empty",
                secret_key_name
            )));
        }
        debug!(key_len = fernet_key.len(), "Found decryption key");

        let artifact = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CredentialError::local_artifact_unreadable(path, e))?;

        let plaintext = FernetCodec::decrypt_encoded(fernet_key.expose_secret(), artifact.trim())?;
        info!(artifact = %path.display(), "Resolved credential");
        Ok(SecretString::new(plaintext))
    }

    /// Resolve a credential by its manifest name.
    pub async fn resolve_named(&self, manifest: &CredentialManifest, name: &str) -> Result<SecretString> {
        let entry = manifest.get(name)?;
        self.resolve(&entry.key, manifest.artifact_path(entry)).await
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver").field("secret_path", &self.secret_path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::fernet::FernetKey;
    use crate::secrets::types::{AccessToken, SecretBundle};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    struct FixedToken;

    #[async_trait]
    impl TokenSource for FixedToken {
        async fn obtain_token(&self) -> Result<AccessToken> {
            Ok(AccessToken::new("s.test"))
        }
    }

    struct RefusingToken;

    #[async_trait]
    impl TokenSource for RefusingToken {
        async fn obtain_token(&self) -> Result<AccessToken> {
            Err(CredentialError::unauthorized("vm not allowlisted"))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        entries: Vec<(String, String)>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                entries: entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SecretSource for MemoryStore {
        async fn fetch_secret(&self, path: &str, token: &AccessToken) -> Result<SecretBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(path, "app/credentials");
            assert_eq!(token.expose(), "s.test");
            Ok(self.entries.iter().cloned().collect())
        }
    }

    fn sealed_artifact(key: &FernetKey, plaintext: &str) -> NamedTempFile {
        let token = FernetCodec::encrypt(key, plaintext.as_bytes()).unwrap();
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), format!("{}\n", token.to_base64())).unwrap();
        file
    }

    fn resolver(tokens: Arc<dyn TokenSource>, store: Arc<MemoryStore>) -> CredentialResolver {
        CredentialResolver::new(tokens, store, "app/credentials")
    }

    #[tokio::test]
    async fn test_resolve_round_trip() {
        let key = FernetKey::generate();
        let artifact = sealed_artifact(&key, "hello-secret");
        let store = Arc::new(MemoryStore::with(&[("K1", key.to_base64().expose_secret())]));

        let plaintext = resolver(Arc::new(FixedToken), store.clone())
            .resolve("K1", artifact.path())
            .await
            .unwrap();

        assert_eq!(plaintext.expose_secret(), "hello-secret");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_does_not_cache() {
        let key = FernetKey::generate();
        let artifact = sealed_artifact(&key, "hello-secret");
        let store = Arc::new(MemoryStore::with(&[("K1", key.to_base64().expose_secret())]));
        let resolver = resolver(Arc::new(FixedToken), store.clone());

        resolver.resolve("K1", artifact.path()).await.unwrap();
        resolver.resolve("K1", artifact.path()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_token_error_propagates_before_store() {
        let store = Arc::new(MemoryStore::default());
        let err = resolver(Arc::new(RefusingToken), store.clone())
            .resolve("K1", "/nonexistent/artifact")
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Unauthorized { ref message } if message == "vm not allowlisted"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = Arc::new(MemoryStore::with(&[("OTHER", "value")]));
        let err = resolver(Arc::new(FixedToken), store)
            .resolve("K1", "/nonexistent/artifact")
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::SecretNotFound { ref key } if key == "K1"));
    }

    #[tokio::test]
    async fn test_empty_key_is_config_error() {
        let store = Arc::new(MemoryStore::with(&[("K1", "  ")]));
        let err = resolver(Arc::new(FixedToken), store)
            .resolve("K1", "/nonexistent/artifact")
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Config { .. }));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_unreadable() {
        let key = FernetKey::generate();
        let store = Arc::new(MemoryStore::with(&[("K1", key.to_base64().expose_secret())]));
        let err = resolver(Arc::new(FixedToken), store)
            .resolve("K1", "/nonexistent/artifact")
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::LocalArtifactUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_wrong_key_is_integrity_failure() {
        let artifact = sealed_artifact(&FernetKey::generate(), "hello-secret");
        let other = FernetKey::generate();
        let store = Arc::new(MemoryStore::with(&[("K1", other.to_base64().expose_secret())]));

        let err = resolver(Arc::new(FixedToken), store)
            .resolve("K1", artifact.path())
            .await
            .unwrap_err();

        assert!(err.is_integrity_failure());
    }
}
