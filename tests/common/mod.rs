//! Shared fixtures for pipeline tests
//!
//! Provides wiremock-based stand-ins for:
//! - the instance metadata service
//! - the token-issuing peer
//! - the KV v2 secret store

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use credbridge::config::{BootstrapConfig, ExchangeConfig, MetadataConfig, StoreConfig};
use credbridge::{FernetCodec, FernetKey, SecretString};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SECRET_PATH: &str = "openapi_mongodb_credentials";
pub const KV_MOUNT: &str = "sm-secrets";
pub const VM_ID: &str = "318734712";
/// Key list as the metadata service serves it, newline-terminated.
pub const PUBLIC_KEYS: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample deploy@droplet\n";
pub const PEER_TOKEN: &str = "hvs.peer-issued";

/// Collection of mock services for pipeline tests
pub struct MockServices {
    pub metadata: MockServer,
    pub peer: MockServer,
    pub store: MockServer,
}

impl MockServices {
    pub async fn start() -> Self {
        Self {
            metadata: MockServer::start().await,
            peer: MockServer::start().await,
            store: MockServer::start().await,
        }
    }

    /// Config that exchanges identity with the mock peer.
    pub fn exchange_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            metadata: MetadataConfig {
                base_url: self.metadata.uri(),
                timeout: Duration::from_secs(2),
            },
            exchange: ExchangeConfig {
                peer_url: Some(self.peer.uri()),
                static_token: None,
                timeout: Duration::from_secs(2),
            },
            store: StoreConfig {
                address: self.store.uri(),
                ca_cert_path: None,
                kv_mount: KV_MOUNT.to_string(),
                secret_path: SECRET_PATH.to_string(),
                timeout: Duration::from_secs(2),
            },
        }
    }

    /// Config that presents a static token and never calls metadata or the peer.
    pub fn static_config(&self, token: &str) -> BootstrapConfig {
        let mut config = self.exchange_config();
        config.exchange.static_token = Some(SecretString::new(token));
        config
    }

    /// Serve the instance id and public keys, each exactly `calls` times.
    pub async fn mount_metadata(&self, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/metadata/v1/id"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}\n", VM_ID)))
            .expect(calls)
            .mount(&self.metadata)
            .await;

        Mock::given(method("GET"))
            .and(path("/metadata/v1/public-keys"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PUBLIC_KEYS))
            .expect(calls)
            .mount(&self.metadata)
            .await;
    }

    /// Peer that answers the identity exchange with `body`. Only the trimmed
    /// attestation matches.
    pub async fn mount_peer(&self, status: u16, body: serde_json::Value, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/fetchVaultToken"))
            .and(body_json(json!({"vmId": VM_ID, "publicKeys": PUBLIC_KEYS.trim()})))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(calls)
            .mount(&self.peer)
            .await;
    }

    pub async fn mount_peer_success(&self) {
        self.mount_peer(200, json!({"result": "success", "token": PEER_TOKEN}), 1).await;
    }

    /// Store that serves `data` to requests carrying `token`.
    pub async fn mount_store(&self, token: &str, data: serde_json::Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", KV_MOUNT, SECRET_PATH)))
            .and(header("X-Vault-Token", token))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "b3f0d1c2",
                "data": {
                    "data": data,
                    "metadata": {"version": 3, "destroyed": false}
                }
            })))
            .expect(calls)
            .mount(&self.store)
            .await;
    }

    pub async fn mount_store_status(&self, status: u16, errors: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{}/data/{}", KV_MOUNT, SECRET_PATH)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"errors": errors})))
            .expect(1)
            .mount(&self.store)
            .await;
    }
}

/// A key plus a temporary directory holding artifacts sealed with it.
pub struct SealedArtifacts {
    pub key: FernetKey,
    pub dir: TempDir,
}

impl SealedArtifacts {
    pub fn new() -> Self {
        Self { key: FernetKey::generate(), dir: TempDir::new().expect("create temp dir") }
    }

    pub fn key_base64(&self) -> String {
        self.key.to_base64().expose_secret().to_string()
    }

    /// Seal `plaintext` into `name`, newline-terminated like a hand-written file.
    pub fn seal(&self, name: &str, plaintext: &str) -> PathBuf {
        let token = FernetCodec::encrypt(&self.key, plaintext.as_bytes()).expect("seal");
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("{}\n", token.to_base64())).expect("write artifact");
        path
    }
}
