//! # Configuration Management
//!
//! Environment-driven startup configuration for the bootstrap pipeline, plus
//! loading of the pinned trust anchors for the secret store.

pub mod settings;
pub mod tls;

pub use settings::{
    BootstrapConfig, ExchangeConfig, MetadataConfig, ObservabilityConfig, StoreConfig,
    DEFAULT_CA_CERT_PATH, DEFAULT_KV_MOUNT, DEFAULT_LOCAL_STORE_ADDR, DEFAULT_METADATA_URL,
    DEFAULT_SECRET_PATH,
};
pub use tls::load_trust_anchors;
