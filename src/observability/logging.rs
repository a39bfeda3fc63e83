//! # Structured Logging
//!
//! Subscriber setup for the `tracing` ecosystem. `RUST_LOG` always wins over
//! the configured level. Secret values never reach a log line; only presence
//! flags and lengths are recorded.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{BootstrapConfig, ObservabilityConfig};

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. by an
/// embedding application or an earlier test); that is not an error.
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.is_ok()
}

/// Log configuration information at startup
pub fn log_config_info(config: &BootstrapConfig) {
    tracing::info!(
        app_name = crate::APP_NAME,
        version = crate::VERSION,
        store_address = %config.store.address,
        kv_mount = %config.store.kv_mount,
        secret_path = %config.store.secret_path,
        tls_pinned = config.store.is_pinned(),
        static_token = config.exchange.static_token.is_some(),
        token_peer = config.exchange.peer_url.is_some(),
        metadata_url = %config.metadata.base_url,
        "Credential bootstrap configuration"
    );
}
