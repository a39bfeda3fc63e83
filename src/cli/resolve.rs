//! `credbridge resolve`

use anyhow::{bail, Context, Result};

use super::ResolveArgs;
use crate::config::BootstrapConfig;
use crate::observability::log_config_info;
use crate::secrets::{CredentialManifest, CredentialResolver};

pub async fn handle_resolve_command(args: ResolveArgs) -> Result<()> {
    let config = BootstrapConfig::from_env().context("Failed to load bootstrap configuration")?;
    log_config_info(&config);

    let resolver =
        CredentialResolver::from_config(config).context("Failed to initialise credential resolver")?;

    let plaintext = match args {
        ResolveArgs { key: Some(key), artifact: Some(artifact), .. } => resolver
            .resolve(&key, &artifact)
            .await
            .with_context(|| format!("Failed to resolve {}", key))?,
        ResolveArgs { manifest: Some(manifest), name: Some(name), .. } => {
            let manifest = CredentialManifest::load(&manifest)?;
            resolver
                .resolve_named(&manifest, &name)
                .await
                .with_context(|| format!("Failed to resolve {}", name))?
        }
        _ => bail!("Pass either --key with --artifact, or --manifest with --name"),
    };

    println!("{}", plaintext.expose_secret());
    Ok(())
}
