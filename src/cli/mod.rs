//! Command-line interface for credbridge.

pub mod local;
pub mod resolve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ObservabilityConfig;
use crate::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "credbridge")]
#[command(about = "Bootstrap and decrypt credentials from machine identity and a KV secret store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and print the plaintext
    Resolve(ResolveArgs),

    /// Decrypt a local artifact with a key file, without any network access
    Decrypt {
        /// File holding the URL-safe base64 Fernet key
        #[arg(long)]
        key_file: PathBuf,

        /// Ciphertext artifact
        #[arg(long)]
        artifact: PathBuf,
    },

    /// Encrypt stdin into a ciphertext artifact
    Seal {
        /// File holding the URL-safe base64 Fernet key
        #[arg(long)]
        key_file: PathBuf,

        /// Where to write the artifact
        #[arg(long)]
        out: PathBuf,
    },

    /// Print a freshly generated Fernet key
    Keygen,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Bundle key holding the Fernet key
    #[arg(long, requires = "artifact", conflicts_with_all = ["manifest", "name"])]
    pub key: Option<String>,

    /// Ciphertext artifact
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Credential manifest (TOML)
    #[arg(long, requires = "name")]
    pub manifest: Option<PathBuf>,

    /// Credential name in the manifest
    #[arg(long, requires = "manifest")]
    pub name: Option<String>,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse()).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(&ObservabilityConfig::from_env().with_verbose(cli.verbose));

    match cli.command {
        Commands::Resolve(args) => resolve::handle_resolve_command(args).await?,
        Commands::Decrypt { key_file, artifact } => local::handle_decrypt(&key_file, &artifact)?,
        Commands::Seal { key_file, out } => local::handle_seal(&key_file, &out)?,
        Commands::Keygen => local::handle_keygen(),
    }

    Ok(())
}
