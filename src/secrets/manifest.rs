//! Named credential manifests.
//!
//! A manifest pairs a friendly name with the bundle key holding the Fernet key
//! and the local artifact holding the ciphertext:
//!
//! ```toml
//! [[credential]]
//! name = "ocr-api-key"
//! key = "FERNET_KEY_AZURE_OCR_KEY"
//! artifact = "artifacts/azure_ocr_key.enc"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{CredentialError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialEntry {
    pub name: String,
    /// Bundle key holding the Fernet key
    pub key: String,
    /// Ciphertext file; relative paths resolve against the manifest directory
    pub artifact: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialManifest {
    #[serde(default, rename = "credential")]
    entries: Vec<CredentialEntry>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl CredentialManifest {
    /// Parse a manifest. Duplicate or blank names are rejected.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(source).map_err(|e| {
            CredentialError::config_with_source("Invalid credential manifest", Box::new(e))
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.entries {
            if entry.name.trim().is_empty() || entry.key.trim().is_empty() {
                return Err(CredentialError::config("Credential entries need a name and a key"));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(CredentialError::config(format!(
                    "Duplicate credential name in manifest: {}",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Load a manifest file; its directory becomes the base for relative artifacts.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            CredentialError::config_with_source(
                format!("Failed to read credential manifest {}", path.display()),
                Box::new(e),
            )
        })?;

        let mut manifest = Self::from_toml_str(&source)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        Ok(manifest)
    }

    pub fn get(&self, name: &str) -> Result<&CredentialEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| CredentialError::config(format!("Unknown credential: {}", name)))
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    /// Where the artifact for `entry` lives on disk.
    pub fn artifact_path(&self, entry: &CredentialEntry) -> PathBuf {
        match &self.base_dir {
            Some(base) if entry.artifact.is_relative() => base.join(&entry.artifact),
            _ => entry.artifact.clone(),
        }
    }
}
