//! Offline commands: `decrypt`, `seal`, `keygen`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::secrets::{FernetCodec, FernetKey, FernetToken};

fn read_key(key_file: &Path) -> Result<FernetKey> {
    let encoded = std::fs::read_to_string(key_file)
        .with_context(|| format!("Failed to read key file: {}", key_file.display()))?;
    Ok(FernetKey::from_base64(&encoded)?)
}

pub fn decrypt_artifact(key_file: &Path, artifact: &Path) -> Result<String> {
    let key = read_key(key_file)?;
    let encoded = std::fs::read_to_string(artifact)
        .with_context(|| format!("Failed to read artifact: {}", artifact.display()))?;
    let token = FernetToken::from_base64(&encoded)?;
    Ok(FernetCodec::decrypt(&key, &token)?)
}

/// Encrypt `plaintext` and write the token, newline-terminated, to `out`.
pub fn seal_artifact(key_file: &Path, plaintext: &[u8], out: &Path) -> Result<FernetToken> {
    let key = read_key(key_file)?;
    let token = FernetCodec::encrypt(&key, plaintext)?;
    std::fs::write(out, format!("{}\n", token.to_base64()))
        .with_context(|| format!("Failed to write artifact: {}", out.display()))?;
    Ok(token)
}

pub fn handle_decrypt(key_file: &Path, artifact: &Path) -> Result<()> {
    let plaintext = decrypt_artifact(key_file, artifact)?;
    println!("{}", plaintext);
    Ok(())
}

pub fn handle_seal(key_file: &Path, out: &Path) -> Result<()> {
    let mut plaintext = Vec::new();
    std::io::stdin().read_to_end(&mut plaintext).context("Failed to read plaintext from stdin")?;
    // A single trailing newline from `echo` is not part of the secret.
    if plaintext.ends_with(b"\n") {
        plaintext.pop();
    }

    let token = seal_artifact(key_file, &plaintext, out)?;
    info!(artifact = %out.display(), token_len = token.len(), "Sealed artifact");
    Ok(())
}

pub fn handle_keygen() {
    println!("{}", FernetKey::generate().to_base64().expose_secret());
}
