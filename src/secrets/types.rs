//! Secure types for handling credential material.
//!
//! Secret values, access tokens, and fetched bundles redact themselves in
//! Debug output so they cannot leak through logging.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{CredentialError, Result};

/// Zeroized-on-drop string whose value is only reachable via [`SecretString::expose_secret`].
///
/// Not `PartialEq`; secret material is never compared with `==`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Short-lived credential presented to the secret store.
///
/// Expiry is owned by the issuing service; tokens are never cached or refreshed here.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token))
    }

    /// Raw token value, for placing in the store's auth header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken([REDACTED])")
    }
}

impl From<SecretString> for AccessToken {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

/// Secret name to value mapping returned by the store for one logical path.
#[derive(Clone, Default)]
pub struct SecretBundle {
    entries: HashMap<String, SecretString>,
}

impl SecretBundle {
    /// Build a bundle from the inner `data.data` object of a KV v2 envelope.
    ///
    /// String values are kept verbatim, numbers and booleans keep their JSON
    /// text, and nulls, arrays, and objects are not credential values so they
    /// are left out.
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        let entries = object
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name, SecretString::new(value)))
            })
            .collect();
        Self { entries }
    }

    /// Look up a secret by exact name. Absence is an error, never an empty value.
    pub fn get(&self, name: &str) -> Result<&SecretString> {
        self.entries.get(name).ok_or_else(|| CredentialError::secret_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Secret names, without values.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<SecretString>> FromIterator<(K, V)> for SecretBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("SecretBundle").field("names", &names).finish()
    }
}
