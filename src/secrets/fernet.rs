//! Fernet authenticated-encryption codec.
//!
//! Token layout (all offsets in bytes):
//!
//! ```text
//! | 0x80 | timestamp (8, big-endian) | IV (16) | ciphertext (n * 16) | HMAC-SHA256 (32) |
//! ```
//!
//! The tag covers every byte before it and is checked in constant time before
//! any decryption is attempted. The timestamp is parsed but no freshness window
//! is enforced: a token is accepted for as long as its key is.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::types::SecretString;
use crate::errors::{CredentialError, Result};

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// The only supported token version.
pub const FERNET_VERSION: u8 = 0x80;

const KEY_LEN: usize = 32;
const HALF_KEY_LEN: usize = 16;
const TIMESTAMP_END: usize = 9;
const IV_LEN: usize = 16;
const IV_END: usize = TIMESTAMP_END + IV_LEN;
const TAG_LEN: usize = 32;

/// Version + timestamp + IV + tag, i.e. a token with an empty ciphertext.
pub const MIN_TOKEN_LEN: usize = IV_END + TAG_LEN;

/// URL-safe alphabet that encodes with padding and decodes with or without it.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A 32-byte Fernet key split into its signing and encryption halves.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FernetKey {
    signing: [u8; HALF_KEY_LEN],
    encryption: [u8; HALF_KEY_LEN],
}

impl FernetKey {
    /// Build a key from raw bytes; anything other than 32 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(CredentialError::InvalidKeyLength { length: bytes.len() });
        }

        let mut signing = [0u8; HALF_KEY_LEN];
        let mut encryption = [0u8; HALF_KEY_LEN];
        signing.copy_from_slice(&bytes[..HALF_KEY_LEN]);
        encryption.copy_from_slice(&bytes[HALF_KEY_LEN..]);
        Ok(Self { signing, encryption })
    }

    /// Decode a URL-safe base64 key. Surrounding whitespace is ignored.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut bytes = URL_SAFE_LENIENT
            .decode(encoded.trim())
            .map_err(|e| CredentialError::invalid_encoding("Fernet key", e.to_string()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Generate a fresh random key from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        let mut signing = [0u8; HALF_KEY_LEN];
        let mut encryption = [0u8; HALF_KEY_LEN];
        signing.copy_from_slice(&bytes[..HALF_KEY_LEN]);
        encryption.copy_from_slice(&bytes[HALF_KEY_LEN..]);
        bytes.zeroize();
        Self { signing, encryption }
    }

    /// URL-safe base64 encoding of the full 32-byte key.
    pub fn to_base64(&self) -> SecretString {
        let mut bytes = [0u8; KEY_LEN];
        bytes[..HALF_KEY_LEN].copy_from_slice(&self.signing);
        bytes[HALF_KEY_LEN..].copy_from_slice(&self.encryption);
        let encoded = URL_SAFE_LENIENT.encode(bytes);
        bytes.zeroize();
        SecretString::new(encoded)
    }
}

impl fmt::Debug for FernetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FernetKey([REDACTED])")
    }
}

/// A structurally valid Fernet token: long enough and carrying version 0x80.
///
/// Construction does no cryptography; authenticity is only established by
/// [`FernetCodec::decrypt`].
#[derive(Clone, PartialEq, Eq)]
pub struct FernetToken {
    bytes: Vec<u8>,
}

impl FernetToken {
    /// Validate the length and version of raw token bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_TOKEN_LEN {
            return Err(CredentialError::TokenTooShort { length: bytes.len() });
        }
        if bytes[0] != FERNET_VERSION {
            return Err(CredentialError::UnsupportedVersion { version: bytes[0] });
        }
        Ok(Self { bytes })
    }

    /// Decode a URL-safe base64 token. Surrounding whitespace is ignored.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_LENIENT
            .decode(encoded.trim())
            .map_err(|e| CredentialError::invalid_encoding("Fernet token", e.to_string()))?;
        Self::from_bytes(bytes)
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE_LENIENT.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Seconds since the UNIX epoch, as written by the issuer. Informational only.
    pub fn timestamp(&self) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bytes[1..TIMESTAMP_END]);
        u64::from_be_bytes(raw)
    }

    /// The header timestamp as a UTC instant, if it is representable.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp()).ok().and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    fn tag_start(&self) -> usize {
        self.bytes.len() - TAG_LEN
    }

    fn iv(&self) -> &[u8] {
        &self.bytes[TIMESTAMP_END..IV_END]
    }

    fn ciphertext(&self) -> &[u8] {
        &self.bytes[IV_END..self.tag_start()]
    }

    fn signed_region(&self) -> &[u8] {
        &self.bytes[..self.tag_start()]
    }

    fn tag(&self) -> &[u8] {
        &self.bytes[self.tag_start()..]
    }
}

impl fmt::Debug for FernetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FernetToken")
            .field("len", &self.bytes.len())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

/// Stateless Fernet encryption and decryption.
pub struct FernetCodec;

impl FernetCodec {
    /// Authenticate and decrypt a token, returning the UTF-8 plaintext.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::IntegrityFailure`] if the HMAC tag does not match;
    ///   no decryption is attempted in that case
    /// - [`CredentialError::MalformedCiphertext`] on block alignment or padding errors
    /// - [`CredentialError::Decoding`] if the plaintext is not UTF-8
    pub fn decrypt(key: &FernetKey, token: &FernetToken) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&key.signing)
            .map_err(|_| CredentialError::InvalidKeyLength { length: key.signing.len() })?;
        mac.update(token.signed_region());
        // verify_slice compares in constant time
        mac.verify_slice(token.tag()).map_err(|_| CredentialError::IntegrityFailure)?;

        let plaintext = Aes128CbcDec::new_from_slices(&key.encryption, token.iv())
            .map_err(|e| CredentialError::malformed_ciphertext(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(token.ciphertext())
            .map_err(|_| CredentialError::malformed_ciphertext("invalid block alignment or padding"))?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CredentialError::Decoding { reason: "invalid UTF-8 sequence".to_string() }
        })
    }

    /// Decode a base64 key and token and decrypt. The key is validated first.
    pub fn decrypt_encoded(key_b64: &str, token_b64: &str) -> Result<String> {
        let key = FernetKey::from_base64(key_b64)?;
        let token = FernetToken::from_base64(token_b64)?;
        Self::decrypt(&key, &token)
    }

    /// Encrypt with the current time and a random IV.
    pub fn encrypt(key: &FernetKey, plaintext: &[u8]) -> Result<FernetToken> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        Self::encrypt_at(key, plaintext, now, iv)
    }

    /// Encrypt with an explicit timestamp and IV. Deterministic.
    pub fn encrypt_at(
        key: &FernetKey,
        plaintext: &[u8],
        timestamp: u64,
        iv: [u8; IV_LEN],
    ) -> Result<FernetToken> {
        let ciphertext = Aes128CbcEnc::new(&key.encryption.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut bytes = Vec::with_capacity(IV_END + ciphertext.len() + TAG_LEN);
        bytes.push(FERNET_VERSION);
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&ciphertext);

        let mut mac = HmacSha256::new_from_slice(&key.signing)
            .map_err(|_| CredentialError::InvalidKeyLength { length: key.signing.len() })?;
        mac.update(&bytes);
        bytes.extend_from_slice(&mac.finalize().into_bytes());

        Ok(FernetToken { bytes })
    }
}
