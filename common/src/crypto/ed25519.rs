//! Ed25519 signing keys for ledger accounts.
//!
//! Private keys are accepted in the two textual forms operators hand out:
//! raw 32-byte hex, or the DER-encoded PKCS#8 form whose hex always starts
//! with [`ED25519_DER_PREFIX`]. Either may carry a `0x` prefix.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an Ed25519 private key in bytes.
pub const ED25519_PRIVATE_KEY_SIZE: usize = SECRET_KEY_LENGTH;

/// Size of an Ed25519 public key in bytes.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const ED25519_SIGNATURE_SIZE: usize = SIGNATURE_LENGTH;

/// Hex of the PKCS#8 DER header preceding a raw Ed25519 private key.
pub const ED25519_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// Error types for key parsing and signature checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Invalid private key length.
    #[error(
        "Invalid private key length: expected {}, got {}",
        ED25519_PRIVATE_KEY_SIZE,
        _0
    )]
    InvalidPrivateKeyLength(usize),

    /// Invalid public key length.
    #[error(
        "Invalid public key length: expected {}, got {}",
        ED25519_PUBLIC_KEY_SIZE,
        _0
    )]
    InvalidPublicKeyLength(usize),

    /// Invalid signature length.
    #[error(
        "Invalid signature length: expected {}, got {}",
        ED25519_SIGNATURE_SIZE,
        _0
    )]
    InvalidSignatureLength(usize),

    /// Bytes are not a valid curve point.
    #[error("Failed to parse public key")]
    InvalidPublicKey,

    /// Signature verification failed.
    #[error("Signature verification failed")]
    VerificationFailed,

    /// Hex decoding error.
    #[error("Invalid hex string: {0}")]
    HexError(String),
}

fn strip_hex_prefix(s: &str) -> &str {
    s.trim().strip_prefix("0x").unwrap_or(s.trim())
}

/// Ed25519 private key of a ledger account.
///
/// The key material is zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)]
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a new random key using the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: &[u8; ED25519_PRIVATE_KEY_SIZE]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Create a key from a slice.
    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; ED25519_PRIVATE_KEY_SIZE] = slice
            .try_into()
            .map_err(|_| KeyError::InvalidPrivateKeyLength(slice.len()))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Parse a raw or DER-encoded hex private key.
    pub fn from_str_ed25519(s: &str) -> Result<Self, KeyError> {
        let s = strip_hex_prefix(s);
        let raw = match s.len() {
            96 if s.to_ascii_lowercase().starts_with(ED25519_DER_PREFIX) => {
                &s[ED25519_DER_PREFIX.len()..]
            }
            _ => s,
        };
        let bytes = hex::decode(raw).map_err(|e| KeyError::HexError(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Raw key bytes as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// DER-encoded key as hex.
    pub fn to_der_hex(&self) -> String {
        format!("{}{}", ED25519_DER_PREFIX, self.to_hex())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_ed25519(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for PrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_der_hex())
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; ED25519_PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a public key from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes =
            hex::decode(strip_hex_prefix(s)).map_err(|e| KeyError::HexError(e.to_string()))?;
        let bytes: [u8; ED25519_PUBLIC_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKeyLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| KeyError::InvalidPublicKey)?;
        let dalek_sig = DalekSignature::from_bytes(&signature.0);
        verifying_key
            .verify(message, &dalek_sig)
            .map_err(|_| KeyError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; ED25519_SIGNATURE_SIZE]);

impl Signature {
    /// Create a signature from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes =
            hex::decode(strip_hex_prefix(s)).map_err(|e| KeyError::HexError(e.to_string()))?;
        let bytes: [u8; ED25519_SIGNATURE_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::generate();
        let message = b"Taxi rides";

        let signature = key.sign(message);
        assert!(key.public_key().verify(message, &signature).is_ok());
        assert_eq!(
            key.public_key().verify(b"other", &signature),
            Err(KeyError::VerificationFailed)
        );
    }

    #[test]
    fn test_verify_wrong_key() {
        let key1 = PrivateKey::generate();
        let key2 = PrivateKey::generate();

        let signature = key1.sign(b"message");
        assert!(key2.public_key().verify(b"message", &signature).is_err());
    }

    #[test]
    fn test_parse_der_and_raw_forms() {
        let key = PrivateKey::generate();

        let from_raw = PrivateKey::from_str_ed25519(&key.to_hex()).unwrap();
        let from_der = PrivateKey::from_str_ed25519(&key.to_der_hex()).unwrap();
        let from_prefixed: PrivateKey = format!("0x{}", key.to_hex()).parse().unwrap();

        assert_eq!(from_raw.public_key(), key.public_key());
        assert_eq!(from_der.public_key(), key.public_key());
        assert_eq!(from_prefixed.public_key(), key.public_key());
    }

    #[test]
    fn test_private_key_is_redacted() {
        let key = PrivateKey::generate();
        let debug = format!("{:?}", key);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&key.to_hex()));
        assert_eq!(key.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            PrivateKey::from_slice(&[0u8; 16]).unwrap_err(),
            KeyError::InvalidPrivateKeyLength(16)
        );
        assert!(PrivateKey::from_str_ed25519("not-hex").is_err());
        assert!(PublicKey::from_hex("abcd").is_err());
        assert!(Signature::from_hex("zz").is_err());
    }

    #[test]
    fn test_public_key_serde_as_hex() {
        let public = PrivateKey::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();

        assert_eq!(json, format!("\"{}\"", public.to_hex()));
        assert_eq!(serde_json::from_str::<PublicKey>(&json).unwrap(), public);
    }
}
