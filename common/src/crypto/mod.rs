//! Keys and signatures.

mod ed25519;
mod key;

pub use ed25519::{
    KeyError, PrivateKey, PublicKey, Signature, ED25519_DER_PREFIX, ED25519_PRIVATE_KEY_SIZE,
    ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE,
};
pub use key::{Key, KeyList};
