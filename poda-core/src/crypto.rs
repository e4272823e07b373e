//! Cryptographic primitives for the PoDA device.
//!
//! - BLAKE3 for content hashing (item ids are content-addressed)
//! - Ed25519 for signatures (wallets, attestation seals)
//! - Base64-url addresses derived from public keys

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signer as _, Verifier as _};
use rand::rngs::OsRng;
use rand::RngCore as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 32-byte hash value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The zero hash (used as a sentinel).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data with BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    Hash(*blake3::hash(data).as_bytes())
}

/// Encode bytes as base64-url without padding.
///
/// This is the encoding used for addresses and for id references carried in
/// tags (e.g. `Attestation-For`).
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64-url string produced by [`encode`].
pub fn decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| Error::invalid_address(e.to_string()))
}

/// An opaque signer or message-id reference: the base64-url form of a
/// 32-byte hash.
///
/// A signer's address is `encode(blake3(pubkey))`; the same encoding applied
/// to an item's unsigned id yields the id reference used as a bundle target
/// or an `Attestation-For` tag value. One type serves both.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Derive the address of a public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(encode(hash(&key.as_bytes()).as_bytes()))
    }

    /// The address form of a content hash (message-id reference).
    pub fn from_hash(h: &Hash) -> Self {
        Self(encode(h.as_bytes()))
    }

    /// Wrap an already-encoded address string.
    pub fn from_encoded(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the encoded string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The encoded address as raw ASCII bytes (tag values are byte strings).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Recover the underlying 32-byte hash, if this address encodes one.
    pub fn to_hash(&self) -> Result<Hash> {
        let bytes = decode(&self.0)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::invalid_address("address does not encode 32 bytes"))?;
        Ok(Hash::from_bytes(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.0[..self.0.len().min(12)])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A public key for verifying signatures.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "public_key_serde")] ed25519_dalek::VerifyingKey);

mod public_key_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        key: &ed25519_dalek::VerifyingKey,
        s: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        // Fixed-size array for bincode compatibility
        key.to_bytes().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<ed25519_dalek::VerifyingKey, D::Error> {
        let bytes: [u8; 32] = Deserialize::deserialize(d)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl PublicKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| Error::invalid_key(e.to_string()))?;
        Ok(Self(key))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// The signer address for this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Sig) -> Result<()> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| Error::invalid_signature())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &hex::encode(&self.as_bytes()[..8]))
    }
}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

/// A signing wallet (Ed25519 secret key plus its derived identity).
#[derive(Clone)]
pub struct Wallet(ed25519_dalek::SigningKey);

impl Wallet {
    /// Generate a new random wallet.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    /// Create from raw seed bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(bytes))
    }

    /// Get the raw seed bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// The wallet's signer address.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Sig {
        Sig(self.0.sign(message))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wallet([redacted], address={})", self.address())
    }
}

/// A digital signature.
#[derive(Clone, Serialize, Deserialize)]
pub struct Sig(#[serde(with = "sig_serde")] ed25519_dalek::Signature);

impl PartialEq for Sig {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Sig {}

mod sig_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        sig: &ed25519_dalek::Signature,
        s: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        // Two 32-byte arrays for bincode compatibility
        // (serde only implements for arrays up to 32 elements)
        let bytes = sig.to_bytes();
        let (first, second) = bytes.split_at(32);
        let first: [u8; 32] = first
            .try_into()
            .map_err(|_| serde::ser::Error::custom("invalid signature length"))?;
        let second: [u8; 32] = second
            .try_into()
            .map_err(|_| serde::ser::Error::custom("invalid signature length"))?;
        (first, second).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<ed25519_dalek::Signature, D::Error> {
        let (first, second): ([u8; 32], [u8; 32]) = Deserialize::deserialize(d)?;
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&first);
        bytes[32..].copy_from_slice(&second);
        Ok(ed25519_dalek::Signature::from_bytes(&bytes))
    }
}

impl Sig {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(ed25519_dalek::Signature::from_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

impl fmt::Debug for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({})", &hex::encode(&self.to_bytes()[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basic() {
        let h1 = hash(b"hello");
        let h2 = hash(b"hello");
        let h3 = hash(b"world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert!(!h1.is_zero());
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn test_sign_verify() {
        let wallet = Wallet::generate();
        let pk = wallet.public_key();

        let message = b"attestation payload";
        let sig = wallet.sign(message);

        assert!(pk.verify(message, &sig).is_ok());
        assert!(pk.verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let h = hash(b"some id");
        let encoded = encode(h.as_bytes());
        // base64-url, no padding
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(decode(&encoded).unwrap(), h.as_bytes());
    }

    #[test]
    fn test_address_deterministic() {
        let wallet = Wallet::generate();
        assert_eq!(wallet.address(), wallet.public_key().address());
        assert_eq!(wallet.address(), Wallet::from_bytes(&wallet.as_bytes()).address());
    }

    #[test]
    fn test_address_hash_roundtrip() {
        let h = hash(b"process id");
        let addr = Address::from_hash(&h);
        assert_eq!(addr.to_hash().unwrap(), h);
    }

    #[test]
    fn test_sig_bincode_roundtrip() {
        let wallet = Wallet::generate();
        let sig = wallet.sign(b"test message");

        let bytes = bincode::serialize(&sig).expect("serialize should work");
        let restored: Sig = bincode::deserialize(&bytes).expect("deserialize should work");

        assert_eq!(sig.to_bytes(), restored.to_bytes());
    }

    #[test]
    fn test_pubkey_bincode_roundtrip() {
        let wallet = Wallet::generate();
        let pk = wallet.public_key();

        let bytes = bincode::serialize(&pk).expect("serialize should work");
        let restored: PublicKey = bincode::deserialize(&bytes).expect("deserialize should work");

        assert_eq!(pk.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn test_wallet_roundtrip() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_bytes(&wallet.as_bytes());

        assert_eq!(
            wallet.public_key().as_bytes(),
            restored.public_key().as_bytes()
        );
    }
}
