//! X25519 Key Exchange
//!
//! Curve25519 key pair that keeps its raw keys and their PEM encodings
//! together. A pair starts out empty and becomes usable once a private key is
//! imported, generated or parsed from PEM; every key-dependent query on an
//! empty pair fails with [`CryptoError::Uninitialized`].

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

use crate::codec;
use crate::errors::{CryptoError, CryptoResult};

/// Size of X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of X25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of shared secret in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// Everything derived from one private scalar, replaced as a unit
#[derive(Clone)]
struct KeyMaterial {
    secret: StaticSecret,
    public: PublicKey,
    private_pem: Zeroizing<String>,
    public_pem: String,
}

/// X25519 key pair with cached PEM encodings
///
/// Mutation goes through `&mut self`; share a pair across threads behind a
/// lock if it must be re-imported concurrently.
#[derive(Clone, Default)]
pub struct KeyPair {
    material: Option<KeyMaterial>,
}

impl KeyPair {
    /// Create an empty, uninitialized key pair
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key pair from OS randomness
    pub fn generate() -> CryptoResult<Self> {
        let mut kp = Self::new();
        kp.generate_random_private_key()?;
        Ok(kp)
    }

    /// Create a key pair from raw private key bytes
    pub fn from_private_key(private_key: &[u8]) -> CryptoResult<Self> {
        let mut kp = Self::new();
        kp.import_private_key(private_key)?;
        Ok(kp)
    }

    /// Create a key pair from a `PRIVATE KEY` PEM block
    pub fn from_pem(private_pem: &str) -> CryptoResult<Self> {
        let mut kp = Self::new();
        kp.import_private_key_pem(private_pem)?;
        Ok(kp)
    }

    /// Whether a private key has been imported
    pub fn is_initialized(&self) -> bool {
        self.material.is_some()
    }

    /// Import a raw 32-byte private scalar
    ///
    /// Derives the public key and both PEM encodings, then replaces any
    /// previous state. On error the pair is left untouched.
    pub fn import_private_key(&mut self, private_key: &[u8]) -> CryptoResult<()> {
        let bytes: [u8; PRIVATE_KEY_SIZE] =
            private_key
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PRIVATE_KEY_SIZE,
                    got: private_key.len(),
                })?;
        let bytes = Zeroizing::new(bytes);

        let secret = StaticSecret::from(*bytes);
        let public = PublicKey::from(&secret);
        let private_pem = Zeroizing::new(codec::encode_private_key_pem(&bytes));
        let public_pem = codec::encode_public_key_pem(public.as_bytes());

        debug!(public = %hex::encode(public.as_bytes()), "imported X25519 private key");

        self.material = Some(KeyMaterial {
            secret,
            public,
            private_pem,
            public_pem,
        });
        Ok(())
    }

    /// Replace the private key with 32 bytes from the OS randomness source
    pub fn generate_random_private_key(&mut self) -> CryptoResult<()> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        OsRng.try_fill_bytes(&mut bytes[..]).map_err(|e| {
            warn!("OS randomness source failed: {}", e);
            CryptoError::RandomnessUnavailable
        })?;
        self.import_private_key(&bytes[..])
    }

    /// Import the private key from a `PRIVATE KEY` PEM block
    pub fn import_private_key_pem(&mut self, private_pem: &str) -> CryptoResult<()> {
        let bytes = Zeroizing::new(codec::decode_private_key_pem(private_pem)?);
        self.import_private_key(&bytes[..])
    }

    fn material(&self) -> CryptoResult<&KeyMaterial> {
        self.material.as_ref().ok_or(CryptoError::Uninitialized)
    }

    /// Get public key as bytes
    pub fn public_key_bytes(&self) -> CryptoResult<[u8; PUBLIC_KEY_SIZE]> {
        Ok(self.material()?.public.to_bytes())
    }

    /// Get the public key as a `PUBLIC KEY` PEM block
    pub fn public_key_pem(&self) -> CryptoResult<&str> {
        Ok(self.material()?.public_pem.as_str())
    }

    /// Get the private key as a `PRIVATE KEY` PEM block
    pub fn private_key_pem(&self) -> CryptoResult<&str> {
        Ok(self.material()?.private_pem.as_str())
    }

    /// Perform Diffie-Hellman with a peer's raw public key
    ///
    /// # Arguments
    /// * `peer_public_key` - The other party's 32-byte public key
    ///
    /// # Returns
    /// Shared secret (32 bytes). Low-order peer points, which would force an
    /// all-zero secret, are rejected.
    pub fn shared_secret(&self, peer_public_key: &[u8]) -> CryptoResult<DhSharedSecret> {
        let peer: [u8; PUBLIC_KEY_SIZE] =
            peer_public_key
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_SIZE,
                    got: peer_public_key.len(),
                })?;
        let material = self.material()?;

        let shared = material.secret.diffie_hellman(&PublicKey::from(peer));
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }
        Ok(DhSharedSecret::new(shared))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.material {
            Some(material) => f
                .debug_struct("KeyPair")
                .field("public", &hex::encode(material.public.as_bytes()))
                .field("secret", &"[REDACTED]")
                .finish(),
            None => f
                .debug_struct("KeyPair")
                .field("initialized", &false)
                .finish(),
        }
    }
}

/// Wrapper around SharedSecret, zeroized on drop
pub struct DhSharedSecret(SharedSecret);

impl DhSharedSecret {
    /// Create from SharedSecret
    pub fn new(secret: SharedSecret) -> Self {
        Self(secret)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        self.0.as_bytes()
    }

    /// Convert to owned bytes
    pub fn to_bytes(&self) -> [u8; SHARED_SECRET_SIZE] {
        *self.0.as_bytes()
    }
}

impl std::fmt::Debug for DhSharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DhSharedSecret([REDACTED])")
    }
}
