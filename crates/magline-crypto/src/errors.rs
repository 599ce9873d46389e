//! Error types for magline-crypto

use thiserror::Error;

/// Errors that can occur in magline-crypto operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material is not the expected size
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// Operation needs a private key and none has been imported
    #[error("Key pair is not initialized")]
    Uninitialized,

    /// No usable PEM block in the input
    #[error("Malformed PEM: {0}")]
    MalformedPem(String),

    /// PEM decoded but the DER record has the wrong shape
    #[error("Malformed ASN.1: {0}")]
    MalformedAsn1(String),

    /// The OS randomness source failed
    #[error("Secure randomness unavailable")]
    RandomnessUnavailable,

    /// Peer public key is a low-order point, shared secret would be all zero
    #[error("Non-contributory key exchange: peer public key has small order")]
    NonContributory,
}

/// Result type for magline-crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
