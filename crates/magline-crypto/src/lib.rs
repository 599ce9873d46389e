//! # Magline Crypto
//!
//! X25519 key management for magline.
//!
//! ## Components
//!
//! - **Key Exchange**: X25519 key pairs and Diffie-Hellman
//! - **Codec**: PKCS#8 / SubjectPublicKeyInfo PEM encoding (OID 1.3.101.110)
//! - **ASN.1**: the small DER writer/reader and object identifier type the
//!   codec is built on
//!
//! ## Example
//!
//! ```
//! use magline_crypto::KeyPair;
//!
//! let alice = KeyPair::generate()?;
//! let bob = KeyPair::generate()?;
//!
//! let a = alice.shared_secret(&bob.public_key_bytes()?)?;
//! let b = bob.shared_secret(&alice.public_key_bytes()?)?;
//! assert_eq!(a.as_bytes(), b.as_bytes());
//!
//! assert!(alice.public_key_pem()?.starts_with("-----BEGIN PUBLIC KEY-----"));
//! # Ok::<(), magline_crypto::CryptoError>(())
//! ```

pub mod asn1;
pub mod codec;
pub mod errors;
pub mod key_exchange;

pub use asn1::ObjectIdentifier;
pub use codec::*;
pub use errors::*;
pub use key_exchange::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::codec::*;
    pub use crate::errors::*;
    pub use crate::key_exchange::*;
}
