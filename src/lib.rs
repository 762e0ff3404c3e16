//! Envelope encryption with a threshold-split key
//!
//! A secret is encrypted with AES-256-GCM under a fresh random key, and that
//! key is split with Shamir's Secret Sharing over GF(2^8) into `n` shares of
//! which any `t` bring it back. Individual shares can additionally be sealed
//! under a password (PBKDF2-HMAC-SHA256) for transport over untrusted
//! channels.
//!
//! Every operation is a stateless transform over bytes and returns a
//! [`Result`]; randomness and primitives come from an injected
//! [`CryptoProvider`].
//!
//! # Quick Start
//!
//! ```
//! use shared_secret_encrypt::{SecretSharing, codec};
//!
//! // 5 shares, any 3 reconstruct
//! let sharing = SecretSharing::builder(5, 3).build().unwrap();
//! let sealed = sharing.seal(b"my secret data").unwrap();
//!
//! // Text form for handing out
//! let texts: Vec<String> = sealed.shares.iter().map(codec::encode_share).collect();
//!
//! // Later: any 3 of them
//! let shares = codec::decode_shares(texts[1..4].iter().map(String::as_str)).unwrap();
//! let secret = sharing.open(&sealed.envelope, &shares, None).unwrap();
//! assert_eq!(secret, b"my secret data");
//! ```

pub mod codec;
mod config;
mod envelope;
mod error;
mod gf256;
mod pipeline;
mod protection;
mod provider;
mod shamir;
mod types;

pub use config::{Config, MIN_KDF_ITERATIONS, SplitMode};
pub use envelope::{Envelope, EnvelopeEngine};
pub use error::{ErrorKind, Result, SecretError};
pub use gf256::Gf256;
pub use pipeline::{SealedSecret, SecretSharing, SecretSharingBuilder};
pub use protection::{ProtectedShare, ShareProtector};
pub use provider::{CryptoProvider, SeededProvider, SystemProvider};
pub use shamir::{MAX_SHARES, MIN_THRESHOLD, ShamirShare, ShamirShareBuilder, Share};
pub use types::{
    FINGERPRINT_LEN, KEY_LEN, KeyFingerprint, NONCE_LEN, SALT_LEN, SymmetricKey, TAG_LEN,
};

// Re-export common types for convenience
pub mod prelude {
    pub use super::codec::ShareLink;
    pub use super::{
        Config, CryptoProvider, Envelope, EnvelopeEngine, ErrorKind, ProtectedShare, Result,
        SealedSecret, SecretError, SecretSharing, ShamirShare, Share, ShareProtector, SplitMode,
        SystemProvider,
    };
}
