//! Cryptographic capability seam
//!
//! Everything in this crate that needs randomness, AEAD or key derivation goes
//! through a [`CryptoProvider`]. The default methods implement AES-256-GCM and
//! PBKDF2-HMAC-SHA256, so a provider only has to decide where its random bytes
//! come from:
//!
//! - [`SystemProvider`] reads the operating system RNG.
//! - [`SeededProvider`] expands a fixed seed with ChaCha20, giving reproducible
//!   output for tests.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use parking_lot::Mutex;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::Sha256;

use crate::error::{Result, SecretError};
use crate::types::{KEY_LEN, NONCE_LEN, SymmetricKey};

/// Source of randomness and cryptographic primitives
///
/// Implementations must be safe to share between threads; every operation of
/// the crate may run concurrently against the same provider.
pub trait CryptoProvider: Send + Sync + fmt::Debug {
    /// Fills `dest` with cryptographically secure random bytes
    ///
    /// # Errors
    /// [`SecretError::RandomSourceUnavailable`] if the source cannot deliver.
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;

    /// AES-256-GCM encryption without associated data
    ///
    /// Returns `ciphertext ‖ tag`.
    fn aead_encrypt(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| SecretError::Primitive(e.to_string()))?;
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| SecretError::Primitive("AES-GCM encryption refused input".into()))
    }

    /// AES-256-GCM decryption of `ciphertext ‖ tag`
    ///
    /// # Errors
    /// [`SecretError::IntegrityCheckFailed`] if the tag does not verify.
    fn aead_decrypt(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| SecretError::Primitive(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SecretError::IntegrityCheckFailed)
    }

    /// PBKDF2-HMAC-SHA256 derivation of a 256-bit key
    fn derive_key(&self, password: &[u8], salt: &[u8], iterations: u32) -> Result<SymmetricKey> {
        if iterations == 0 {
            return Err(SecretError::InvalidConfig(
                "KDF iterations cannot be zero".into(),
            ));
        }
        let mut key = SymmetricKey::new([0u8; KEY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_bytes());
        Ok(key)
    }
}

/// Provider backed by the operating system RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProvider;

impl CryptoProvider for SystemProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SecretError::RandomSourceUnavailable(e.to_string()))
    }
}

/// Deterministic provider: a ChaCha20 stream expanded from a fixed seed
///
/// Two providers built from the same seed hand out the same byte sequence,
/// which makes keys, nonces, salts and polynomial coefficients reproducible.
/// Never use it outside of tests.
pub struct SeededProvider {
    rng: Mutex<ChaCha20Rng>,
}

impl SeededProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::from_seed(seed)),
        }
    }
}

impl fmt::Debug for SeededProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededProvider").finish_non_exhaustive()
    }
}

impl CryptoProvider for SeededProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        self.rng.lock().fill_bytes(dest);
        Ok(())
    }
}

/// Draws a fixed-size random array from `provider`
pub(crate) fn random_array<const N: usize>(provider: &dyn CryptoProvider) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    provider.fill_random(&mut out)?;
    Ok(out)
}
