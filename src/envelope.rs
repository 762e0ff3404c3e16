//! Envelope encryption of the secret itself
//!
//! An envelope is `nonce (12) ‖ ciphertext ‖ tag (16)` under a fresh
//! AES-256-GCM key. There is no version byte and no length prefix; the
//! ciphertext is as long as the plaintext. The key is returned separately and
//! is never part of the envelope.

use std::ops::Deref;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SecretError};
use crate::provider::{CryptoProvider, SystemProvider, random_array};
use crate::types::{KEY_LEN, NONCE_LEN, SymmetricKey, TAG_LEN};

/// Sealed secret bytes: `nonce ‖ ciphertext ‖ tag`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope {
    data: Vec<u8>,
}

impl Envelope {
    /// Smallest well-formed envelope (empty plaintext)
    pub const MIN_LEN: usize = NONCE_LEN + TAG_LEN;

    pub fn nonce(&self) -> &[u8] {
        &self.data[..NONCE_LEN.min(self.data.len())]
    }

    /// Ciphertext with the tag still appended
    pub fn ciphertext(&self) -> &[u8] {
        &self.data[NONCE_LEN.min(self.data.len())..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for Envelope {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl AsRef<[u8]> for Envelope {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for Envelope {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Authenticated encryption under per-call random keys and nonces
///
/// # Example
/// ```
/// use shared_secret_encrypt::EnvelopeEngine;
///
/// let engine = EnvelopeEngine::default();
/// let (envelope, key) = engine.encrypt(b"attack at dawn").unwrap();
/// assert_eq!(engine.decrypt(&envelope, &key).unwrap(), b"attack at dawn");
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeEngine {
    provider: Arc<dyn CryptoProvider>,
}

impl Default for EnvelopeEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemProvider))
    }
}

impl EnvelopeEngine {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    pub(crate) fn provider(&self) -> &dyn CryptoProvider {
        self.provider.as_ref()
    }

    /// Encrypts `secret` under a freshly generated key
    ///
    /// Empty secrets are allowed and produce a [`Envelope::MIN_LEN`] envelope.
    ///
    /// # Errors
    /// [`SecretError::RandomSourceUnavailable`] if no key or nonce can be drawn.
    pub fn encrypt(&self, secret: &[u8]) -> Result<(Envelope, SymmetricKey)> {
        let key = SymmetricKey::new(random_array::<KEY_LEN>(self.provider())?);
        let envelope = self.seal_with_key(&key, secret)?;
        debug!(
            secret_len = secret.len(),
            envelope_len = envelope.len(),
            "encrypted secret"
        );
        Ok((Envelope::from(envelope), key))
    }

    /// Decrypts an envelope produced by [`EnvelopeEngine::encrypt`]
    ///
    /// # Errors
    /// [`SecretError::IntegrityCheckFailed`] for a wrong key, any modified
    /// byte, or an envelope shorter than [`Envelope::MIN_LEN`].
    pub fn decrypt(&self, envelope: &[u8], key: &SymmetricKey) -> Result<Vec<u8>> {
        let plaintext = self.open_with_key(key, envelope).inspect_err(|e| {
            debug!(envelope_len = envelope.len(), error = %e, "envelope rejected");
        })?;
        debug!(secret_len = plaintext.len(), "decrypted envelope");
        Ok(plaintext)
    }

    /// `nonce ‖ AEAD(key, nonce, plaintext)` with a fresh random nonce
    pub(crate) fn seal_with_key(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_array::<NONCE_LEN>(self.provider())?;
        let sealed = self.provider.aead_encrypt(key, &nonce, plaintext)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Inverse of [`EnvelopeEngine::seal_with_key`]
    pub(crate) fn open_with_key(&self, key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < Envelope::MIN_LEN {
            return Err(SecretError::IntegrityCheckFailed);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce: &[u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| SecretError::IntegrityCheckFailed)?;
        self.provider.aead_decrypt(key, nonce, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SeededProvider;

    #[test]
    fn test_round_trip() {
        let engine = EnvelopeEngine::default();
        let secrets: [&[u8]; 4] = [b"", b"x", b"hello world", &[0u8; 4096]];
        for secret in secrets {
            let (envelope, key) = engine.encrypt(secret).unwrap();
            assert_eq!(envelope.len(), NONCE_LEN + secret.len() + TAG_LEN);
            assert_eq!(engine.decrypt(&envelope, &key).unwrap(), secret);
        }
    }

    #[test]
    fn test_fresh_key_and_nonce_per_call() {
        let engine = EnvelopeEngine::default();
        let (env_a, key_a) = engine.encrypt(b"same").unwrap();
        let (env_b, key_b) = engine.encrypt(b"same").unwrap();
        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
        assert_ne!(env_a.nonce(), env_b.nonce());
        assert_ne!(env_a, env_b);
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let engine = EnvelopeEngine::default();
        let (envelope, key) = engine.encrypt(b"hello world").unwrap();

        for byte in 0..envelope.len() {
            for bit in 0..8 {
                let mut tampered = envelope.as_bytes().to_vec();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        engine.decrypt(&tampered, &key),
                        Err(SecretError::IntegrityCheckFailed)
                    ),
                    "flip at byte {byte} bit {bit} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn test_truncated_envelope() {
        let engine = EnvelopeEngine::default();
        let (envelope, key) = engine.encrypt(b"truncate me").unwrap();

        for len in [0, 5, NONCE_LEN, Envelope::MIN_LEN - 1, envelope.len() - 1] {
            assert!(matches!(
                engine.decrypt(&envelope[..len], &key),
                Err(SecretError::IntegrityCheckFailed)
            ));
        }
    }

    #[test]
    fn test_wrong_key() {
        let engine = EnvelopeEngine::default();
        let (envelope, _) = engine.encrypt(b"secret").unwrap();
        let (_, other_key) = engine.encrypt(b"other").unwrap();
        assert!(matches!(
            engine.decrypt(&envelope, &other_key),
            Err(SecretError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_layout() {
        let engine = EnvelopeEngine::new(Arc::new(SeededProvider::new(1)));
        let (envelope, key) = engine.encrypt(b"layout").unwrap();

        let nonce: [u8; NONCE_LEN] = envelope.nonce().try_into().unwrap();
        let opened = engine
            .provider()
            .aead_decrypt(&key, &nonce, envelope.ciphertext())
            .unwrap();
        assert_eq!(opened, b"layout");
    }
}
