//! Password protection of a single share for transport
//!
//! Bundle layout: `salt (16) ‖ nonce (12) ‖ ciphertext ‖ tag (16)`. The bundle
//! carries everything needed to re-derive the key except the password itself.

use std::ops::Deref;

use tracing::{debug, warn};

use crate::config::{Config, MIN_KDF_ITERATIONS};
use crate::envelope::{Envelope, EnvelopeEngine};
use crate::error::{Result, SecretError};
use crate::provider::random_array;
use crate::types::{NONCE_LEN, SALT_LEN, TAG_LEN};

/// Password-protected share: `salt ‖ nonce ‖ ciphertext ‖ tag`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtectedShare {
    data: Vec<u8>,
}

impl ProtectedShare {
    /// Smallest well-formed bundle (empty plaintext)
    pub const MIN_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

    /// Reassembles a bundle from the three values a share link carries
    ///
    /// # Errors
    /// [`SecretError::InvalidShareFormat`] if salt or nonce have the wrong
    /// length or the ciphertext is shorter than a tag.
    pub fn from_parts(salt: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Self> {
        if salt.len() != SALT_LEN || nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
            return Err(SecretError::InvalidShareFormat);
        }
        let mut data = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        data.extend_from_slice(salt);
        data.extend_from_slice(nonce);
        data.extend_from_slice(ciphertext);
        Ok(Self { data })
    }

    pub fn salt(&self) -> &[u8] {
        &self.data[..SALT_LEN.min(self.data.len())]
    }

    pub fn nonce(&self) -> &[u8] {
        let start = SALT_LEN.min(self.data.len());
        let end = (SALT_LEN + NONCE_LEN).min(self.data.len());
        &self.data[start..end]
    }

    /// Ciphertext with the tag still appended
    pub fn ciphertext(&self) -> &[u8] {
        &self.data[(SALT_LEN + NONCE_LEN).min(self.data.len())..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ProtectedShare {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl AsRef<[u8]> for ProtectedShare {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for ProtectedShare {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Protects and recovers shares with a password
///
/// The key is PBKDF2-HMAC-SHA256 over the password and a per-bundle salt;
/// encryption reuses the [`EnvelopeEngine`] AEAD step.
///
/// Every failure of [`ShareProtector::unprotect`] past password validation is
/// reported as the same [`SecretError::InvalidPasswordOrCorrupted`], whether
/// the password was wrong or the bundle was damaged.
#[derive(Debug, Clone)]
pub struct ShareProtector {
    engine: EnvelopeEngine,
    iterations: u32,
}

impl Default for ShareProtector {
    fn default() -> Self {
        Self {
            engine: EnvelopeEngine::default(),
            iterations: MIN_KDF_ITERATIONS,
        }
    }
}

impl ShareProtector {
    /// # Errors
    /// [`SecretError::InvalidConfig`] if `config` does not validate.
    pub fn new(engine: EnvelopeEngine, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            iterations: config.kdf_iterations,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypts `share` under a key derived from `password`
    ///
    /// # Errors
    /// * [`SecretError::EmptyPassword`] for an empty or whitespace-only password
    /// * [`SecretError::RandomSourceUnavailable`] if salt or nonce cannot be drawn
    pub fn protect(&self, share: &[u8], password: &str) -> Result<ProtectedShare> {
        check_password(password)?;

        let salt = random_array::<SALT_LEN>(self.engine.provider())?;
        let key = self
            .engine
            .provider()
            .derive_key(password.as_bytes(), &salt, self.iterations)?;
        let sealed = self.engine.seal_with_key(&key, share)?;

        let mut data = Vec::with_capacity(SALT_LEN + sealed.len());
        data.extend_from_slice(&salt);
        data.extend_from_slice(&sealed);
        debug!(
            share_len = share.len(),
            iterations = self.iterations,
            "protected share"
        );
        Ok(ProtectedShare { data })
    }

    /// Recovers the share bytes from a bundle
    ///
    /// # Errors
    /// * [`SecretError::EmptyPassword`] for an empty or whitespace-only password
    /// * [`SecretError::InvalidPasswordOrCorrupted`] for everything else
    pub fn unprotect(&self, bundle: &[u8], password: &str) -> Result<Vec<u8>> {
        check_password(password)?;

        if bundle.len() < ProtectedShare::MIN_LEN {
            warn!(bundle_len = bundle.len(), "share bundle rejected");
            return Err(SecretError::InvalidPasswordOrCorrupted);
        }
        let (salt, sealed) = bundle.split_at(SALT_LEN);

        let share = self
            .engine
            .provider()
            .derive_key(password.as_bytes(), salt, self.iterations)
            .and_then(|key| self.engine.open_with_key(&key, sealed))
            .map_err(|_| {
                warn!(bundle_len = bundle.len(), "share bundle rejected");
                SecretError::InvalidPasswordOrCorrupted
            })?;
        debug!(share_len = share.len(), "unprotected share");
        Ok(share)
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(SecretError::EmptyPassword);
    }
    Ok(())
}

// Bundles embed an envelope-shaped tail; keep the two minimums in step
const _: () = assert!(ProtectedShare::MIN_LEN == SALT_LEN + Envelope::MIN_LEN);
