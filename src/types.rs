use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
#[cfg(feature = "zeroize")]
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

// --- Wire format constants ---

/// AES-256 key length.
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (96-bit).
pub const NONCE_LEN: usize = 12;

/// AEAD tag length (128-bit).
pub const TAG_LEN: usize = 16;

/// Password salt length of a protected share bundle.
pub const SALT_LEN: usize = 16;

/// SHA-256 output size, used by [`KeyFingerprint`].
pub const FINGERPRINT_LEN: usize = 32;

// --- Key material ---

/// Raw 256-bit symmetric key
///
/// Produced fresh for every envelope and never embedded in it; the only way
/// back to it is through the shares. `Debug` output is redacted.
#[derive(Clone)]
#[cfg_attr(feature = "zeroize", derive(Zeroize, ZeroizeOnDrop))]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, typically the output of share combination
    ///
    /// # Errors
    /// [`SecretError::InvalidKeyLength`] if `bytes` is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| SecretError::InvalidKeyLength {
                    expected: KEY_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.0
    }

    /// SHA-256 fingerprint of this key
    pub fn fingerprint(&self) -> KeyFingerprint {
        KeyFingerprint(Sha256::digest(self.0).into())
    }
}

impl AsRef<[u8]> for SymmetricKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// SHA-256 digest of a [`SymmetricKey`]
///
/// Stored next to an envelope when the fingerprint layer is enabled so that a
/// wrong share set is caught right after combination instead of at AEAD time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyFingerprint([u8; FINGERPRINT_LEN]);

impl KeyFingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// # Errors
    /// [`SecretError::InvalidKeyLength`] if `bytes` is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; FINGERPRINT_LEN] =
            bytes
                .try_into()
                .map_err(|_| SecretError::InvalidKeyLength {
                    expected: FINGERPRINT_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Constant-time check that `key` hashes to this fingerprint
    pub fn matches(&self, key: &SymmetricKey) -> bool {
        let computed = key.fingerprint();
        computed.0[..].ct_eq(&self.0[..]).into()
    }
}
