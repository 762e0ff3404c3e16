use thiserror::Error;

/// Broad failure classes callers branch on
///
/// Every [`SecretError`] belongs to exactly one kind, see [`SecretError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-correctable parameters (share counts, threshold, password, config)
    Config,
    /// Malformed input data (shares, encodings, key lengths)
    Validation,
    /// Authentication failure: wrong key, wrong password or tampered data
    Integrity,
    /// Random source or platform primitive unavailable
    ResourceExhaustion,
}

/// Error type for secret sealing, splitting and share protection
#[derive(Error, Debug)]
pub enum SecretError {
    /// Invalid threshold value (must be 2 <= threshold <= total_shares)
    #[error("Invalid threshold value {0}")]
    InvalidThreshold(usize),

    /// Invalid total shares count (must be 2..=255)
    #[error("Invalid share count {0}")]
    InvalidShareCount(usize),

    /// Threshold exceeds total shares
    #[error("Threshold {threshold} exceeds total shares {total_shares}")]
    ThresholdTooLarge { threshold: usize, total_shares: usize },

    #[error("Secret must not be empty")]
    EmptySecret,

    /// Password is empty or whitespace only
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not enough shares to interpolate
    #[error("Need at least {needed} shares, got {got}")]
    InsufficientShares { needed: usize, got: usize },

    /// Share x-coordinate outside 1..=255
    #[error("Invalid share index {0}")]
    InvalidShareIndex(u8),

    #[error("Duplicate share index {0}")]
    DuplicateShareIndex(u8),

    #[error("Inconsistent share lengths")]
    InconsistentShareLength,

    #[error("Invalid share format")]
    InvalidShareFormat,

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// Division by zero in GF(2^8)
    #[error("Division by zero in GF(256)")]
    DivisionByZero,

    /// Text transport encoding could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// AEAD authentication failed on an envelope
    #[error("Data integrity check failed")]
    IntegrityCheckFailed,

    /// Deliberately undifferentiated failure of share unprotection
    #[error("Invalid password or corrupted data")]
    InvalidPasswordOrCorrupted,

    /// Recovered key does not match the stored fingerprint
    #[error("Recovered key does not match its fingerprint")]
    FingerprintMismatch,

    #[error("Random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    /// Underlying cryptographic primitive refused to operate
    #[error("Cryptographic primitive failure: {0}")]
    Primitive(String),
}

impl SecretError {
    /// Returns the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidThreshold(_)
            | Self::InvalidShareCount(_)
            | Self::ThresholdTooLarge { .. }
            | Self::EmptySecret
            | Self::EmptyPassword
            | Self::InvalidConfig(_) => ErrorKind::Config,
            Self::InsufficientShares { .. }
            | Self::InvalidShareIndex(_)
            | Self::DuplicateShareIndex(_)
            | Self::InconsistentShareLength
            | Self::InvalidShareFormat
            | Self::InvalidKeyLength { .. }
            | Self::DivisionByZero
            | Self::Encoding(_) => ErrorKind::Validation,
            Self::IntegrityCheckFailed
            | Self::InvalidPasswordOrCorrupted
            | Self::FingerprintMismatch => ErrorKind::Integrity,
            Self::RandomSourceUnavailable(_) | Self::Primitive(_) => {
                ErrorKind::ResourceExhaustion
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SecretError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SecretError::InvalidThreshold(1).kind(), ErrorKind::Config);
        assert_eq!(SecretError::EmptyPassword.kind(), ErrorKind::Config);
        assert_eq!(
            SecretError::DuplicateShareIndex(3).kind(),
            ErrorKind::Validation
        );
        assert_eq!(SecretError::DivisionByZero.kind(), ErrorKind::Validation);
        assert_eq!(
            SecretError::InvalidPasswordOrCorrupted.kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            SecretError::RandomSourceUnavailable("gone".into()).kind(),
            ErrorKind::ResourceExhaustion
        );
    }

    #[test]
    fn test_unprotect_message_is_generic() {
        let message = SecretError::InvalidPasswordOrCorrupted.to_string();
        assert_eq!(message, "Invalid password or corrupted data");
    }
}
