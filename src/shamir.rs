use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
#[cfg(feature = "zeroize")]
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{Config, SplitMode};
use crate::error::{Result, SecretError};
use crate::gf256::Gf256;
use crate::provider::{CryptoProvider, SystemProvider};

/// Largest share count GF(2^8) supports: one share per nonzero x-coordinate
pub const MAX_SHARES: usize = 255;

/// Smallest meaningful threshold
pub const MIN_THRESHOLD: usize = 2;

/// A share in Shamir's Secret Sharing scheme
///
/// `index` is the x-coordinate of the share and `data` holds one polynomial
/// evaluation per byte of the split secret. Fewer than the threshold number of
/// shares reveal nothing about the secret.
///
/// The byte form is `index (1 byte) ‖ data`, see [`Share::to_bytes`].
///
/// # Example
/// ```
/// use shared_secret_encrypt::ShamirShare;
///
/// let shamir = ShamirShare::builder(5, 3).build().unwrap();
/// let shares = shamir.split(b"secret").unwrap();
///
/// assert_eq!(shares[0].index, 1);
/// assert_eq!(shares[0].data.len(), 6);
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "zeroize", derive(Zeroize, ZeroizeOnDrop))]
pub struct Share {
    /// Index of the share (x-coordinate in the polynomial, 1..=255)
    pub index: u8,
    /// The share data (y-coordinates for each byte of the secret)
    pub data: Vec<u8>,
}

impl Share {
    /// Creates a share after checking its x-coordinate and length
    ///
    /// # Errors
    /// * [`SecretError::InvalidShareIndex`] for index 0
    /// * [`SecretError::InvalidShareFormat`] for empty data
    pub fn new(index: u8, data: Vec<u8>) -> Result<Self> {
        if index == 0 {
            return Err(SecretError::InvalidShareIndex(index));
        }
        if data.is_empty() {
            return Err(SecretError::InvalidShareFormat);
        }
        Ok(Self { index, data })
    }

    /// Length of the secret this share belongs to
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serializes as `index ‖ data`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.data.len());
        bytes.push(self.index);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Parses the `index ‖ data` form produced by [`Share::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&index, data)) => Self::new(index, data.to_vec()),
            None => Err(SecretError::InvalidShareFormat),
        }
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("index", &self.index)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Threshold splitter over GF(2^8)
///
/// Each byte of the secret becomes the constant term of its own random
/// polynomial of degree `threshold - 1`; share `x` carries that polynomial
/// evaluated at `x` for every byte. Coefficients are drawn fresh from the
/// configured [`CryptoProvider`] on every call to [`ShamirShare::split`].
///
/// # Example
/// ```
/// use shared_secret_encrypt::ShamirShare;
///
/// let scheme = ShamirShare::builder(5, 3).build().unwrap();
/// let shares = scheme.split(b"my secret data").unwrap();
///
/// let reconstructed = ShamirShare::combine(&shares[1..4]).unwrap();
/// assert_eq!(reconstructed, b"my secret data");
/// ```
#[derive(Debug, Clone)]
pub struct ShamirShare {
    total_shares: u8,
    threshold: u8,
    config: Config,
    provider: Arc<dyn CryptoProvider>,
}

/// Builder for [`ShamirShare`]
///
/// Bounds are checked in [`ShamirShareBuilder::build`], so a scheme that
/// exists always satisfies `2 <= threshold <= total_shares <= 255`.
#[derive(Debug)]
pub struct ShamirShareBuilder {
    total_shares: usize,
    threshold: usize,
    config: Config,
    provider: Option<Arc<dyn CryptoProvider>>,
}

impl ShamirShareBuilder {
    pub fn new(total_shares: usize, threshold: usize) -> Self {
        Self {
            total_shares,
            threshold,
            config: Config::default(),
            provider: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default [`SystemProvider`]
    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Builds the scheme
    ///
    /// # Errors
    /// * [`SecretError::InvalidShareCount`] if `total_shares` is outside 2..=255
    /// * [`SecretError::InvalidThreshold`] if `threshold` < 2
    /// * [`SecretError::ThresholdTooLarge`] if `threshold` > `total_shares`
    /// * [`SecretError::InvalidConfig`] if the configuration does not validate
    pub fn build(self) -> Result<ShamirShare> {
        if !(MIN_THRESHOLD..=MAX_SHARES).contains(&self.total_shares) {
            return Err(SecretError::InvalidShareCount(self.total_shares));
        }
        if self.threshold < MIN_THRESHOLD {
            return Err(SecretError::InvalidThreshold(self.threshold));
        }
        if self.threshold > self.total_shares {
            return Err(SecretError::ThresholdTooLarge {
                threshold: self.threshold,
                total_shares: self.total_shares,
            });
        }
        self.config.validate()?;

        // threshold <= total_shares <= MAX_SHARES, both fit in a u8
        Ok(ShamirShare {
            total_shares: self.total_shares as u8,
            threshold: self.threshold as u8,
            config: self.config,
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(SystemProvider)),
        })
    }
}

impl ShamirShare {
    pub fn builder(total_shares: usize, threshold: usize) -> ShamirShareBuilder {
        ShamirShareBuilder::new(total_shares, threshold)
    }

    pub fn total_shares(&self) -> u8 {
        self.total_shares
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Splits a secret into `total_shares` shares at x = 1..=total_shares
    ///
    /// # Errors
    /// * [`SecretError::EmptySecret`] if `secret` is empty
    /// * [`SecretError::RandomSourceUnavailable`] if coefficients cannot be drawn
    pub fn split(&self, secret: &[u8]) -> Result<Vec<Share>> {
        if secret.is_empty() {
            return Err(SecretError::EmptySecret);
        }
        debug!(
            total_shares = self.total_shares,
            threshold = self.threshold,
            secret_len = secret.len(),
            "splitting secret"
        );

        let degree = self.threshold as usize - 1;

        // Coefficients 1..t of the polynomial for byte i live at
        // coefficients[i * degree..(i + 1) * degree]
        let mut coefficients = vec![0u8; secret.len() * degree];
        self.provider.fill_random(&mut coefficients)?;

        let evaluate = |x: Gf256| -> Share {
            let data = secret
                .iter()
                .zip(coefficients.chunks_exact(degree))
                .map(|(&constant, coeffs)| {
                    // Horner's method from the highest-degree coefficient down
                    let acc = coeffs
                        .iter()
                        .rev()
                        .fold(Gf256::ZERO, |acc, &c| acc * x + Gf256::new(c));
                    (acc * x + Gf256::new(constant)).value()
                })
                .collect();
            Share {
                index: x.value(),
                data,
            }
        };

        let xs: Vec<Gf256> = (1..=self.total_shares).map(Gf256::new).collect();
        let shares = match self.config.mode {
            SplitMode::Sequential => xs.into_iter().map(evaluate).collect(),
            SplitMode::Parallel => xs.into_par_iter().map(evaluate).collect(),
        };

        #[cfg(feature = "zeroize")]
        coefficients.zeroize();

        Ok(shares)
    }

    /// Reconstructs the secret by Lagrange interpolation at x = 0
    ///
    /// Any set of at least `threshold` shares from one split returns the
    /// original secret. A smaller set still returns a byte string of the right
    /// length, but the wrong one; nothing here can tell the difference. Pair
    /// this with an authenticated layer (see [`crate::EnvelopeEngine`]).
    ///
    /// # Errors
    /// * [`SecretError::InsufficientShares`] for fewer than 2 shares
    /// * [`SecretError::InvalidShareIndex`] for a share at x = 0
    /// * [`SecretError::DuplicateShareIndex`] for repeated x-coordinates
    /// * [`SecretError::InconsistentShareLength`] for mismatched lengths
    /// * [`SecretError::InvalidShareFormat`] for empty shares
    pub fn combine(shares: &[Share]) -> Result<Vec<u8>> {
        Self::combine_with_mode(shares, SplitMode::Sequential)
    }

    /// [`ShamirShare::combine`] with an explicit processing mode
    pub fn combine_with_mode(shares: &[Share], mode: SplitMode) -> Result<Vec<u8>> {
        let secret_len = validate_shares(shares)?;
        debug!(shares = shares.len(), secret_len, "combining shares");

        let coefficients = lagrange_at_zero(shares)?;
        let interpolate = |byte_idx: usize| -> u8 {
            shares
                .iter()
                .zip(&coefficients)
                .fold(Gf256::ZERO, |acc, (share, &coeff)| {
                    acc + coeff * Gf256::new(share.data[byte_idx])
                })
                .value()
        };

        let secret = match mode {
            SplitMode::Sequential => (0..secret_len).map(interpolate).collect(),
            SplitMode::Parallel => (0..secret_len).into_par_iter().map(interpolate).collect(),
        };
        Ok(secret)
    }
}

/// Checks that `shares` can be interpolated and returns their common length
fn validate_shares(shares: &[Share]) -> Result<usize> {
    let first = match shares {
        [first, _, ..] => first,
        _ => {
            return Err(SecretError::InsufficientShares {
                needed: MIN_THRESHOLD,
                got: shares.len(),
            });
        }
    };

    let secret_len = first.data.len();
    if secret_len == 0 {
        return Err(SecretError::InvalidShareFormat);
    }

    let mut seen = [false; 256];
    for share in shares {
        if share.index == 0 {
            return Err(SecretError::InvalidShareIndex(share.index));
        }
        if std::mem::replace(&mut seen[share.index as usize], true) {
            return Err(SecretError::DuplicateShareIndex(share.index));
        }
        if share.data.len() != secret_len {
            return Err(SecretError::InconsistentShareLength);
        }
    }
    Ok(secret_len)
}

/// Lagrange basis polynomials evaluated at zero
///
/// For share i: prod_{j != i} x_j / (x_i - x_j), with subtraction being XOR.
fn lagrange_at_zero(shares: &[Share]) -> Result<Vec<Gf256>> {
    let xs: Vec<Gf256> = shares.iter().map(|s| Gf256::new(s.index)).collect();
    xs.iter()
        .enumerate()
        .map(|(i, &x_i)| {
            let (numerator, denominator) = xs
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold((Gf256::ONE, Gf256::ONE), |(num, den), (_, &x_j)| {
                    (num * x_j, den * (x_i - x_j))
                });
            numerator.div(denominator)
        })
        .collect()
}
