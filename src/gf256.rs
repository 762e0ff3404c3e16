use std::ops::{Add, Mul, Sub};

use crate::error::{Result, SecretError};

/// Reduction term of the AES polynomial x^8 + x^4 + x^3 + x + 1 (0x11B)
const REDUCTION: u8 = 0x1b;

/// Constant-time multiplication in GF(2^8)
///
/// Shift-and-add over all eight bits of `b` with no data-dependent branches.
#[inline]
fn mul_const_time(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    for _ in 0..8 {
        // 0xFF when the low bit of b is set, 0x00 otherwise
        product ^= a & 0u8.wrapping_sub(b & 1);
        let carry = 0u8.wrapping_sub(a >> 7);
        a = (a << 1) ^ (REDUCTION & carry);
        b >>= 1;
    }
    product
}

/// Element of GF(2^8) under the AES polynomial
///
/// Addition and subtraction are XOR. Multiplication and inversion run in
/// constant time, so no log/antilog lookups are indexed by secret bytes.
///
/// # Example
/// ```
/// use shared_secret_encrypt::Gf256;
///
/// let a = Gf256::new(0x57);
/// let b = Gf256::new(0x83);
/// assert_eq!(a * b, Gf256::new(0xc1));
/// assert_eq!((a * b).div(b).unwrap(), a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Gf256(pub u8);

impl Gf256 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    #[inline]
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Raises the element to `exp` by square-and-multiply
    #[inline]
    pub fn pow(self, mut exp: u32) -> Self {
        let mut result = Self::ONE;
        let mut base = self;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            exp >>= 1;
        }
        result
    }

    /// Multiplicative inverse, `None` for zero
    ///
    /// Computed as a^254, since a^255 = 1 for every nonzero a.
    #[inline]
    pub fn inverse(self) -> Option<Self> {
        if self.0 == 0 {
            None
        } else {
            Some(self.pow(254))
        }
    }

    /// Field division
    ///
    /// # Errors
    /// [`SecretError::DivisionByZero`] when `rhs` is zero.
    #[inline]
    pub fn div(self, rhs: Self) -> Result<Self> {
        rhs.inverse()
            .map(|inv| self * inv)
            .ok_or(SecretError::DivisionByZero)
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl Add for Gf256 {
    type Output = Self;

    #[inline]
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Sub for Gf256 {
    type Output = Self;

    // Characteristic 2: subtraction is addition
    #[inline]
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl Mul for Gf256 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(mul_const_time(self.0, rhs.0))
    }
}
