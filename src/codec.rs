//! Base-58 text form of envelopes, shares, key fingerprints and protected
//! share bundles
//!
//! The core works on raw bytes; this module is the boundary where those bytes
//! become copy/paste and URL friendly strings. The base-58 alphabet needs no
//! percent-encoding inside a query string.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SecretError};
use crate::protection::ProtectedShare;
use crate::shamir::Share;
use crate::types::KeyFingerprint;

/// Path segment share links point at
pub const SHARE_PATH: &str = "share";

const PARAM_CIPHERTEXT: &str = "s";
const PARAM_NONCE: &str = "iv";
const PARAM_SALT: &str = "salt";

pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decodes base-58, ignoring surrounding whitespace
///
/// # Errors
/// [`SecretError::Encoding`] for characters outside the alphabet.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    bs58::decode(text.trim())
        .into_vec()
        .map_err(|e| SecretError::Encoding(e.to_string()))
}

pub fn encode_share(share: &Share) -> String {
    encode(&share.to_bytes())
}

pub fn decode_share(text: &str) -> Result<Share> {
    Share::from_bytes(&decode(text)?)
}

/// Decodes a list of share strings, skipping blank entries
///
/// # Example
/// ```
/// use shared_secret_encrypt::{ShamirShare, codec};
///
/// let shares = ShamirShare::builder(3, 2).build().unwrap().split(b"k").unwrap();
/// let texts = [codec::encode_share(&shares[0]), String::new(), codec::encode_share(&shares[2])];
///
/// let decoded = codec::decode_shares(texts.iter().map(String::as_str)).unwrap();
/// assert_eq!(decoded.len(), 2);
/// ```
pub fn decode_shares<'a, I>(texts: I) -> Result<Vec<Share>>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .map(decode_share)
        .collect()
}

/// Text form of a key fingerprint, stored next to the envelope text
pub fn encode_fingerprint(fingerprint: &KeyFingerprint) -> String {
    encode(fingerprint.as_bytes())
}

/// # Errors
/// * [`SecretError::Encoding`] for invalid base-58
/// * [`SecretError::InvalidKeyLength`] if the decoded value is not 32 bytes
pub fn decode_fingerprint(text: &str) -> Result<KeyFingerprint> {
    KeyFingerprint::from_slice(&decode(text)?)
}

/// The three base-58 parameters of a password-protected share link
///
/// Renders as `{base}/share?s=<ciphertext>&iv=<nonce>&salt=<salt>`.
///
/// # Example
/// ```
/// use shared_secret_encrypt::{ShareProtector, codec::ShareLink};
///
/// let protector = ShareProtector::default();
/// let bundle = protector.protect(b"share bytes", "correct-horse").unwrap();
///
/// let url = ShareLink::from_protected(&bundle).to_url("https://example.org");
/// let parsed = ShareLink::from_url(&url).unwrap().to_protected().unwrap();
/// assert_eq!(protector.unprotect(&parsed, "correct-horse").unwrap(), b"share bytes");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub ciphertext: String,
    pub nonce: String,
    pub salt: String,
}

impl ShareLink {
    pub fn from_protected(bundle: &ProtectedShare) -> Self {
        Self {
            ciphertext: encode(bundle.ciphertext()),
            nonce: encode(bundle.nonce()),
            salt: encode(bundle.salt()),
        }
    }

    /// # Errors
    /// * [`SecretError::Encoding`] for invalid base-58
    /// * [`SecretError::InvalidShareFormat`] for wrong salt, nonce or ciphertext sizes
    pub fn to_protected(&self) -> Result<ProtectedShare> {
        ProtectedShare::from_parts(
            &decode(&self.salt)?,
            &decode(&self.nonce)?,
            &decode(&self.ciphertext)?,
        )
    }

    pub fn to_query(&self) -> String {
        format!(
            "{PARAM_CIPHERTEXT}={}&{PARAM_NONCE}={}&{PARAM_SALT}={}",
            self.ciphertext, self.nonce, self.salt
        )
    }

    pub fn to_url(&self, base_url: &str) -> String {
        format!(
            "{}/{SHARE_PATH}?{}",
            base_url.trim_end_matches('/'),
            self.to_query()
        )
    }

    /// Parses `s=..&iv=..&salt=..`, with or without a leading `?`
    ///
    /// Unknown parameters are ignored; the first occurrence of a repeated one wins.
    ///
    /// # Errors
    /// [`SecretError::Encoding`] if a parameter is missing or empty.
    pub fn from_query(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let param = |name: &str| -> Result<String> {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| SecretError::Encoding(format!("missing parameter `{name}`")))
        };

        Ok(Self {
            ciphertext: param(PARAM_CIPHERTEXT)?,
            nonce: param(PARAM_NONCE)?,
            salt: param(PARAM_SALT)?,
        })
    }

    /// Parses a full share URL; anything after `#` is ignored
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.split_once('#').map_or(url, |(head, _)| head);
        let (_, query) = url
            .split_once('?')
            .ok_or_else(|| SecretError::Encoding("share link has no query".into()))?;
        Self::from_query(query)
    }
}
