//! Seal and open flows composed from the envelope engine, the splitter and
//! share protection.
//!
//! ```text
//! seal:  secret ─► EnvelopeEngine::encrypt ─► (envelope, key) ─► ShamirShare::split(key) ─► shares
//! open:  shares ─► ShamirShare::combine ─► key ─► EnvelopeEngine::decrypt(envelope, key) ─► secret
//! ```

use std::sync::Arc;

use tracing::{debug, warn};
#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

use crate::codec;
use crate::config::Config;
use crate::envelope::{Envelope, EnvelopeEngine};
use crate::error::{Result, SecretError};
use crate::protection::{ProtectedShare, ShareProtector};
use crate::provider::{CryptoProvider, SystemProvider};
use crate::shamir::{ShamirShare, Share};
use crate::types::{KeyFingerprint, SymmetricKey};

/// Output of [`SecretSharing::seal`]
///
/// The envelope and the shares travel separately. The fingerprint is only
/// present when [`Config::key_fingerprint`] is enabled.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    pub envelope: Envelope,
    pub shares: Vec<Share>,
    pub fingerprint: Option<KeyFingerprint>,
}

/// Envelope encryption with a threshold-split key
///
/// # Example
/// ```
/// use shared_secret_encrypt::SecretSharing;
///
/// let sharing = SecretSharing::builder(5, 3).build().unwrap();
/// let sealed = sharing.seal(b"hello world").unwrap();
///
/// let picked = [
///     sealed.shares[0].clone(),
///     sealed.shares[2].clone(),
///     sealed.shares[4].clone(),
/// ];
/// let secret = sharing.open(&sealed.envelope, &picked, None).unwrap();
/// assert_eq!(secret, b"hello world");
/// ```
#[derive(Debug, Clone)]
pub struct SecretSharing {
    scheme: ShamirShare,
    engine: EnvelopeEngine,
    protector: ShareProtector,
}

#[derive(Debug)]
pub struct SecretSharingBuilder {
    total_shares: usize,
    threshold: usize,
    config: Config,
    provider: Option<Arc<dyn CryptoProvider>>,
}

impl SecretSharingBuilder {
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

    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// # Errors
    /// Any configuration error of [`crate::ShamirShareBuilder::build`].
    pub fn build(self) -> Result<SecretSharing> {
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(SystemProvider));
        let scheme = ShamirShare::builder(self.total_shares, self.threshold)
            .with_config(self.config.clone())
            .with_provider(Arc::clone(&provider))
            .build()?;
        let engine = EnvelopeEngine::new(provider);
        let protector = ShareProtector::new(engine.clone(), &self.config)?;

        Ok(SecretSharing {
            scheme,
            engine,
            protector,
        })
    }
}

impl SecretSharing {
    pub fn builder(total_shares: usize, threshold: usize) -> SecretSharingBuilder {
        SecretSharingBuilder::new(total_shares, threshold)
    }

    pub fn scheme(&self) -> &ShamirShare {
        &self.scheme
    }

    pub fn engine(&self) -> &EnvelopeEngine {
        &self.engine
    }

    pub fn protector(&self) -> &ShareProtector {
        &self.protector
    }

    /// Encrypts `secret` and splits the key into shares
    ///
    /// The key is dropped (and zeroized with the `zeroize` feature) before
    /// this returns; only the shares can bring it back.
    pub fn seal(&self, secret: &[u8]) -> Result<SealedSecret> {
        let (envelope, key) = self.engine.encrypt(secret)?;
        let shares = self.scheme.split(key.as_bytes())?;
        let fingerprint = self
            .scheme
            .config()
            .key_fingerprint
            .then(|| key.fingerprint());

        debug!(
            shares = shares.len(),
            threshold = self.scheme.threshold(),
            fingerprint = fingerprint.is_some(),
            "sealed secret"
        );
        Ok(SealedSecret {
            envelope,
            shares,
            fingerprint,
        })
    }

    /// Recombines the key from `shares` and decrypts `envelope`
    ///
    /// Without a fingerprint, too few or mismatched shares surface as
    /// [`SecretError::IntegrityCheckFailed`] from the AEAD layer. With one,
    /// they are caught as [`SecretError::FingerprintMismatch`] before
    /// decryption is attempted.
    pub fn open(
        &self,
        envelope: &[u8],
        shares: &[Share],
        fingerprint: Option<&KeyFingerprint>,
    ) -> Result<Vec<u8>> {
        let key = self.recover_key(shares)?;

        if let Some(expected) = fingerprint {
            if !expected.matches(&key) {
                warn!(shares = shares.len(), "recovered key fails fingerprint");
                return Err(SecretError::FingerprintMismatch);
            }
        }

        let secret = self.engine.decrypt(envelope, &key).inspect_err(|e| {
            warn!(shares = shares.len(), error = %e, "envelope did not open");
        })?;
        debug!(shares = shares.len(), secret_len = secret.len(), "opened secret");
        Ok(secret)
    }

    /// Password-protects one share in its base-58 text form
    ///
    /// The plaintext inside the bundle is the same string
    /// [`codec::encode_share`] produces, so bundles from other tools that
    /// protect the share text open here too.
    pub fn protect_share(&self, share: &Share, password: &str) -> Result<ProtectedShare> {
        let mut text = codec::encode_share(share);
        let bundle = self.protector.protect(text.as_bytes(), password);
        #[cfg(feature = "zeroize")]
        text.zeroize();
        bundle
    }

    /// Recovers a share protected by [`SecretSharing::protect_share`]
    ///
    /// # Errors
    /// * Any error of [`ShareProtector::unprotect`]
    /// * [`SecretError::InvalidShareFormat`] or [`SecretError::Encoding`] if
    ///   the decrypted plaintext is not a base-58 share
    pub fn unprotect_share(&self, bundle: &[u8], password: &str) -> Result<Share> {
        let mut bytes = self.protector.unprotect(bundle, password)?;
        let share = std::str::from_utf8(&bytes)
            .map_err(|_| SecretError::InvalidShareFormat)
            .and_then(codec::decode_share);
        #[cfg(feature = "zeroize")]
        bytes.zeroize();
        share
    }

    fn recover_key(&self, shares: &[Share]) -> Result<SymmetricKey> {
        let mut key_bytes = ShamirShare::combine_with_mode(shares, self.scheme.config().mode)?;
        let key = SymmetricKey::from_slice(&key_bytes);
        #[cfg(feature = "zeroize")]
        key_bytes.zeroize();
        key
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::SeededProvider;
    use crate::types::KEY_LEN;

    fn pick(shares: &[Share], xs: &[u8]) -> Vec<Share> {
        shares
            .iter()
            .filter(|s| xs.contains(&s.index))
            .cloned()
            .collect()
    }

    #[test]
    fn test_hello_world_scenario() {
        let sharing = SecretSharing::builder(5, 3).build().unwrap();
        let sealed = sharing.seal(b"hello world").unwrap();
        assert_eq!(sealed.shares.len(), 5);
        assert!(sealed.fingerprint.is_none());
        for share in &sealed.shares {
            assert_eq!(share.len(), KEY_LEN);
        }

        let chosen = pick(&sealed.shares, &[1, 3, 5]);
        let key = ShamirShare::combine(&chosen).unwrap();
        assert_eq!(key.len(), KEY_LEN);
        assert_eq!(
            sharing.open(&sealed.envelope, &chosen, None).unwrap(),
            b"hello world"
        );
    }

    #[test]
    fn test_below_threshold_fails_at_aead() {
        let sharing = SecretSharing::builder(5, 3).build().unwrap();
        let sealed = sharing.seal(b"hello world").unwrap();

        let chosen = pick(&sealed.shares, &[2, 4]);
        let wrong_key = ShamirShare::combine(&chosen).unwrap();
        assert_eq!(wrong_key.len(), KEY_LEN);

        let err = sharing.open(&sealed.envelope, &chosen, None).unwrap_err();
        assert!(matches!(err, SecretError::IntegrityCheckFailed));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_fingerprint_catches_wrong_share_set() {
        let sharing = SecretSharing::builder(5, 3)
            .with_config(Config::new().with_key_fingerprint(true))
            .build()
            .unwrap();
        let sealed = sharing.seal(b"fingerprinted").unwrap();
        let fingerprint = sealed.fingerprint.unwrap();

        let good = pick(&sealed.shares, &[1, 2, 3]);
        assert_eq!(
            sharing
                .open(&sealed.envelope, &good, Some(&fingerprint))
                .unwrap(),
            b"fingerprinted"
        );

        let too_few = pick(&sealed.shares, &[4, 5]);
        assert!(matches!(
            sharing.open(&sealed.envelope, &too_few, Some(&fingerprint)),
            Err(SecretError::FingerprintMismatch)
        ));
    }

    #[test]
    fn test_mixed_splits_are_caught() {
        let sharing = SecretSharing::builder(3, 2).build().unwrap();
        let first = sharing.seal(b"first").unwrap();
        let second = sharing.seal(b"second").unwrap();

        let mixed = vec![first.shares[0].clone(), second.shares[1].clone()];
        assert!(matches!(
            sharing.open(&first.envelope, &mixed, None),
            Err(SecretError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_foreign_share_length() {
        let sharing = SecretSharing::builder(3, 2).build().unwrap();
        let sealed = sharing.seal(b"abc").unwrap();
        let short = vec![
            Share::new(1, vec![1; 16]).unwrap(),
            Share::new(2, vec![2; 16]).unwrap(),
        ];
        assert!(matches!(
            sharing.open(&sealed.envelope, &short, None),
            Err(SecretError::InvalidKeyLength {
                expected: 32,
                got: 16
            })
        ));
    }

    #[test]
    fn test_empty_secret_is_sealable() {
        let sharing = SecretSharing::builder(2, 2).build().unwrap();
        let sealed = sharing.seal(b"").unwrap();
        assert_eq!(sealed.envelope.len(), Envelope::MIN_LEN);
        assert!(
            sharing
                .open(&sealed.envelope, &sealed.shares, None)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_share_protection_round_trip() {
        let sharing = SecretSharing::builder(3, 2)
            .with_provider(Arc::new(SeededProvider::new(21)))
            .build()
            .unwrap();
        let sealed = sharing.seal(b"transported").unwrap();

        let bundle = sharing
            .protect_share(&sealed.shares[1], "correct-horse")
            .unwrap();
        let recovered = sharing.unprotect_share(&bundle, "correct-horse").unwrap();
        assert_eq!(recovered, sealed.shares[1]);

        assert!(matches!(
            sharing.unprotect_share(&bundle, "wrong-password"),
            Err(SecretError::InvalidPasswordOrCorrupted)
        ));

        let shares = vec![sealed.shares[0].clone(), recovered];
        assert_eq!(
            sharing.open(&sealed.envelope, &shares, None).unwrap(),
            b"transported"
        );
    }

    #[test]
    fn test_bundle_of_share_text_opens() {
        let sharing = SecretSharing::builder(3, 2).build().unwrap();
        let sealed = sharing.seal(b"interop").unwrap();
        let share = &sealed.shares[2];

        // A bundle made directly over the share's text form
        let text = codec::encode_share(share);
        let bundle = ShareProtector::default()
            .protect(text.as_bytes(), "pw")
            .unwrap();
        let recovered = sharing.unprotect_share(&bundle, "pw").unwrap();
        assert_eq!(&recovered, share);
        assert_eq!(recovered.len(), KEY_LEN);

        // and the pipeline's own bundles carry exactly that text
        let own = sharing.protect_share(share, "pw").unwrap();
        let plaintext = sharing.protector().unprotect(&own, "pw").unwrap();
        assert_eq!(plaintext, text.as_bytes());
    }

    #[test]
    fn test_bundle_of_raw_share_bytes_is_rejected() {
        let sharing = SecretSharing::builder(3, 2).build().unwrap();
        let sealed = sharing.seal(b"raw").unwrap();

        let bundle = ShareProtector::default()
            .protect(&sealed.shares[0].to_bytes(), "pw")
            .unwrap();
        let err = sharing.unprotect_share(&bundle, "pw").unwrap_err();
        assert!(matches!(
            err,
            SecretError::InvalidShareFormat | SecretError::Encoding(_)
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_accessors_reflect_configuration() {
        let sharing = SecretSharing::builder(7, 4).build().unwrap();
        assert_eq!(sharing.scheme().total_shares(), 7);
        assert_eq!(sharing.scheme().threshold(), 4);
        assert_eq!(sharing.protector().iterations(), 100_000);

        let sealed = sharing.seal(b"accessors").unwrap();
        let key = SymmetricKey::from_slice(&ShamirShare::combine(&sealed.shares).unwrap()).unwrap();
        assert_eq!(
            sharing.engine().decrypt(&sealed.envelope, &key).unwrap(),
            b"accessors"
        );
    }

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_failed_open_warns_once() {
        let sharing = SecretSharing::builder(5, 3).build().unwrap();
        let sealed = sharing.seal(b"quiet").unwrap();
        let too_few = pick(&sealed.shares, &[2, 4]);

        let warnings = count_warnings(|| {
            assert!(sharing.open(&sealed.envelope, &too_few, None).is_err());
        });
        assert_eq!(warnings, 1);

        // The engine alone reports rejection below warn level
        let key = SymmetricKey::new([0u8; KEY_LEN]);
        let warnings = count_warnings(|| {
            assert!(sharing.engine().decrypt(&sealed.envelope, &key).is_err());
        });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_seeded_pipeline_is_reproducible() {
        let build = || {
            SecretSharing::builder(4, 2)
                .with_provider(Arc::new(SeededProvider::new(5)))
                .build()
                .unwrap()
        };
        let a = build().seal(b"deterministic").unwrap();
        let b = build().seal(b"deterministic").unwrap();
        assert_eq!(a.envelope, b.envelope);
        assert_eq!(a.shares, b.shares);
    }

    #[test]
    fn test_builder_errors_propagate() {
        assert!(matches!(
            SecretSharing::builder(2, 3).build(),
            Err(SecretError::ThresholdTooLarge { .. })
        ));
        let config = Config {
            kdf_iterations: 1,
            ..Config::default()
        };
        assert!(matches!(
            SecretSharing::builder(3, 2).with_config(config).build(),
            Err(SecretError::InvalidConfig(_))
        ));
    }
}
