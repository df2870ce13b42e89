//! Trusted dealer
//!
//! Splits a secret key into Shamir shares and attaches Paillier and ring-Pedersen material built
//! from caller-supplied primes. The dealer learns the secret key, so it's a single point of
//! failure. Only use it for tests and demos.
//!
//! ```rust,no_run
//! # fn primes() -> Vec<(ia_ecdsa::BigNumber, ia_ecdsa::BigNumber)> { unimplemented!() }
//! # fn doc(
//! #     rng: &mut (impl rand_core::RngCore + rand_core::CryptoRng),
//! # ) -> Result<(), ia_ecdsa::trusted_dealer::TrustedDealerError> {
//! use ia_ecdsa::{generic_ec::curves::Secp256k1, BigNumber};
//!
//! let keys = (1..=3u64).map(BigNumber::from).collect::<Vec<_>>();
//! let shares = ia_ecdsa::trusted_dealer::builder::<Secp256k1>(1, keys)
//!     .set_paillier_primes(primes())
//!     .generate_shares(rng)?;
//! # Ok(()) }
//! ```

use generic_ec::{Curve, Point, Scalar, SecretScalar};
use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::{
    curve::bn_to_scalar,
    key_share::{InvalidKeyShare, KeyShare, PublicAux},
    paillier::{DecryptionKey, PaillierError},
    ring_pedersen::RingPedersen,
};

/// Starts building key shares for parties with given keys
pub fn builder<E: Curve>(threshold: u16, keys: Vec<BigNumber>) -> TrustedDealerBuilder<E> {
    TrustedDealerBuilder {
        threshold,
        keys,
        shared_secret_key: None,
        primes: Vec::new(),
    }
}

/// Trusted dealer builder
pub struct TrustedDealerBuilder<E: Curve> {
    threshold: u16,
    keys: Vec<BigNumber>,
    shared_secret_key: Option<SecretScalar<E>>,
    primes: Vec<(BigNumber, BigNumber)>,
}

impl<E: Curve> TrustedDealerBuilder<E> {
    /// Sets the secret key to be shared, a random one is generated otherwise
    pub fn set_shared_secret_key(self, sk: SecretScalar<E>) -> Self {
        Self {
            shared_secret_key: Some(sk),
            ..self
        }
    }

    /// Sets Paillier primes, one pair per party in the order of keys
    pub fn set_paillier_primes(self, primes: Vec<(BigNumber, BigNumber)>) -> Self {
        Self { primes, ..self }
    }

    /// Generates key shares, in the order of keys
    pub fn generate_shares<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<Vec<KeyShare<E>>, TrustedDealerError> {
        if self.primes.len() != self.keys.len() {
            return Err(TrustedDealerError::PrimesCount {
                expected: self.keys.len(),
                got: self.primes.len(),
            });
        }
        let sk = self
            .shared_secret_key
            .unwrap_or_else(|| SecretScalar::random(rng));
        let public_key = Point::generator() * sk.as_ref();

        let coefficients = core::iter::once(*sk.as_ref())
            .chain((0..self.threshold).map(|_| Scalar::random(rng)))
            .collect::<Vec<_>>();
        let shares = self
            .keys
            .iter()
            .map(|key| {
                let x = bn_to_scalar::<E>(key);
                let mut share = coefficients
                    .iter()
                    .rev()
                    .fold(Scalar::<E>::zero(), |acc, a| acc * x + a);
                SecretScalar::new(&mut share)
            })
            .collect::<Vec<_>>();

        let dks = self
            .primes
            .into_iter()
            .map(|(p, q)| DecryptionKey::from_primes(p, q))
            .collect::<Result<Vec<_>, _>>()?;
        let parties = self
            .keys
            .iter()
            .zip(&shares)
            .zip(&dks)
            .map(|((key, share), dk)| {
                let rp = RingPedersen::generate(rng, dk.encryption_key().n(), &dk.phi())?;
                Ok(PublicAux {
                    key: key.clone(),
                    public_share: Point::generator() * share.as_ref(),
                    ek: dk.encryption_key().clone(),
                    rp,
                })
            })
            .collect::<Result<Vec<_>, PaillierError>>()?;

        self.keys
            .into_iter()
            .zip(shares)
            .zip(dks)
            .map(|((key, share), dk)| {
                KeyShare::new(key, self.threshold, share, public_key, parties.clone(), dk)
                    .map_err(TrustedDealerError::from)
            })
            .collect()
    }
}

/// Trusted dealer failed
#[derive(Debug, Error)]
pub enum TrustedDealerError {
    /// Number of prime pairs differs from number of parties
    #[error("expected {expected} pairs of primes, got {got}")]
    PrimesCount {
        /// Number of parties
        expected: usize,
        /// Number of prime pairs
        got: usize,
    },
    /// Paillier key couldn't be built
    #[error("invalid paillier key")]
    Paillier(#[from] PaillierError),
    /// Resulting key share is invalid
    #[error("generated key share is invalid")]
    InvalidKeyShare(#[from] InvalidKeyShare),
}
