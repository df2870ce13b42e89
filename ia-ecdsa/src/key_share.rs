//! Key share
//!
//! [`KeyShare`] is the output of distributed key generation and auxiliary info generation, both
//! of which happen outside of this crate. For tests and demos, shares may be produced by the
//! [trusted dealer](crate::trusted_dealer) (requires `spof` feature).

use core::fmt;

use generic_ec::{Curve, Point, Scalar, SecretScalar};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    curve::bn_to_scalar,
    paillier::{DecryptionKey, EncryptionKey},
    params::Parameters,
    party::PartyIndex,
    ring_pedersen::RingPedersen,
};

/// Public data of a party
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublicAux<E: Curve> {
    /// Key of the party, evaluation point of its share
    pub key: BigNumber,
    /// $X_j = x_j \cdot G$
    pub public_share: Point<E>,
    /// Paillier encryption key
    pub ek: EncryptionKey,
    /// Ring-Pedersen parameters
    pub rp: RingPedersen,
}

/// Secret key share of a party
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KeyShare<E: Curve> {
    own_key: BigNumber,
    threshold: u16,
    x: SecretScalar<E>,
    public_key: Point<E>,
    parties: Vec<PublicAux<E>>,
    dk: DecryptionKey,
}

impl<E: Curve> KeyShare<E> {
    /// Constructs and [validates](Self::validate) a key share
    ///
    /// `parties` must contain public data of every party holding a share, including the local one.
    pub fn new(
        own_key: BigNumber,
        threshold: u16,
        x: SecretScalar<E>,
        public_key: Point<E>,
        mut parties: Vec<PublicAux<E>>,
        dk: DecryptionKey,
    ) -> Result<Self, InvalidKeyShare> {
        parties.sort_by(|a, b| a.key.cmp(&b.key));
        let share = Self {
            own_key,
            threshold,
            x,
            public_key,
            parties,
            dk,
        };
        share.validate()?;
        Ok(share)
    }

    /// Checks consistency of the key share
    pub fn validate(&self) -> Result<(), InvalidKeyShare> {
        if self.parties.windows(2).any(|w| w[0].key == w[1].key) {
            return Err(InvalidKeyShare::DuplicateKey);
        }
        if usize::from(self.threshold) >= self.parties.len() {
            return Err(InvalidKeyShare::ThresholdTooLarge);
        }
        let own = self.public_aux(&self.own_key)?;
        if own.public_share != Point::generator() * self.x.as_ref() {
            return Err(InvalidKeyShare::OwnShareMismatch);
        }
        if &own.ek != self.dk.encryption_key() {
            return Err(InvalidKeyShare::OwnPaillierKeyMismatch);
        }
        if !self.parties.iter().all(|p| p.rp.is_well_formed(0)) {
            return Err(InvalidKeyShare::InvalidRingPedersen);
        }

        // any t+1 public shares interpolate to the public key
        let quorum = &self.parties[..usize::from(self.threshold) + 1];
        let keys = quorum
            .iter()
            .map(|p| bn_to_scalar::<E>(&p.key))
            .collect::<Vec<_>>();
        let mut interpolated = Point::zero();
        for (i, party) in quorum.iter().enumerate() {
            let lambda = lagrange_at_zero(&keys, i).ok_or(InvalidKeyShare::DuplicateKey)?;
            interpolated = interpolated + party.public_share * lambda;
        }
        if interpolated != self.public_key {
            return Err(InvalidKeyShare::InconsistentPublicShares);
        }
        Ok(())
    }

    /// Shared public key
    pub fn public_key(&self) -> Point<E> {
        self.public_key
    }
    /// Threshold $t$
    pub fn threshold(&self) -> u16 {
        self.threshold
    }
    /// Key of the local party
    pub fn own_key(&self) -> &BigNumber {
        &self.own_key
    }
    /// Public data of all parties, sorted by key
    pub fn parties(&self) -> &[PublicAux<E>] {
        &self.parties
    }

    fn public_aux(&self, key: &BigNumber) -> Result<&PublicAux<E>, InvalidKeyShare> {
        self.parties
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .and_then(|i| self.parties.get(i))
            .ok_or(InvalidKeyShare::UnknownParty)
    }

    /// Converts the share into an additive share of the signing subset
    ///
    /// Signers are [`Parameters::parties`]. The local share $x_i$ is multiplied by Lagrange
    /// coefficient $\lambda_i$, so that $\sum_j w_j$ equals the secret key.
    pub fn signing_key(&self, params: &Parameters<E>) -> Result<SigningKey<E>, InvalidKeyShare> {
        if params.threshold() != self.threshold {
            return Err(InvalidKeyShare::ThresholdMismatch);
        }
        if params.own().key() != &self.own_key {
            return Err(InvalidKeyShare::OwnKeyMismatch);
        }
        let signers = params
            .parties()
            .iter()
            .map(|party| self.public_aux(party.key()))
            .collect::<Result<Vec<_>, _>>()?;
        let min_bits = params.security().min_paillier_bits;
        if !signers.iter().all(|p| p.rp.is_well_formed(min_bits)) {
            return Err(InvalidKeyShare::InvalidRingPedersen);
        }
        let keys = signers
            .iter()
            .map(|p| bn_to_scalar::<E>(&p.key))
            .collect::<Vec<_>>();
        let lambdas = (0..keys.len())
            .map(|i| lagrange_at_zero(&keys, i).ok_or(InvalidKeyShare::DuplicateKey))
            .collect::<Result<Vec<_>, _>>()?;

        let own = usize::from(params.own_index());
        let mut w = lambdas[own] * self.x.as_ref();
        let big_w = signers
            .iter()
            .zip(&lambdas)
            .map(|(p, lambda)| p.public_share * lambda)
            .collect::<Vec<_>>();
        if big_w.iter().sum::<Point<E>>() != self.public_key {
            return Err(InvalidKeyShare::InconsistentPublicShares);
        }

        Ok(SigningKey {
            w: SecretScalar::new(&mut w),
            big_w,
            public_key: self.public_key,
            dk: self.dk.clone(),
            eks: signers.iter().map(|p| p.ek.clone()).collect(),
            rps: signers.iter().map(|p| p.rp.clone()).collect(),
        })
    }
}

impl<E: Curve> fmt::Debug for KeyShare<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyShare")
            .field("own_key", &self.own_key)
            .field("threshold", &self.threshold)
            .field("x", &"[redacted]")
            .field("public_key", &self.public_key)
            .field("parties", &self.parties)
            .finish()
    }
}

/// Key material of one signing session, indexed by [`PartyIndex`]
#[derive(Clone)]
pub struct SigningKey<E: Curve> {
    w: SecretScalar<E>,
    big_w: Vec<Point<E>>,
    public_key: Point<E>,
    dk: DecryptionKey,
    eks: Vec<EncryptionKey>,
    rps: Vec<RingPedersen>,
}

impl<E: Curve> SigningKey<E> {
    /// Shared public key
    pub fn public_key(&self) -> Point<E> {
        self.public_key
    }
    /// $W_j = w_j \cdot G$
    pub fn public_share(&self, j: PartyIndex) -> Option<&Point<E>> {
        self.big_w.get(usize::from(j))
    }

    pub(crate) fn w(&self) -> &Scalar<E> {
        self.w.as_ref()
    }
    pub(crate) fn dk(&self) -> &DecryptionKey {
        &self.dk
    }
    pub(crate) fn ek(&self, j: PartyIndex) -> Option<&EncryptionKey> {
        self.eks.get(usize::from(j))
    }
    pub(crate) fn rp(&self, j: PartyIndex) -> Option<&RingPedersen> {
        self.rps.get(usize::from(j))
    }
}

impl<E: Curve> fmt::Debug for SigningKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("w", &"[redacted]")
            .field("big_w", &self.big_w)
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Lagrange coefficient of `keys[i]` for interpolation at zero
///
/// Returns `None` if keys are not distinct.
pub(crate) fn lagrange_at_zero<E: Curve>(keys: &[Scalar<E>], i: usize) -> Option<Scalar<E>> {
    let x_i = keys.get(i)?;
    let mut num = Scalar::<E>::one();
    let mut denom = Scalar::<E>::one();
    for (j, x_j) in keys.iter().enumerate() {
        if j == i {
            continue;
        }
        num *= x_j;
        denom *= x_j - x_i;
    }
    Some(num * denom.invert()?)
}

/// Key share is invalid
#[derive(Debug, Error)]
pub enum InvalidKeyShare {
    /// Two parties share the same key
    #[error("party keys are not distinct")]
    DuplicateKey,
    /// Party is not a holder of the key
    #[error("party is unknown to the key share")]
    UnknownParty,
    /// Threshold requires more parties than there are
    #[error("threshold is too large")]
    ThresholdTooLarge,
    /// Threshold differs from the one in parameters
    #[error("threshold doesn't match parameters")]
    ThresholdMismatch,
    /// Key share belongs to another party
    #[error("key share belongs to another party")]
    OwnKeyMismatch,
    /// $x_i \cdot G \neq X_i$
    #[error("secret share doesn't match public share")]
    OwnShareMismatch,
    /// Own Paillier keys don't match
    #[error("paillier decryption key doesn't match encryption key")]
    OwnPaillierKeyMismatch,
    /// Public shares don't interpolate to the public key
    #[error("public shares are inconsistent with public key")]
    InconsistentPublicShares,
    /// Ring-Pedersen parameters of a party are outside $\mathbb{Z}^*_{\hat N}$ or the modulus
    /// is too small
    #[error("ring-pedersen parameters are malformed")]
    InvalidRingPedersen,
}
