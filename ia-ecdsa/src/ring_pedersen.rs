//! Ring-Pedersen commitment parameters
//!
//! $(\hat N, s, t)$ where $t$ is a random quadratic residue and $s = t^\lambda$. Range proofs commit
//! to secrets as $s^x t^r \bmod \hat N$ under the verifier's parameters.

use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    paillier::PaillierError,
    utils::{modmul, modpow_signed, random_bn_in_z_star},
};

/// Ring-Pedersen parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingPedersen {
    n: BigNumber,
    s: BigNumber,
    t: BigNumber,
}

impl RingPedersen {
    /// Constructs parameters from their components
    pub fn new(n: BigNumber, s: BigNumber, t: BigNumber) -> Self {
        Self { n, s, t }
    }

    /// Generates parameters over modulus $N = pq$
    ///
    /// `phi` is $\varphi(N)$. Parameters may share modulus with a Paillier key of the same party.
    pub fn generate<R: RngCore + CryptoRng>(
        rng: &mut R,
        n: &BigNumber,
        phi: &BigNumber,
    ) -> Result<Self, PaillierError> {
        let r = random_bn_in_z_star(rng, n).ok_or(PaillierError::RetryLimit)?;
        let t = modmul(&r, &r, n);
        let lambda = BigNumber::from_rng(phi, rng);
        let s = t.modpow(&lambda, n);
        Ok(Self {
            n: n.clone(),
            s,
            t,
        })
    }

    /// $\hat N$
    pub fn n(&self) -> &BigNumber {
        &self.n
    }
    /// $s$
    pub fn s(&self) -> &BigNumber {
        &self.s
    }
    /// $t$
    pub fn t(&self) -> &BigNumber {
        &self.t
    }

    /// Computes $s^x t^r \bmod \hat N$
    ///
    /// Returns `None` if an exponent is negative while the base is not invertible.
    pub fn commit(&self, x: &BigNumber, r: &BigNumber) -> Option<BigNumber> {
        let sx = modpow_signed(&self.s, x, &self.n)?;
        let tr = modpow_signed(&self.t, r, &self.n)?;
        Some(modmul(&sx, &tr, &self.n))
    }

    /// Checks that $s, t \in \mathbb{Z}^*_{\hat N}$ and the modulus is large enough
    pub fn is_well_formed(&self, min_bits: usize) -> bool {
        let in_group = |x: &BigNumber| {
            x > &BigNumber::one() && x < &self.n && x.gcd(&self.n) == BigNumber::one()
        };
        let big_enough = min_bits == 0 || self.n >= (BigNumber::one() << (min_bits - 1));
        big_enough && in_group(&self.s) && in_group(&self.t)
    }
}
