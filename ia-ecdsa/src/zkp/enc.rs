//! $\Pi^{enc}$: Paillier encryption in range
//!
//! Proves knowledge of $k \in \pm 2^\ell$ and $\rho$ such that $K = (1 + N_0)^k \rho^{N_0} \bmod N_0^2$.

use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{append_bn, append_ring_pedersen, ensure, ProofContext, ProofError};
use crate::{
    paillier::{Ciphertext, EncryptionKey},
    ring_pedersen::RingPedersen,
    utils::{
        modmul, random_bn_in_z_star, random_plusminus_by_size, random_plusminus_scaled,
        within_bound_by_size,
    },
};

/// Public input
pub struct Statement<'a> {
    /// Prover's Paillier key $N_0$
    pub ek: &'a EncryptionKey,
    /// Ciphertext $K$
    pub k: &'a Ciphertext,
    /// Verifier's ring-Pedersen parameters
    pub rp: &'a RingPedersen,
}

/// Prover's secret
pub struct Witness<'a> {
    /// Plaintext $k$
    pub k: &'a BigNumber,
    /// Nonce $\rho$
    pub rho: &'a BigNumber,
}

/// Proof of encryption in range
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncProof {
    s: BigNumber,
    a: BigNumber,
    c: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    z3: BigNumber,
}

impl EncProof {
    /// Constructs a proof
    pub fn prove<R: RngCore + CryptoRng>(
        ctx: &ProofContext,
        statement: &Statement,
        witness: &Witness,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let security = ctx.security();
        let n0 = statement.ek.n();
        let n_hat = statement.rp.n();

        let alpha = random_plusminus_by_size(rng, security.ell + security.epsilon);
        let mu = random_plusminus_scaled(rng, security.ell, n_hat);
        let r = random_bn_in_z_star(rng, n0).ok_or(ProofError::RetryLimit)?;
        let gamma = random_plusminus_scaled(rng, security.ell + security.epsilon, n_hat);

        let s = statement
            .rp
            .commit(witness.k, &mu)
            .ok_or(ProofError::NotInvertible("s"))?;
        let a = statement.ek.encrypt_with_nonce(&alpha, &r);
        let c = statement
            .rp
            .commit(&alpha, &gamma)
            .ok_or(ProofError::NotInvertible("c"))?;

        let e = challenge(ctx, statement, &s, &a, &c)?;

        let z1 = alpha + &e * witness.k;
        let z2 = modmul(&r, &witness.rho.modpow(&e, n0), n0);
        let z3 = gamma + &e * &mu;

        Ok(Self {
            s,
            a,
            c,
            z1,
            z2,
            z3,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement) -> Result<(), ProofError> {
        let security = ctx.security();
        if !within_bound_by_size(&self.z1, security.ell + security.epsilon) {
            return Err(ProofError::OutOfRange("z1"));
        }
        let e = challenge(ctx, statement, &self.s, &self.a, &self.c)?;

        let ek = statement.ek;
        let lhs = ek.encrypt_with_nonce(&self.z1, &self.z2);
        let k_e = ek
            .mul(statement.k, &e)
            .map_err(|_| ProofError::NotInvertible("K"))?;
        ensure(lhs == ek.add(&self.a, &k_e), "paillier equation")?;

        let lhs = statement
            .rp
            .commit(&self.z1, &self.z3)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let n_hat = statement.rp.n();
        let rhs = modmul(&self.c, &self.s.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen equation")
    }
}

fn challenge(
    ctx: &ProofContext,
    statement: &Statement,
    s: &BigNumber,
    a: &BigNumber,
    c: &BigNumber,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.enc");
    append_bn(&mut transcript, b"N0", statement.ek.n());
    append_bn(&mut transcript, b"K", statement.k);
    append_ring_pedersen(&mut transcript, statement.rp);
    append_bn(&mut transcript, b"S", s);
    append_bn(&mut transcript, b"A", a);
    append_bn(&mut transcript, b"C", c);
    ctx.challenge(&mut transcript)
}
