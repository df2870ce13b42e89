//! $\Pi^{dec}$: Paillier decryption modulo $q$
//!
//! Proves that $C = (1 + N_0)^y \rho^{N_0} \bmod N_0^2$ and $x \equiv y \pmod q$ for a public $x$.
//! Used by identification to show that a recombined accumulator decrypts to the share that was
//! sent earlier.

use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{append_bn, append_ring_pedersen, ensure, ProofContext, ProofError};
use crate::{
    paillier::{Ciphertext, EncryptionKey},
    ring_pedersen::RingPedersen,
    utils::{modmul, random_bn_in_z_star, random_plusminus_scaled},
};

/// Public input
pub struct Statement<'a> {
    /// Prover's Paillier key $N_0$
    pub ek: &'a EncryptionKey,
    /// Ciphertext $C$
    pub c: &'a Ciphertext,
    /// Claimed plaintext modulo $q$
    pub x: &'a BigNumber,
    /// Verifier's ring-Pedersen parameters
    pub rp: &'a RingPedersen,
}

/// Prover's secret
pub struct Witness<'a> {
    /// Plaintext $y \in [0, N_0)$
    pub y: &'a BigNumber,
    /// Nonce $\rho$
    pub rho: &'a BigNumber,
}

/// Proof of decryption modulo $q$
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecProof {
    s: BigNumber,
    t: BigNumber,
    a: BigNumber,
    gamma: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    w: BigNumber,
}

impl DecProof {
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

        // plaintext may be as large as N0, mask scales accordingly
        let alpha = random_plusminus_scaled(rng, security.ell + security.epsilon, n0);
        let mu = random_plusminus_scaled(rng, security.ell, n_hat);
        let nu = random_plusminus_scaled(rng, security.ell + security.epsilon, n_hat);
        let r = random_bn_in_z_star(rng, n0).ok_or(ProofError::RetryLimit)?;

        let s = statement
            .rp
            .commit(witness.y, &mu)
            .ok_or(ProofError::NotInvertible("S"))?;
        let t = statement
            .rp
            .commit(&alpha, &nu)
            .ok_or(ProofError::NotInvertible("T"))?;
        let a = statement.ek.encrypt_with_nonce(&alpha, &r);
        let gamma = alpha.nmod(ctx.q());

        let e = challenge(ctx, statement, &s, &t, &a, &gamma)?;

        Ok(Self {
            z1: alpha + &e * witness.y,
            z2: nu + &e * &mu,
            w: modmul(&r, &witness.rho.modpow(&e, n0), n0),
            s,
            t,
            a,
            gamma,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement) -> Result<(), ProofError> {
        let e = challenge(ctx, statement, &self.s, &self.t, &self.a, &self.gamma)?;

        let ek = statement.ek;
        let lhs = ek.encrypt_with_nonce(&self.z1, &self.w);
        let rhs = ek.add(
            &self.a,
            &ek.mul(statement.c, &e)
                .map_err(|_| ProofError::NotInvertible("C"))?,
        );
        ensure(lhs == rhs, "paillier equation")?;

        let q = ctx.q();
        let lhs = self.z1.nmod(q);
        let rhs = (&self.gamma + &e * statement.x).nmod(q);
        ensure(lhs == rhs, "plaintext modulo q")?;

        let n_hat = statement.rp.n();
        let lhs = statement
            .rp
            .commit(&self.z1, &self.z2)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let rhs = modmul(&self.t, &self.s.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen equation")
    }
}

fn challenge(
    ctx: &ProofContext,
    statement: &Statement,
    s: &BigNumber,
    t: &BigNumber,
    a: &BigNumber,
    gamma: &BigNumber,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.dec");
    append_bn(&mut transcript, b"N0", statement.ek.n());
    append_bn(&mut transcript, b"C", statement.c);
    append_bn(&mut transcript, b"x", statement.x);
    append_ring_pedersen(&mut transcript, statement.rp);
    append_bn(&mut transcript, b"S", s);
    append_bn(&mut transcript, b"T", t);
    append_bn(&mut transcript, b"A", a);
    append_bn(&mut transcript, b"gamma", gamma);
    ctx.challenge(&mut transcript)
}
