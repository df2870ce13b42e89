//! $\Pi^{log*}$: knowledge of exponent vs Paillier encryption
//!
//! Proves that $C = (1 + N_0)^x \rho^{N_0} \bmod N_0^2$ and $X = x \cdot B$ for the same
//! $x \in \pm 2^\ell$, where $B$ is a public base point.

use generic_ec::{Curve, Point};
use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{append_bn, append_point, append_ring_pedersen, ensure, ProofContext, ProofError};
use crate::{
    curve::bn_to_scalar,
    paillier::{Ciphertext, EncryptionKey},
    ring_pedersen::RingPedersen,
    utils::{
        modmul, random_bn_in_z_star, random_plusminus_by_size, random_plusminus_scaled,
        within_bound_by_size,
    },
};

/// Public input
pub struct Statement<'a, E: Curve> {
    /// Prover's Paillier key
    pub ek: &'a EncryptionKey,
    /// $C$
    pub c: &'a Ciphertext,
    /// $X$
    pub x: &'a Point<E>,
    /// Base point $B$
    pub base: &'a Point<E>,
    /// Verifier's ring-Pedersen parameters
    pub rp: &'a RingPedersen,
}

/// Prover's secret
pub struct Witness<'a> {
    /// $x$
    pub x: &'a BigNumber,
    /// Nonce of $C$
    pub rho: &'a BigNumber,
}

/// Proof of knowledge of exponent
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LogstarProof<E: Curve> {
    s: BigNumber,
    a: BigNumber,
    y: Point<E>,
    d: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    z3: BigNumber,
}

impl<E: Curve> LogstarProof<E> {
    /// Constructs a proof
    pub fn prove<R: RngCore + CryptoRng>(
        ctx: &ProofContext,
        statement: &Statement<E>,
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
            .commit(witness.x, &mu)
            .ok_or(ProofError::NotInvertible("S"))?;
        let a = statement.ek.encrypt_with_nonce(&alpha, &r);
        let y = statement.base * bn_to_scalar::<E>(&alpha);
        let d = statement
            .rp
            .commit(&alpha, &gamma)
            .ok_or(ProofError::NotInvertible("D"))?;

        let e = challenge(ctx, statement, &s, &a, &y, &d)?;

        Ok(Self {
            z1: alpha + &e * witness.x,
            z2: modmul(&r, &witness.rho.modpow(&e, n0), n0),
            z3: gamma + &e * &mu,
            s,
            a,
            y,
            d,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement<E>) -> Result<(), ProofError> {
        let security = ctx.security();
        if !within_bound_by_size(&self.z1, security.ell + security.epsilon) {
            return Err(ProofError::OutOfRange("z1"));
        }
        let e = challenge(ctx, statement, &self.s, &self.a, &self.y, &self.d)?;

        let ek = statement.ek;
        let lhs = ek.encrypt_with_nonce(&self.z1, &self.z2);
        let rhs = ek.add(
            &self.a,
            &ek.mul(statement.c, &e)
                .map_err(|_| ProofError::NotInvertible("C"))?,
        );
        ensure(lhs == rhs, "paillier equation")?;

        let lhs = statement.base * bn_to_scalar::<E>(&self.z1);
        let rhs = self.y + statement.x * bn_to_scalar::<E>(&e);
        ensure(lhs == rhs, "discrete log")?;

        let n_hat = statement.rp.n();
        let lhs = statement
            .rp
            .commit(&self.z1, &self.z3)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let rhs = modmul(&self.d, &self.s.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen equation")
    }
}

fn challenge<E: Curve>(
    ctx: &ProofContext,
    statement: &Statement<E>,
    s: &BigNumber,
    a: &BigNumber,
    y: &Point<E>,
    d: &BigNumber,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.logstar");
    append_bn(&mut transcript, b"N0", statement.ek.n());
    append_bn(&mut transcript, b"C", statement.c);
    append_point(&mut transcript, b"X", statement.x);
    append_point(&mut transcript, b"B", statement.base);
    append_ring_pedersen(&mut transcript, statement.rp);
    append_bn(&mut transcript, b"S", s);
    append_bn(&mut transcript, b"A", a);
    append_point(&mut transcript, b"Y", y);
    append_bn(&mut transcript, b"D", d);
    ctx.challenge(&mut transcript)
}
