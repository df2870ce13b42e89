//! $\Pi^{mul*}$: multiplication of a Paillier ciphertext by a group-committed value
//!
//! Proves that $D = C^x \rho^{N_0} \bmod N_0^2$ and $X = x \cdot G$ for $x \in \pm 2^\ell$.

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
    /// Paillier key $N_0$ of $C$ and $D$
    pub ek: &'a EncryptionKey,
    /// $C$
    pub c: &'a Ciphertext,
    /// $D$
    pub d: &'a Ciphertext,
    /// $X = x \cdot G$
    pub x: &'a Point<E>,
    /// Verifier's ring-Pedersen parameters
    pub rp: &'a RingPedersen,
}

/// Prover's secret
pub struct Witness<'a> {
    /// Multiplier $x$
    pub x: &'a BigNumber,
    /// Nonce $\rho$ of $D$
    pub rho: &'a BigNumber,
}

/// Proof of multiplication by a committed value
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MulstarProof<E: Curve> {
    a: BigNumber,
    b_x: Point<E>,
    e: BigNumber,
    s: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    w: BigNumber,
}

impl<E: Curve> MulstarProof<E> {
    /// Constructs a proof
    pub fn prove<R: RngCore + CryptoRng>(
        ctx: &ProofContext,
        statement: &Statement<E>,
        witness: &Witness,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let security = ctx.security();
        let ek = statement.ek;
        let n0 = ek.n();
        let n_hat = statement.rp.n();

        let alpha = random_plusminus_by_size(rng, security.ell + security.epsilon);
        let r = random_bn_in_z_star(rng, n0).ok_or(ProofError::RetryLimit)?;
        let gamma = random_plusminus_scaled(rng, security.ell + security.epsilon, n_hat);
        let m = random_plusminus_scaled(rng, security.ell, n_hat);

        let c_alpha = ek
            .mul(statement.c, &alpha)
            .map_err(|_| ProofError::NotInvertible("C"))?;
        let a = modmul(&c_alpha, &r.modpow(n0, ek.nn()), ek.nn());
        let b_x = Point::generator() * bn_to_scalar::<E>(&alpha);
        let e_commit = statement
            .rp
            .commit(&alpha, &gamma)
            .ok_or(ProofError::NotInvertible("E"))?;
        let s = statement
            .rp
            .commit(witness.x, &m)
            .ok_or(ProofError::NotInvertible("S"))?;

        let e = challenge(ctx, statement, &a, &b_x, &e_commit, &s)?;

        Ok(Self {
            z1: alpha + &e * witness.x,
            z2: gamma + &e * &m,
            w: modmul(&r, &witness.rho.modpow(&e, n0), n0),
            a,
            b_x,
            e: e_commit,
            s,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement<E>) -> Result<(), ProofError> {
        let security = ctx.security();
        if !within_bound_by_size(&self.z1, security.ell + security.epsilon) {
            return Err(ProofError::OutOfRange("z1"));
        }
        let e = challenge(ctx, statement, &self.a, &self.b_x, &self.e, &self.s)?;

        let ek = statement.ek;
        let nn = ek.nn();
        let lhs = modmul(
            &ek.mul(statement.c, &self.z1)
                .map_err(|_| ProofError::NotInvertible("C"))?,
            &self.w.modpow(ek.n(), nn),
            nn,
        );
        let rhs = modmul(&self.a, &statement.d.modpow(&e, nn), nn);
        ensure(lhs == rhs, "product equation")?;

        let lhs = Point::generator() * bn_to_scalar::<E>(&self.z1);
        let rhs = self.b_x + statement.x * bn_to_scalar::<E>(&e);
        ensure(lhs == rhs, "group commitment")?;

        let n_hat = statement.rp.n();
        let lhs = statement
            .rp
            .commit(&self.z1, &self.z2)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let rhs = modmul(&self.e, &self.s.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen equation")
    }
}

fn challenge<E: Curve>(
    ctx: &ProofContext,
    statement: &Statement<E>,
    a: &BigNumber,
    b_x: &Point<E>,
    e: &BigNumber,
    s: &BigNumber,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.mulstar");
    append_bn(&mut transcript, b"N0", statement.ek.n());
    append_bn(&mut transcript, b"C", statement.c);
    append_bn(&mut transcript, b"D", statement.d);
    append_point(&mut transcript, b"X", statement.x);
    append_ring_pedersen(&mut transcript, statement.rp);
    append_bn(&mut transcript, b"A", a);
    append_point(&mut transcript, b"Bx", b_x);
    append_bn(&mut transcript, b"E", e);
    append_bn(&mut transcript, b"S", s);
    ctx.challenge(&mut transcript)
}
