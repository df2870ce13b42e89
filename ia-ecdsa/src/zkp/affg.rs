//! $\Pi^{aff\text{-}g}$: Paillier affine operation with group commitment in range
//!
//! Statement: $D = C^x \cdot (1 + N_0)^y \rho^{N_0} \bmod N_0^2$, $Y = (1 + N_1)^y \rho_y^{N_1}
//! \bmod N_1^2$ and $X = x \cdot G$ where $x \in \pm 2^\ell$ and $y \in \pm 2^{\ell'}$.
//!
//! $N_0$ is the key of the party who owns $C$ (receiver of MtA), $N_1$ is the key of the prover.

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
    /// Receiver's key $N_0$
    pub ek0: &'a EncryptionKey,
    /// Prover's key $N_1$
    pub ek1: &'a EncryptionKey,
    /// $C$, encrypted under $N_0$
    pub c: &'a Ciphertext,
    /// $D$, encrypted under $N_0$
    pub d: &'a Ciphertext,
    /// $Y$, encrypted under $N_1$
    pub y: &'a Ciphertext,
    /// $X = x \cdot G$
    pub x: &'a Point<E>,
    /// Verifier's ring-Pedersen parameters
    pub rp: &'a RingPedersen,
}

/// Prover's secret
pub struct Witness<'a> {
    /// Multiplier $x$
    pub x: &'a BigNumber,
    /// Additive term $y$
    pub y: &'a BigNumber,
    /// Nonce of $D$
    pub rho: &'a BigNumber,
    /// Nonce of $Y$
    pub rho_y: &'a BigNumber,
}

/// Proof of affine operation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct AffgProof<E: Curve> {
    a: BigNumber,
    b_x: Point<E>,
    b_y: BigNumber,
    e: BigNumber,
    s: BigNumber,
    f: BigNumber,
    t: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    z3: BigNumber,
    z4: BigNumber,
    w: BigNumber,
    w_y: BigNumber,
}

struct Commitment<'a, E: Curve> {
    a: &'a BigNumber,
    b_x: &'a Point<E>,
    b_y: &'a BigNumber,
    e: &'a BigNumber,
    s: &'a BigNumber,
    f: &'a BigNumber,
    t: &'a BigNumber,
}

impl<E: Curve> AffgProof<E> {
    /// Constructs a proof
    pub fn prove<R: RngCore + CryptoRng>(
        ctx: &ProofContext,
        statement: &Statement<E>,
        witness: &Witness,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let security = ctx.security();
        let n0 = statement.ek0.n();
        let n1 = statement.ek1.n();
        let n_hat = statement.rp.n();

        let alpha = random_plusminus_by_size(rng, security.ell + security.epsilon);
        let beta = random_plusminus_by_size(rng, security.ell_prime + security.epsilon);
        let r = random_bn_in_z_star(rng, n0).ok_or(ProofError::RetryLimit)?;
        let r_y = random_bn_in_z_star(rng, n1).ok_or(ProofError::RetryLimit)?;
        let gamma = random_plusminus_scaled(rng, security.ell + security.epsilon, n_hat);
        let delta = random_plusminus_scaled(rng, security.ell + security.epsilon, n_hat);
        let m = random_plusminus_scaled(rng, security.ell, n_hat);
        let mu = random_plusminus_scaled(rng, security.ell, n_hat);

        let c_alpha = statement
            .ek0
            .mul(statement.c, &alpha)
            .map_err(|_| ProofError::NotInvertible("C"))?;
        let a = statement
            .ek0
            .add(&c_alpha, &statement.ek0.encrypt_with_nonce(&beta, &r));
        let b_x = Point::generator() * bn_to_scalar::<E>(&alpha);
        let b_y = statement.ek1.encrypt_with_nonce(&beta, &r_y);
        let commit = |x: &BigNumber, r: &BigNumber, what| {
            statement
                .rp
                .commit(x, r)
                .ok_or(ProofError::NotInvertible(what))
        };
        let e_commit = commit(&alpha, &gamma, "E")?;
        let s = commit(witness.x, &m, "S")?;
        let f = commit(&beta, &delta, "F")?;
        let t = commit(witness.y, &mu, "T")?;

        let e = challenge(
            ctx,
            statement,
            &Commitment {
                a: &a,
                b_x: &b_x,
                b_y: &b_y,
                e: &e_commit,
                s: &s,
                f: &f,
                t: &t,
            },
        )?;

        let z1 = alpha + &e * witness.x;
        let z2 = beta + &e * witness.y;
        let z3 = gamma + &e * &m;
        let z4 = delta + &e * &mu;
        let w = modmul(&r, &witness.rho.modpow(&e, n0), n0);
        let w_y = modmul(&r_y, &witness.rho_y.modpow(&e, n1), n1);

        Ok(Self {
            a,
            b_x,
            b_y,
            e: e_commit,
            s,
            f,
            t,
            z1,
            z2,
            z3,
            z4,
            w,
            w_y,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement<E>) -> Result<(), ProofError> {
        let security = ctx.security();
        if !within_bound_by_size(&self.z1, security.ell + security.epsilon) {
            return Err(ProofError::OutOfRange("z1"));
        }
        if !within_bound_by_size(&self.z2, security.ell_prime + security.epsilon) {
            return Err(ProofError::OutOfRange("z2"));
        }

        let e = challenge(
            ctx,
            statement,
            &Commitment {
                a: &self.a,
                b_x: &self.b_x,
                b_y: &self.b_y,
                e: &self.e,
                s: &self.s,
                f: &self.f,
                t: &self.t,
            },
        )?;

        let ek0 = statement.ek0;
        let lhs = ek0.add(
            &ek0.mul(statement.c, &self.z1)
                .map_err(|_| ProofError::NotInvertible("C"))?,
            &ek0.encrypt_with_nonce(&self.z2, &self.w),
        );
        let rhs = ek0.add(
            &self.a,
            &ek0.mul(statement.d, &e)
                .map_err(|_| ProofError::NotInvertible("D"))?,
        );
        ensure(lhs == rhs, "affine equation")?;

        let ek1 = statement.ek1;
        let lhs = ek1.encrypt_with_nonce(&self.z2, &self.w_y);
        let rhs = ek1.add(
            &self.b_y,
            &ek1.mul(statement.y, &e)
                .map_err(|_| ProofError::NotInvertible("Y"))?,
        );
        ensure(lhs == rhs, "encryption of y")?;

        let lhs = Point::generator() * bn_to_scalar::<E>(&self.z1);
        let rhs = self.b_x + statement.x * bn_to_scalar::<E>(&e);
        ensure(lhs == rhs, "group commitment")?;

        let n_hat = statement.rp.n();
        let lhs = statement
            .rp
            .commit(&self.z1, &self.z3)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let rhs = modmul(&self.e, &self.s.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen commitment of x")?;

        let lhs = statement
            .rp
            .commit(&self.z2, &self.z4)
            .ok_or(ProofError::NotInvertible("s, t"))?;
        let rhs = modmul(&self.f, &self.t.modpow(&e, n_hat), n_hat);
        ensure(lhs == rhs, "ring-pedersen commitment of y")
    }
}

fn challenge<E: Curve>(
    ctx: &ProofContext,
    statement: &Statement<E>,
    commitment: &Commitment<E>,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.affg");
    append_bn(&mut transcript, b"N0", statement.ek0.n());
    append_bn(&mut transcript, b"N1", statement.ek1.n());
    append_bn(&mut transcript, b"C", statement.c);
    append_bn(&mut transcript, b"D", statement.d);
    append_bn(&mut transcript, b"Y", statement.y);
    append_point(&mut transcript, b"X", statement.x);
    append_ring_pedersen(&mut transcript, statement.rp);
    append_bn(&mut transcript, b"A", commitment.a);
    append_point(&mut transcript, b"Bx", commitment.b_x);
    append_bn(&mut transcript, b"By", commitment.b_y);
    append_bn(&mut transcript, b"E", commitment.e);
    append_bn(&mut transcript, b"S", commitment.s);
    append_bn(&mut transcript, b"F", commitment.f);
    append_bn(&mut transcript, b"T", commitment.t);
    ctx.challenge(&mut transcript)
}
