//! $\Pi^{mul}$: Paillier multiplication
//!
//! Proves that $C = Y^x \rho^N \bmod N^2$ where $X = (1 + N)^x \rho_x^N \bmod N^2$, all under the
//! prover's key. Ring-Pedersen parameters are not involved.

use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{append_bn, ensure, ProofContext, ProofError};
use crate::{
    paillier::{Ciphertext, EncryptionKey},
    utils::{modmul, random_bn_in_z_star},
};

/// Public input
pub struct Statement<'a> {
    /// Prover's Paillier key
    pub ek: &'a EncryptionKey,
    /// $X$, encryption of the multiplier
    pub x: &'a Ciphertext,
    /// $Y$
    pub y: &'a Ciphertext,
    /// $C$, the product
    pub c: &'a Ciphertext,
}

/// Prover's secret
pub struct Witness<'a> {
    /// Multiplier $x$
    pub x: &'a BigNumber,
    /// Nonce of $C$
    pub rho: &'a BigNumber,
    /// Nonce of $X$
    pub rho_x: &'a BigNumber,
}

/// Proof of Paillier multiplication
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MulProof {
    a: BigNumber,
    b: BigNumber,
    z: BigNumber,
    u: BigNumber,
    v: BigNumber,
}

impl MulProof {
    /// Constructs a proof
    pub fn prove<R: RngCore + CryptoRng>(
        ctx: &ProofContext,
        statement: &Statement,
        witness: &Witness,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let ek = statement.ek;
        let n = ek.n();
        let alpha = BigNumber::from_rng(n, rng);
        let r = random_bn_in_z_star(rng, n).ok_or(ProofError::RetryLimit)?;
        let s = random_bn_in_z_star(rng, n).ok_or(ProofError::RetryLimit)?;

        let a = modmul(
            &statement.y.modpow(&alpha, ek.nn()),
            &r.modpow(n, ek.nn()),
            ek.nn(),
        );
        let b = ek.encrypt_with_nonce(&alpha, &s);

        let e = challenge(ctx, statement, &a, &b)?;

        Ok(Self {
            z: alpha + &e * witness.x,
            u: modmul(&r, &witness.rho.modpow(&e, n), n),
            v: modmul(&s, &witness.rho_x.modpow(&e, n), n),
            a,
            b,
        })
    }

    /// Verifies the proof
    pub fn verify(&self, ctx: &ProofContext, statement: &Statement) -> Result<(), ProofError> {
        if self.z < BigNumber::zero() {
            return Err(ProofError::OutOfRange("z"));
        }
        let e = challenge(ctx, statement, &self.a, &self.b)?;
        let ek = statement.ek;
        let nn = ek.nn();

        let lhs = modmul(
            &statement.y.modpow(&self.z, nn),
            &self.u.modpow(ek.n(), nn),
            nn,
        );
        let rhs = modmul(&self.a, &statement.c.modpow(&e, nn), nn);
        ensure(lhs == rhs, "product equation")?;

        let lhs = ek.encrypt_with_nonce(&self.z, &self.v);
        let rhs = modmul(&self.b, &statement.x.modpow(&e, nn), nn);
        ensure(lhs == rhs, "encryption of multiplier")
    }
}

fn challenge(
    ctx: &ProofContext,
    statement: &Statement,
    a: &BigNumber,
    b: &BigNumber,
) -> Result<BigNumber, ProofError> {
    let mut transcript = ctx.transcript(b"ia-ecdsa.zkp.mul");
    append_bn(&mut transcript, b"N", statement.ek.n());
    append_bn(&mut transcript, b"X", statement.x);
    append_bn(&mut transcript, b"Y", statement.y);
    append_bn(&mut transcript, b"C", statement.c);
    append_bn(&mut transcript, b"A", a);
    append_bn(&mut transcript, b"B", b);
    ctx.challenge(&mut transcript)
}
