//! Multiplicative-to-additive share conversion
//!
//! Party A holds secret $a$ (committed as $A = a \cdot G$), party B published
//! $K_B = \text{Enc}_B(b)$. A samples $\beta \in [0, q^3)$ and [responds](respond) with
//!
//! * $D = K_B^a \cdot \text{Enc}_B(q^3 - \beta)$
//! * $F = \text{Enc}_A(q^3 - \beta)$
//! * an [affine operation proof](crate::zkp::affg) binding $D$, $F$ and $A$
//!
//! B [decrypts](receive) $D$ to obtain $\alpha = ab + q^3 - \beta$. Then $\alpha + \beta \equiv ab
//! \pmod q$. Nothing wraps around modulo $N$ because $ab + q^3 < N$.

use generic_ec::{Curve, Point, Scalar};
use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    curve::{bn_to_scalar, curve_order, scalar_to_bn},
    paillier::{Ciphertext, DecryptionKey, EncryptionKey, PaillierError},
    ring_pedersen::RingPedersen,
    zkp::{affg, ProofContext, ProofError},
};

/// MtA response sent from A to B
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MtaResponse<E: Curve> {
    /// $D$, encrypted under B's key
    pub d: Ciphertext,
    /// $F$, encrypted under A's key
    pub f: Ciphertext,
    /// Proof of correct $D$ and $F$
    pub proof: affg::AffgProof<E>,
}

/// Public data of MtA instance
pub struct MtaStatement<'a, E: Curve> {
    /// Key of B (receiver)
    pub receiver_ek: &'a EncryptionKey,
    /// Key of A (responder)
    pub responder_ek: &'a EncryptionKey,
    /// $K_B$
    pub k: &'a Ciphertext,
    /// $A = a \cdot G$
    pub big_a: &'a Point<E>,
    /// Ring-Pedersen parameters of B
    pub receiver_rp: &'a RingPedersen,
}

/// Runs A's side of MtA, returns the response and A's additive share $\beta$
pub fn respond<E: Curve, R: RngCore + CryptoRng>(
    ctx: &ProofContext,
    statement: &MtaStatement<E>,
    a: &Scalar<E>,
    rng: &mut R,
) -> Result<(MtaResponse<E>, BigNumber), MtaError> {
    let q = curve_order::<E>();
    let q3 = &q * &q * &q;
    let beta = BigNumber::from_rng(&q3, rng);
    let y = &q3 - &beta;
    let a = scalar_to_bn(a);

    let (y_enc_b, s) = statement.receiver_ek.encrypt(rng, &y)?;
    let a_times_k = statement.receiver_ek.mul(statement.k, &a)?;
    let d = statement.receiver_ek.add(&a_times_k, &y_enc_b);
    let (f, r) = statement.responder_ek.encrypt(rng, &y)?;

    let proof = affg::AffgProof::prove(
        ctx,
        &affg::Statement {
            ek0: statement.receiver_ek,
            ek1: statement.responder_ek,
            c: statement.k,
            d: &d,
            y: &f,
            x: statement.big_a,
            rp: statement.receiver_rp,
        },
        &affg::Witness {
            x: &a,
            y: &y,
            rho: &s,
            rho_y: &r,
        },
        rng,
    )?;

    Ok((MtaResponse { d, f, proof }, beta))
}

impl<E: Curve> MtaResponse<E> {
    /// Verifies the response on B's side
    ///
    /// `ctx` is the proof context of A.
    pub fn verify(
        &self,
        ctx: &ProofContext,
        statement: &MtaStatement<E>,
    ) -> Result<(), ProofError> {
        self.proof.verify(
            ctx,
            &affg::Statement {
                ek0: statement.receiver_ek,
                ek1: statement.responder_ek,
                c: statement.k,
                d: &self.d,
                y: &self.f,
                x: statement.big_a,
                rp: statement.receiver_rp,
            },
        )
    }
}

/// Runs B's side of MtA: decrypts $D$ into the additive share $\alpha$
pub fn receive<E: Curve>(dk: &DecryptionKey, d: &Ciphertext) -> Result<Scalar<E>, PaillierError> {
    dk.decrypt(d).map(|alpha| bn_to_scalar(&alpha))
}

/// MtA failed on the responder side
#[derive(Debug, Error)]
pub enum MtaError {
    /// Homomorphic operation failed
    #[error("paillier operation failed")]
    Paillier(#[from] PaillierError),
    /// Affine operation proof couldn't be constructed
    #[error("couldn't construct affine operation proof")]
    Proof(#[from] ProofError),
}
