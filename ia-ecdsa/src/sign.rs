//! Signing protocol
//!
//! Given a [presignature](crate::presign::PreSignatureData), signing takes a single broadcast
//! round: every party publishes $\sigma_i = k_i m + r \chi_i$ and anyone can assemble the
//! signature $(r, \sum_i \sigma_i)$.
//!
//! Signing may be done under a child key $pk + \delta \cdot G$ where $\delta$ is an additive
//! derivation shift. Then $\sigma_i = k_i m + r \chi_i + r k_i \delta$.

use generic_ec::{Curve, Point, Scalar};
use serde::{Deserialize, Serialize};

use crate::{
    curve::{affine_x, bn_to_scalar, curve_order, scalar_to_bn},
    presign::PreSignatureData,
};

pub(crate) mod identification;
pub(crate) mod output;
pub(crate) mod round1;

/// ECDSA signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SignatureData<E: Curve> {
    /// $r$ component
    pub r: Scalar<E>,
    /// $s$ component
    pub s: Scalar<E>,
    /// Recovery id: bit 0 is parity of $R_y$, bit 1 is set if $R_x \geq q$
    pub recovery_id: u8,
    /// Signed digest
    pub m: Scalar<E>,
}

impl<E: Curve> SignatureData<E> {
    /// Replaces $s$ with $\min(s, q - s)$
    ///
    /// Negating $s$ corresponds to negating $R$, so parity bit of recovery id is flipped too.
    pub fn normalize_s(&mut self) {
        let half_q = curve_order::<E>() >> 1;
        if scalar_to_bn(&self.s) > half_q {
            self.s = -self.s;
            self.recovery_id ^= 1;
        }
    }

    /// Whether $s \le q / 2$
    pub fn is_normalized(&self) -> bool {
        scalar_to_bn(&self.s) <= curve_order::<E>() >> 1
    }

    /// Verifies the signature against public key
    pub fn verify(&self, public_key: &Point<E>) -> Result<(), InvalidSignature> {
        if self.r.is_zero() || self.s.is_zero() {
            return Err(InvalidSignature);
        }
        let s_inv = self.s.invert().ok_or(InvalidSignature)?;
        let u1 = self.m * s_inv;
        let u2 = self.r * s_inv;
        let big_r = Point::generator() * u1 + *public_key * u2;
        let (x, _) = affine_x(&big_r).ok_or(InvalidSignature)?;
        if bn_to_scalar::<E>(&x) == self.r {
            Ok(())
        } else {
            Err(InvalidSignature)
        }
    }

    /// Encodes $(r, s)$ as `r || s`, each component is big-endian and padded to the size of the
    /// curve order
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.r.to_be_bytes().as_ref().to_vec();
        bytes.extend_from_slice(self.s.to_be_bytes().as_ref());
        bytes
    }
}

/// Signature doesn't verify
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("signature is invalid")]
pub struct InvalidSignature;

/// Local data of a signing run
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct SignTemp<E: Curve> {
    pub presignature: PreSignatureData<E>,
    pub message: Scalar<E>,
    pub derivation_delta: Scalar<E>,
    pub sigma_share: Option<Scalar<E>>,
    pub output: Option<SignatureData<E>>,
    /// Set when the assembled signature doesn't verify and identification follows
    pub signature_invalid: bool,
}

impl<E: Curve> SignTemp<E> {
    pub fn new(
        presignature: PreSignatureData<E>,
        message: Scalar<E>,
        derivation_delta: Option<Scalar<E>>,
    ) -> Self {
        Self {
            presignature,
            message,
            derivation_delta: derivation_delta.unwrap_or_else(Scalar::zero),
            sigma_share: None,
            output: None,
            signature_invalid: false,
        }
    }

    /// $m + r \delta$, the plaintext factor of $k_i$ in $\sigma_i$
    pub fn message_factor(&self, r: Scalar<E>) -> Scalar<E> {
        self.message + r * self.derivation_delta
    }

    /// Public key the signature is verified against
    pub fn derived_public_key(&self, public_key: Point<E>) -> Point<E> {
        public_key + Point::generator() * self.derivation_delta
    }
}
