//! Glue between curve arithmetic and big integers
//!
//! Paillier plaintexts and proof responses live in $\mathbb{Z}$ while shares live in
//! $\mathbb{Z}_q$. Functions of this module move values between the two worlds. Affine
//! coordinates are read from the SEC1 compressed encoding, so only short Weierstrass
//! curves (secp256k1, secp256r1) are supported by [`affine_x`].

use generic_ec::{Curve, Point, Scalar};
use libpaillier::unknown_order::BigNumber;

/// Order $q$ of the curve group
pub fn curve_order<E: Curve>() -> BigNumber {
    let q_minus_one = -Scalar::<E>::one();
    BigNumber::from_slice(q_minus_one.to_be_bytes().as_ref()) + BigNumber::one()
}

/// Bit length of the curve order
pub(crate) fn order_bits<E: Curve>() -> usize {
    curve_order::<E>().to_bytes().len() * 8
}

/// Interprets the scalar as an integer in $[0, q)$
pub fn scalar_to_bn<E: Curve>(scalar: &Scalar<E>) -> BigNumber {
    BigNumber::from_slice(scalar.to_be_bytes().as_ref())
}

/// Reduces an integer (possibly negative) modulo $q$
pub fn bn_to_scalar<E: Curve>(n: &BigNumber) -> Scalar<E> {
    let reduced = n.nmod(&curve_order::<E>());
    Scalar::from_be_bytes_mod_order(reduced.to_bytes())
}

/// Affine x-coordinate of the point together with parity of its y-coordinate
///
/// Returns `None` for the point at infinity.
pub fn affine_x<E: Curve>(point: &Point<E>) -> Option<(BigNumber, bool)> {
    let encoded = point.to_bytes(true);
    let encoded = encoded.as_ref();
    let (prefix, x) = encoded.split_first()?;
    if x.is_empty() {
        return None;
    }
    let y_is_odd = match prefix {
        0x02 => false,
        0x03 => true,
        _ => return None,
    };
    Some((BigNumber::from_slice(x), y_is_odd))
}

/// `r` component of an ECDSA signature whose nonce point is `point`, together with recovery id
///
/// Bit 0 of recovery id is parity of y-coordinate, bit 1 is set when x-coordinate overflowed $q$.
pub(crate) fn r_and_recovery_id<E: Curve>(point: &Point<E>) -> Option<(Scalar<E>, u8)> {
    let (x, y_is_odd) = affine_x(point)?;
    let overflow = x >= curve_order::<E>();
    let recovery_id = u8::from(y_is_odd) | (u8::from(overflow) << 1);
    Some((bn_to_scalar(&x), recovery_id))
}
