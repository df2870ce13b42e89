//! Homomorphic recombination of MtA accumulators
//!
//! Party $p$ accumulates $\delta_p = k_p\gamma_p + \sum_j (\alpha_{p,j} + \beta_{p,j})$ and
//! likewise $\chi_p$. Both terms of every pair are available as ciphertexts under $p$'s key:
//! $\alpha_{p,j}$ is the plaintext of $D_{p \leftarrow j}$ which $j$ sent to $p$, and
//! $\beta_{p,j} = q^3 - y$ where $F_{j \leftarrow p} = \text{Enc}_p(y)$ was sent by $p$ to $j$.
//! So anyone can compute
//!
//! $$\text{Acc}_p = H_p \cdot \prod_j D_{p \leftarrow j} \cdot \prod_j \text{Enc}_p(q^3; 1) \cdot F_{j \leftarrow p}^{-1}$$
//!
//! where $H_p$ encrypts $k_p\gamma_p$ (or $k_p w_p$). The plaintext never wraps modulo $N_p$, so it's
//! congruent to the share modulo $q$. Party $p$ proves that with a decryption proof, and each
//! verifier checks the $D$/$F$ entries it exchanged with $p$ itself.

use generic_ec::Curve;
use libpaillier::unknown_order::BigNumber;

use crate::{
    curve::curve_order,
    paillier::{Ciphertext, EncryptionKey, PaillierError},
};

/// $q^3$, the MtA masking constant
pub(crate) fn q3<E: Curve>() -> BigNumber {
    let q = curve_order::<E>();
    &q * &q * &q
}

/// Canonical encryption $\text{Enc}(q^3; 1)$
pub(crate) fn q3_encryption<E: Curve>(ek: &EncryptionKey) -> Ciphertext {
    ek.encrypt_with_nonce(&q3::<E>(), &BigNumber::one())
}

/// Computes $\text{Acc}_p$ under `ek`, the key of party $p$
pub(crate) fn accumulate<'a>(
    ek: &EncryptionKey,
    h: &Ciphertext,
    q3_enc: &Ciphertext,
    d_received: impl IntoIterator<Item = &'a Ciphertext>,
    f_sent: impl IntoIterator<Item = &'a Ciphertext>,
) -> Result<Ciphertext, PaillierError> {
    let mut acc = h.clone();
    for d in d_received {
        acc = ek.add(&acc, d);
    }
    for f in f_sent {
        let beta = ek.add(q3_enc, &ek.invert(f)?);
        acc = ek.add(&acc, &beta);
    }
    Ok(acc)
}
