use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};

pub(crate) const CRYPTOGRAPHIC_RETRY_MAX: usize = 500;

pub(crate) fn is_sorted_by_key<T, B, F>(slice: &[T], f: F) -> bool
where
    F: Fn(&T) -> &B,
    B: Ord,
{
    slice.windows(2).all(|win| f(&win[0]) <= f(&win[1]))
}

/// Returns `true` if `value ∈ [-2^n, 2^n]`
pub(crate) fn within_bound_by_size(value: &BigNumber, n: usize) -> bool {
    let bound = BigNumber::one() << n;
    value <= &bound && value >= &-bound
}

/// Samples a number uniformly at random from `[-n, n]`
pub(crate) fn random_plusminus<R: RngCore + CryptoRng>(rng: &mut R, n: &BigNumber) -> BigNumber {
    // `from_rng` samples the open interval
    let open_interval_max = n + &BigNumber::one();
    let val = BigNumber::from_rng(&open_interval_max, rng);
    if rng.next_u32() & 1 == 1 {
        val
    } else {
        -val
    }
}

/// Samples a number uniformly at random from `[-2^n, 2^n]`
pub(crate) fn random_plusminus_by_size<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> BigNumber {
    let range = BigNumber::one() << n;
    random_plusminus(rng, &range)
}

/// Samples a number uniformly at random from `[-scale * 2^n, scale * 2^n]`
pub(crate) fn random_plusminus_scaled<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: usize,
    scale: &BigNumber,
) -> BigNumber {
    let range = (BigNumber::one() << n) * scale;
    random_plusminus(rng, &range)
}

/// Samples an element of the multiplicative group of integers modulo `n`
///
/// Returns `None` if no invertible element was found after [`CRYPTOGRAPHIC_RETRY_MAX`] attempts.
pub(crate) fn random_bn_in_z_star<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Option<BigNumber> {
    (0..CRYPTOGRAPHIC_RETRY_MAX)
        .map(|_| BigNumber::from_rng(n, rng))
        .find(|candidate| candidate != &BigNumber::zero() && candidate.gcd(n) == BigNumber::one())
}

/// Computes `base^exp mod modulus` where `exp` may be negative
///
/// Returns `None` if `exp` is negative and `base` is not invertible modulo `modulus`.
pub(crate) fn modpow_signed(
    base: &BigNumber,
    exp: &BigNumber,
    modulus: &BigNumber,
) -> Option<BigNumber> {
    let base = base.nmod(modulus);
    if exp < &BigNumber::zero() {
        let inverse = base.invert(modulus)?;
        Some(inverse.modpow(&-exp.clone(), modulus))
    } else {
        Some(base.modpow(exp, modulus))
    }
}

/// Computes `a * b mod modulus`
pub(crate) fn modmul(a: &BigNumber, b: &BigNumber, modulus: &BigNumber) -> BigNumber {
    (a * b).nmod(modulus)
}
