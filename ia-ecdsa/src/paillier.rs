//! Paillier encryption
//!
//! Encryption uses generator $1 + N$, so $\text{Enc}(m; \rho) = (1 + N)^m \rho^N \bmod N^2$.
//! Plaintexts may be negative, they're reduced modulo $N$ before encryption. Decryption is delegated
//! to [`libpaillier`].

use core::fmt;

use libpaillier::unknown_order::BigNumber;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::utils::{modmul, modpow_signed, random_bn_in_z_star};

/// Paillier ciphertext
pub type Ciphertext = BigNumber;

/// Paillier public key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BigNumber", into = "BigNumber")]
pub struct EncryptionKey {
    n: BigNumber,
    nn: BigNumber,
}

impl EncryptionKey {
    /// Constructs a public key from modulus $N$
    pub fn from_n(n: BigNumber) -> Self {
        let nn = &n * &n;
        Self { n, nn }
    }

    /// $N$
    pub fn n(&self) -> &BigNumber {
        &self.n
    }
    /// $N^2$
    pub fn nn(&self) -> &BigNumber {
        &self.nn
    }

    /// Checks whether modulus has at least `bits` bits
    pub fn has_bit_length(&self, bits: usize) -> bool {
        bits == 0 || self.n >= (BigNumber::one() << (bits - 1))
    }

    /// Encrypts `m` with a fresh nonce, returns ciphertext and the nonce
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(Ciphertext, BigNumber), PaillierError> {
        let nonce = random_bn_in_z_star(rng, &self.n).ok_or(PaillierError::RetryLimit)?;
        let c = self.encrypt_with_nonce(m, &nonce);
        Ok((c, nonce))
    }

    /// Encrypts `m` with given nonce
    pub fn encrypt_with_nonce(&self, m: &BigNumber, nonce: &BigNumber) -> Ciphertext {
        let gm = (BigNumber::one() + m.nmod(&self.n) * &self.n).nmod(&self.nn);
        modmul(&gm, &nonce.modpow(&self.n, &self.nn), &self.nn)
    }

    /// HomoAdd: ciphertext of the sum of plaintexts
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        modmul(a, b, &self.nn)
    }

    /// HomoMult: ciphertext of plaintext multiplied by `k`
    ///
    /// `k` may be negative, in that case `c` must be invertible.
    pub fn mul(&self, c: &Ciphertext, k: &BigNumber) -> Result<Ciphertext, PaillierError> {
        modpow_signed(c, k, &self.nn).ok_or(PaillierError::NotInvertible)
    }

    /// HomoMultObfuscate: [HomoMult](Self::mul) re-randomized with a fresh nonce
    ///
    /// Returns ciphertext and the nonce used for re-randomization.
    pub fn mul_obfuscate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        c: &Ciphertext,
        k: &BigNumber,
    ) -> Result<(Ciphertext, BigNumber), PaillierError> {
        let product = self.mul(c, k)?;
        let nonce = random_bn_in_z_star(rng, &self.n).ok_or(PaillierError::RetryLimit)?;
        let obfuscated = modmul(&product, &nonce.modpow(&self.n, &self.nn), &self.nn);
        Ok((obfuscated, nonce))
    }

    /// Ciphertext of the negated plaintext
    pub fn invert(&self, c: &Ciphertext) -> Result<Ciphertext, PaillierError> {
        c.invert(&self.nn).ok_or(PaillierError::NotInvertible)
    }

    /// Checks that ciphertext lies in $\mathbb{Z}^*_{N^2}$
    pub fn is_valid_ciphertext(&self, c: &Ciphertext) -> bool {
        c > &BigNumber::zero() && c < &self.nn && c.gcd(&self.n) == BigNumber::one()
    }
}

impl From<BigNumber> for EncryptionKey {
    fn from(n: BigNumber) -> Self {
        Self::from_n(n)
    }
}

impl From<EncryptionKey> for BigNumber {
    fn from(key: EncryptionKey) -> Self {
        key.n
    }
}

/// Paillier secret key
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(try_from = "PaillierPrimes", into = "PaillierPrimes")]
pub struct DecryptionKey {
    #[zeroize(skip)]
    inner: libpaillier::DecryptionKey,
    #[zeroize(skip)]
    ek: EncryptionKey,
    p: BigNumber,
    q: BigNumber,
}

impl DecryptionKey {
    /// Constructs a secret key from two distinct primes
    ///
    /// Primality is not checked.
    pub fn from_primes(p: BigNumber, q: BigNumber) -> Result<Self, PaillierError> {
        if p == q || p <= BigNumber::one() || q <= BigNumber::one() {
            return Err(PaillierError::InvalidPrimes);
        }
        let inner = libpaillier::DecryptionKey::with_primes_unchecked(&p, &q)
            .ok_or(PaillierError::InvalidPrimes)?;
        let ek = EncryptionKey::from_n(&p * &q);
        Ok(Self { inner, ek, p, q })
    }

    /// Public key
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.ek
    }

    /// $\varphi(N) = (p-1)(q-1)$
    pub fn phi(&self) -> BigNumber {
        (&self.p - &BigNumber::one()) * (&self.q - &BigNumber::one())
    }

    /// Decrypts the ciphertext, plaintext is in $[0, N)$
    pub fn decrypt(&self, c: &Ciphertext) -> Result<BigNumber, PaillierError> {
        if !self.ek.is_valid_ciphertext(c) {
            return Err(PaillierError::InvalidCiphertext);
        }
        self.inner
            .decrypt(c)
            .map(|m| BigNumber::from_slice(m))
            .ok_or(PaillierError::Decrypt)
    }

    /// Recovers the nonce $\rho$ such that $c = (1 + N)^m \rho^N \bmod N^2$
    pub fn get_randomness(&self, c: &Ciphertext) -> Result<BigNumber, PaillierError> {
        let n = self.ek.n();
        let n_inv = n.invert(&self.phi()).ok_or(PaillierError::NotInvertible)?;
        Ok(c.nmod(n).modpow(&n_inv, n))
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("n", self.ek.n())
            .field("p", &"[redacted]")
            .field("q", &"[redacted]")
            .finish()
    }
}

/// Serialized form of [`DecryptionKey`]
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct PaillierPrimes {
    p: BigNumber,
    q: BigNumber,
}

impl TryFrom<PaillierPrimes> for DecryptionKey {
    type Error = PaillierError;
    fn try_from(primes: PaillierPrimes) -> Result<Self, Self::Error> {
        Self::from_primes(primes.p.clone(), primes.q.clone())
    }
}

impl From<DecryptionKey> for PaillierPrimes {
    fn from(key: DecryptionKey) -> Self {
        PaillierPrimes {
            p: key.p.clone(),
            q: key.q.clone(),
        }
    }
}

/// Paillier error
#[derive(Debug, Error)]
pub enum PaillierError {
    /// Primes are not suitable for the key
    #[error("invalid primes")]
    InvalidPrimes,
    /// Ciphertext is not in $\mathbb{Z}^*_{N^2}$
    #[error("invalid ciphertext")]
    InvalidCiphertext,
    /// Decryption failed
    #[error("decryption failed")]
    Decrypt,
    /// Ciphertext or modulus is not invertible
    #[error("value is not invertible")]
    NotInvertible,
    /// Nonce sampling exceeded retry limit
    #[error("nonce sampling exceeded retry limit")]
    RetryLimit,
}
