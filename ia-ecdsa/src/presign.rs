//! Presigning protocol
//!
//! Message-independent part of threshold ECDSA. Every party ends up with shares $k_i$ and
//! $\chi_i$ of $k$ and $\chi = kx$, where $x$ is the secret key, together with the nonce point
//! $R = k^{-1} \cdot G$.

use core::fmt;

use generic_ec::{Curve, Point, Scalar, SecretScalar};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::{
    paillier::Ciphertext,
    party::PartyIndex,
    ssid::Ssid,
};

pub(crate) mod identification;
pub(crate) mod output;
pub(crate) mod round1;
pub(crate) mod round2;
pub(crate) mod round3;

/// Presignature share
///
/// Consumed by exactly one signing. Reusing a presignature leaks the secret key, tracking its
/// consumption is up to the caller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PreSignatureData<E: Curve> {
    pub(crate) index: PartyIndex,
    pub(crate) ssid: Ssid,
    pub(crate) ssid_nonce: BigNumber,
    pub(crate) big_r: Point<E>,
    pub(crate) k_share: SecretScalar<E>,
    pub(crate) chi_share: SecretScalar<E>,
    pub(crate) transcript: Option<Transcript>,
}

impl<E: Curve> PreSignatureData<E> {
    /// Index of the party owning the presignature
    pub fn index(&self) -> PartyIndex {
        self.index
    }
    /// SSID of presigning round 1
    pub fn ssid(&self) -> &Ssid {
        &self.ssid
    }
    /// Session nonce the SSID was computed with
    pub fn ssid_nonce(&self) -> &BigNumber {
        &self.ssid_nonce
    }
    /// Nonce point $R$
    pub fn big_r(&self) -> Point<E> {
        self.big_r
    }
    /// MtA transcript, present only if identification was enabled
    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }
}

impl<E: Curve> fmt::Debug for PreSignatureData<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreSignatureData")
            .field("index", &self.index)
            .field("ssid", &self.ssid)
            .field("big_r", &self.big_r)
            .field("k_share", &"[redacted]")
            .field("chi_share", &"[redacted]")
            .field("transcript", &self.transcript.is_some())
            .finish()
    }
}

/// Ciphertexts of the chi MtA retained for identification
///
/// Vectors are indexed by [`PartyIndex`]; the entry of the owner is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// $K_j$ of every party
    pub(crate) k_ciphertexts: Vec<Ciphertext>,
    /// $D$ received from every party
    pub(crate) d_chi_received: Vec<Option<Ciphertext>>,
    /// $F$ sent to every party
    pub(crate) f_chi_sent: Vec<Option<Ciphertext>>,
    /// $D$ sent to every party
    pub(crate) d_chi_sent: Vec<Option<Ciphertext>>,
    /// $F$ received from every party
    pub(crate) f_chi_received: Vec<Option<Ciphertext>>,
}

impl Transcript {
    /// $K_j$
    pub fn k_ciphertext(&self, j: PartyIndex) -> Option<&Ciphertext> {
        self.k_ciphertexts.get(usize::from(j))
    }
}

/// Local data of a presigning run
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct PresignTemp<E: Curve> {
    pub nonce: BigNumber,
    pub round1: Option<Round1Secrets<E>>,
    pub round2: Option<Round2Local<E>>,
    pub round3: Option<Round3Local<E>>,
    pub output: Option<PreSignatureData<E>>,
    /// Set when $\delta \cdot G \neq \Delta$ and identification follows
    pub delta_mismatch: bool,
}

impl<E: Curve> PresignTemp<E> {
    pub fn new(nonce: BigNumber) -> Self {
        Self {
            nonce,
            round1: None,
            round2: None,
            round3: None,
            output: None,
            delta_mismatch: false,
        }
    }
}

/// Nonces sampled in round 1
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(bound = "")]
pub(crate) struct Round1Secrets<E: Curve> {
    #[zeroize(skip)]
    pub k: SecretScalar<E>,
    #[zeroize(skip)]
    pub gamma: SecretScalar<E>,
    pub k_nonce: BigNumber,
    pub gamma_nonce: BigNumber,
    #[zeroize(skip)]
    pub big_k: Ciphertext,
    #[zeroize(skip)]
    pub big_g: Ciphertext,
}

/// Results of MtA with one peer, from the responder side
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
pub(crate) struct MtaSent {
    pub beta_delta: BigNumber,
    pub beta_chi: BigNumber,
    #[zeroize(skip)]
    pub d_delta: Ciphertext,
    #[zeroize(skip)]
    pub f_delta: Ciphertext,
    #[zeroize(skip)]
    pub d_chi: Ciphertext,
    #[zeroize(skip)]
    pub f_chi: Ciphertext,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct Round2Local<E: Curve> {
    pub big_gamma_share: Point<E>,
    /// Indexed by peer
    pub sent: Vec<Option<MtaSent>>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct Round3Local<E: Curve> {
    pub big_gamma: Point<E>,
    pub delta_share: Scalar<E>,
    pub chi_share: SecretScalar<E>,
    pub big_delta_share: Point<E>,
}
