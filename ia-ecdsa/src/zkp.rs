//! Zero-knowledge proofs
//!
//! Sigma protocols made non-interactive via Fiat–Shamir over a [merlin] transcript. Each proof
//! is created by a prover for one specific verifier: commitments are computed under the
//! verifier's [ring-Pedersen parameters](crate::ring_pedersen::RingPedersen). Every transcript
//! starts with the [proof context](ProofContext), which binds the proof to the round SSID and
//! to the prover index.
//!
//! Proofs provided:
//! * [enc]: Paillier ciphertext encrypts a value in range
//! * [affg]: affine operation with a group commitment, used by MtA
//! * [logstar]: Paillier plaintext equals discrete log of a point
//! * [mul]: Paillier multiplication
//! * [mulstar]: Paillier multiplication by a value committed in the group
//! * [dec]: Paillier decryption modulo $q$

use generic_ec::{Curve, Point};
use libpaillier::unknown_order::BigNumber;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    params::SecurityParams, ring_pedersen::RingPedersen, utils::CRYPTOGRAPHIC_RETRY_MAX,
};

pub mod affg;
pub mod dec;
pub mod enc;
pub mod logstar;
pub mod mul;
pub mod mulstar;

/// Derivation of Fiat–Shamir challenges
///
/// Selected once per session from [`ProtocolVersion`](crate::params::ProtocolVersion) and passed
/// explicitly to every proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionSampler {
    /// Single draw reduced modulo the bound
    ///
    /// Slightly biased, kept for compatibility with protocol V1.
    Legacy,
    /// Draws are repeated until one falls below the bound
    Uniform,
}

impl RejectionSampler {
    /// Derives a challenge in `[0, bound)` from the transcript
    pub fn sample(
        &self,
        transcript: &mut Transcript,
        bound: &BigNumber,
    ) -> Result<BigNumber, ProofError> {
        let len = bound.to_bytes().len();
        let mut buf = vec![0u8; len];
        match self {
            Self::Legacy => {
                transcript.challenge_bytes(b"challenge", &mut buf);
                Ok(BigNumber::from_slice(&buf).nmod(bound))
            }
            Self::Uniform => {
                for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
                    transcript.challenge_bytes(b"challenge", &mut buf);
                    let candidate = BigNumber::from_slice(&buf);
                    if &candidate < bound {
                        return Ok(candidate);
                    }
                }
                Err(ProofError::RetryLimit)
            }
        }
    }
}

/// Context shared by the prover and the verifier
#[derive(Debug, Clone)]
pub struct ProofContext {
    tag: Vec<u8>,
    sampler: RejectionSampler,
    security: SecurityParams,
    q: BigNumber,
}

impl ProofContext {
    /// Constructs a context
    ///
    /// `tag` is a domain separation tag, normally [`Ssid::with_prover`](crate::ssid::Ssid::with_prover).
    pub fn new<E: Curve>(
        tag: Vec<u8>,
        sampler: RejectionSampler,
        security: SecurityParams,
    ) -> Self {
        Self {
            tag,
            sampler,
            security,
            q: crate::curve::curve_order::<E>(),
        }
    }

    pub(crate) fn security(&self) -> &SecurityParams {
        &self.security
    }

    pub(crate) fn q(&self) -> &BigNumber {
        &self.q
    }

    pub(crate) fn transcript(&self, label: &'static [u8]) -> Transcript {
        let mut transcript = Transcript::new(label);
        transcript.append_message(b"context", &self.tag);
        transcript
    }

    pub(crate) fn challenge(&self, transcript: &mut Transcript) -> Result<BigNumber, ProofError> {
        self.sampler.sample(transcript, &self.q)
    }
}

/// Appends a signed integer to the transcript
pub(crate) fn append_bn(transcript: &mut Transcript, label: &'static [u8], value: &BigNumber) {
    let sign: &[u8] = if value < &BigNumber::zero() { b"-" } else { b"+" };
    transcript.append_message(label, sign);
    transcript.append_message(label, &value.to_bytes());
}

/// Appends verifier's ring-Pedersen parameters to the transcript
pub(crate) fn append_ring_pedersen(transcript: &mut Transcript, rp: &RingPedersen) {
    append_bn(transcript, b"N_hat", rp.n());
    append_bn(transcript, b"s", rp.s());
    append_bn(transcript, b"t", rp.t());
}

/// Appends a curve point to the transcript
pub(crate) fn append_point<E: Curve>(
    transcript: &mut Transcript,
    label: &'static [u8],
    point: &Point<E>,
) {
    transcript.append_message(label, point.to_bytes(true).as_ref());
}

/// Proof error
#[derive(Debug, Error)]
pub enum ProofError {
    /// Verification equation doesn't hold
    #[error("proof check failed: {0}")]
    Failed(&'static str),
    /// Response is out of the allowed range
    #[error("proof response out of range: {0}")]
    OutOfRange(&'static str),
    /// Value that must be invertible is not
    #[error("value is not invertible: {0}")]
    NotInvertible(&'static str),
    /// Challenge or nonce sampling exhausted retries
    #[error("sampling exceeded retry limit")]
    RetryLimit,
}

/// Checks an equality of the verification equation
pub(crate) fn ensure(holds: bool, check: &'static str) -> Result<(), ProofError> {
    if holds {
        Ok(())
    } else {
        Err(ProofError::Failed(check))
    }
}
