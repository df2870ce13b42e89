//! Protocol errors
//!
//! Failures fall into three families: a peer sent a structurally invalid message
//! ([`ProtocolError::Malformed`]), a peer was caught cheating ([`ProtocolError::Violation`]), or
//! something went wrong on the local side ([`ProtocolError::Local`]). Cryptographic failures are
//! collected from every peer before a round returns, so a violation lists all culprits found in
//! the round.

use core::fmt;

use thiserror::Error;

use crate::{
    key_share::InvalidKeyShare,
    messages::MalformedMessage,
    mta::MtaError,
    paillier::PaillierError,
    party::{PartyId, PartyIndex},
    round::RoundKind,
    zkp::ProofError,
};

/// Error of a protocol round
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Round was started twice
    #[error("round {0:?} is already started")]
    AlreadyStarted(RoundKind),
    /// Message failed structural validation
    #[error("malformed message from party {from}")]
    Malformed {
        /// Index of the sender
        from: PartyIndex,
        /// What's wrong with the message
        #[source]
        reason: MalformedMessage,
    },
    /// One or more parties provably misbehaved
    #[error("protocol violation in round {round:?}, culprits: {}", DisplayCulprits(culprits))]
    Violation {
        /// Round in which the misbehavior was detected
        round: RoundKind,
        /// Every culprit found in the round, ordered by party index
        culprits: Vec<Culprit>,
    },
    /// An invariant failed but the fault could not be attributed
    #[error("round {round:?} failed: {reason}")]
    Unattributed {
        /// Round in which the failure was detected
        round: RoundKind,
        /// What failed
        reason: UnattributedFailure,
    },
    /// Local computation failed
    #[error("local failure in round {round:?}")]
    Local {
        /// Round that was executed
        round: RoundKind,
        /// Underlying error
        #[source]
        source: LocalError,
    },
    /// Round was cancelled via [`CancellationToken`](crate::round::CancellationToken)
    #[error("round was cancelled")]
    Cancelled,
    /// API misuse
    #[error(transparent)]
    Caller(#[from] CallerError),
}

impl ProtocolError {
    pub(crate) fn local(round: RoundKind, err: impl Into<LocalError>) -> Self {
        Self::Local {
            round,
            source: err.into(),
        }
    }

    /// Parties blamed by this error
    ///
    /// Empty unless the error is a [violation](Self::Violation) or a
    /// [malformed message](Self::Malformed).
    pub fn culprits(&self) -> Vec<PartyIndex> {
        match self {
            Self::Violation { culprits, .. } => culprits.iter().map(|c| c.party.index()).collect(),
            Self::Malformed { from, .. } => vec![*from],
            _ => vec![],
        }
    }
}

/// Party blamed for misbehavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culprit {
    /// Misbehaving party
    pub party: PartyId,
    /// What it did
    pub reason: Misbehavior,
}

impl fmt::Display for Culprit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.party, self.reason)
    }
}

struct DisplayCulprits<'a>(&'a [Culprit]);

impl fmt::Display for DisplayCulprits<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for culprit in self.0 {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{culprit}")?;
        }
        Ok(())
    }
}

/// Provable misbehavior of a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Misbehavior {
    /// Paillier modulus is shorter than required
    #[error("paillier modulus is too small")]
    PaillierModulusTooSmall,
    /// Ciphertext is not an element of $\mathbb{Z}^*_{N^2}$
    #[error("invalid ciphertext")]
    InvalidCiphertext,
    /// Encryption proof of $K_j$ is invalid
    #[error("invalid encryption proof")]
    InvalidEncProof,
    /// Affine operation proof of the delta MtA is invalid
    #[error("invalid affine operation proof (delta)")]
    InvalidAffgDelta,
    /// Affine operation proof of the chi MtA is invalid
    #[error("invalid affine operation proof (chi)")]
    InvalidAffgChi,
    /// Proof that $\Gamma_j$ matches $G_j$ is invalid
    #[error("invalid log* proof of Gamma share")]
    InvalidLogstarGamma,
    /// Proof that $\Delta_j$ matches $K_j$ is invalid
    #[error("invalid log* proof of Delta share")]
    InvalidLogstarDelta,
    /// Party claims a different nonce point
    #[error("BigR differs from local one")]
    BigRMismatch,
    /// Multiplication proof is invalid
    #[error("invalid multiplication proof")]
    InvalidMulProof,
    /// Multiplication-by-committed-value proof is invalid
    #[error("invalid mul* proof")]
    InvalidMulstarProof,
    /// Decryption proof is invalid
    #[error("invalid decryption proof")]
    InvalidDecProof,
    /// Reported MtA ciphertexts differ from those exchanged with us
    #[error("MtA ciphertexts differ from local transcript")]
    TranscriptMismatch,
    /// Reported accumulator differs from the recomputed one
    #[error("accumulator ciphertext mismatch")]
    AccumulatorMismatch,
    /// Encryption of $q^3$ is not the canonical one
    #[error("invalid encryption of q^3")]
    Q3Mismatch,
    /// Identification message lacks data addressed to us
    #[error("identification data is missing")]
    MissingIdentificationData,
}

/// Failure that can't be attributed to a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnattributedFailure {
    /// $\delta \cdot G \neq \Delta$
    #[error("delta * G doesn't match Delta")]
    DeltaMismatch,
    /// $\delta = 0$ or $R$ is degenerate
    #[error("degenerate nonce")]
    DegenerateNonce,
    /// Assembled signature doesn't verify
    #[error("signature is invalid")]
    SignatureInvalid,
    /// Identification didn't reveal any culprit
    #[error("identification found no culprit")]
    IdentificationInconclusive,
}

/// Failure on the local side
#[derive(Debug, Error)]
pub enum LocalError {
    /// Paillier operation failed
    #[error("paillier operation failed")]
    Paillier(#[source] PaillierError),
    /// Proof construction failed
    #[error("couldn't construct a proof")]
    Proof(#[source] ProofError),
    /// Internal invariant is broken
    #[error("bug occurred")]
    Bug(#[source] Bug),
}

impl From<PaillierError> for LocalError {
    fn from(err: PaillierError) -> Self {
        Self::Paillier(err)
    }
}

impl From<ProofError> for LocalError {
    fn from(err: ProofError) -> Self {
        Self::Proof(err)
    }
}

impl From<MtaError> for LocalError {
    fn from(err: MtaError) -> Self {
        match err {
            MtaError::Paillier(err) => Self::Paillier(err),
            MtaError::Proof(err) => Self::Proof(err),
        }
    }
}

impl From<Bug> for LocalError {
    fn from(err: Bug) -> Self {
        Self::Bug(err)
    }
}

/// Broken internal invariant
#[derive(Debug, Error)]
pub enum Bug {
    /// Message expected in the store is absent
    #[error("message from party {0} is missing")]
    MissingMessage(PartyIndex),
    /// Data of a previous round is absent
    #[error("data of round {0:?} is missing")]
    MissingRoundData(RoundKind),
    /// Temporary data belongs to another protocol
    #[error("temporary data doesn't match the protocol")]
    TempDataMismatch,
    /// Decrypted accumulator doesn't match the local share
    #[error("own accumulator doesn't decrypt to own share")]
    OwnAccumulatorMismatch,
    /// Party index outside of the party set
    #[error("unknown party {0}")]
    UnknownParty(PartyIndex),
}

/// API misuse
#[derive(Debug, Error)]
pub enum CallerError {
    /// Presignature belongs to another session
    #[error("presignature SSID doesn't match the session")]
    SsidMismatch,
    /// Presignature was produced by another party
    #[error("presignature belongs to party {presignature}, local party is {own}")]
    PresignatureIndexMismatch {
        /// Index recorded in the presignature
        presignature: PartyIndex,
        /// Index of the local party
        own: PartyIndex,
    },
    /// Identification is enabled but presignature carries no transcript
    #[error("identification requires a presignature with transcript")]
    MissingTranscript,
    /// Round must be started first
    #[error("round {0:?} is not started")]
    RoundNotStarted(RoundKind),
    /// Round hasn't received every message yet
    #[error("round {0:?} is not finished")]
    RoundNotFinished(RoundKind),
    /// Dump can't be resumed with given parameters
    #[error("dump doesn't match the protocol being resumed")]
    DumpMismatch,
    /// Key share doesn't fit the parameters
    #[error("invalid key share")]
    InvalidKeyShare(#[from] InvalidKeyShare),
}
