//! Round engine
//!
//! Each protocol is a fixed progression of rounds. A round is [started](crate::LocalParty::start)
//! exactly once: it consumes messages of the previous round, does its computation and emits
//! messages. Then the round collects messages of other parties until
//! [update](crate::LocalParty::update) reports it complete, and
//! [next_round](crate::LocalParty::next_round) moves on.
//!
//! Presigning: `Presign1 → Presign2 → Presign3 → PresignOut`, optionally followed by
//! `PresignIdentification → PresignIdentificationOut` when $\delta \cdot G \neq \Delta$.
//!
//! Signing: `Sign1 → SignOut`, optionally followed by
//! `SignIdentification → SignIdentificationOut` when the signature doesn't verify.

use generic_ec::{Curve, Point};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

use crate::{
    error::Bug,
    key_share::SigningKey,
    paillier::EncryptionKey,
    params::Parameters,
    party::PartyIndex,
    ring_pedersen::RingPedersen,
    ssid::Ssid,
    zkp::ProofContext,
};

mod cancellation;
mod fanout;
mod store;

pub use cancellation::CancellationToken;
pub(crate) use fanout::{fan_out, join_all, TaskError};
pub(crate) use store::MessageStore;

/// Round of the presigning or signing protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoundKind {
    /// Sample $k_i$, $\gamma_i$ and send their encryptions
    Presign1,
    /// Verify encryptions, run MtA with every party
    Presign2,
    /// Verify MtA, send $\delta_i$ and $\Delta_i$
    Presign3,
    /// Verify $\Delta_j$, check $\delta \cdot G = \Delta$, output presignature
    PresignOut,
    /// Prove correctness of $\delta_i$
    PresignIdentification,
    /// Verify proofs of $\delta_j$ and blame
    PresignIdentificationOut,
    /// Send $\sigma_i$
    Sign1,
    /// Assemble and verify the signature
    SignOut,
    /// Prove correctness of $\sigma_i$
    SignIdentification,
    /// Verify proofs of $\sigma_j$ and blame
    SignIdentificationOut,
}

/// Protocol a round belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Presigning
    Presign,
    /// Signing
    Sign,
}

impl RoundKind {
    /// Protocol the round belongs to
    pub fn protocol(self) -> Protocol {
        match self {
            Self::Presign1
            | Self::Presign2
            | Self::Presign3
            | Self::PresignOut
            | Self::PresignIdentification
            | Self::PresignIdentificationOut => Protocol::Presign,
            Self::Sign1 | Self::SignOut | Self::SignIdentification | Self::SignIdentificationOut => {
                Protocol::Sign
            }
        }
    }

    /// Whether the round waits for messages from other parties
    pub fn expects_messages(self) -> bool {
        matches!(
            self,
            Self::Presign1
                | Self::Presign2
                | Self::Presign3
                | Self::PresignIdentification
                | Self::Sign1
                | Self::SignIdentification
        )
    }

    /// Whether messages of the round are broadcast
    pub fn is_broadcast(self) -> bool {
        matches!(self, Self::Sign1 | Self::SignIdentification)
    }

    /// Round number bound into the SSID
    ///
    /// Output rounds share the number of the round whose messages they verify.
    pub fn ssid_round(self) -> u16 {
        match self {
            Self::Presign1 | Self::Sign1 | Self::SignOut => 1,
            Self::Presign2 => 2,
            Self::Presign3 | Self::PresignOut => 3,
            Self::PresignIdentification | Self::PresignIdentificationOut => 4,
            Self::SignIdentification | Self::SignIdentificationOut => 5,
        }
    }
}

/// State of the live round
#[derive(Debug, Clone)]
pub(crate) struct Round {
    pub kind: RoundKind,
    pub started: bool,
    ok: Vec<bool>,
}

impl Round {
    pub fn new(kind: RoundKind, n: u16, own: PartyIndex) -> Self {
        let mut ok = vec![false; usize::from(n)];
        if let Some(own) = ok.get_mut(usize::from(own)) {
            *own = true;
        }
        Self {
            kind,
            started: false,
            ok,
        }
    }

    pub fn acknowledge(&mut self, j: PartyIndex) {
        if let Some(ok) = self.ok.get_mut(usize::from(j)) {
            *ok = true;
        }
    }

    pub fn is_acknowledged(&self, j: PartyIndex) -> bool {
        self.ok.get(usize::from(j)).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.ok.iter().all(|ok| *ok)
    }

    /// Parties whose message is still missing
    pub fn waiting_for(&self) -> impl Iterator<Item = PartyIndex> + '_ {
        (0..).zip(&self.ok).filter(|(_, ok)| !**ok).map(|(j, _)| j)
    }
}

/// Result of a successful output round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Output is stored in temporary data
    Done,
    /// Output failed the final check, identification follows
    Identify,
}

/// Everything a round reads besides its own temporary data
pub(crate) struct RoundContext<'a, E: Curve> {
    pub params: &'a Parameters<E>,
    pub key: &'a SigningKey<E>,
    pub store: &'a MessageStore<E>,
    pub cancel: &'a CancellationToken,
    /// Session nonce the SSID is computed with
    pub nonce: &'a BigNumber,
}

impl<E: Curve> RoundContext<'_, E> {
    pub fn own(&self) -> PartyIndex {
        self.params.own_index()
    }

    pub fn ek(&self, j: PartyIndex) -> Result<&EncryptionKey, Bug> {
        self.key.ek(j).ok_or(Bug::UnknownParty(j))
    }

    pub fn rp(&self, j: PartyIndex) -> Result<&RingPedersen, Bug> {
        self.key.rp(j).ok_or(Bug::UnknownParty(j))
    }

    pub fn public_share(&self, j: PartyIndex) -> Result<&Point<E>, Bug> {
        self.key.public_share(j).ok_or(Bug::UnknownParty(j))
    }

    /// Proof context of proofs created by `prover` in `round`
    pub fn proof_context(&self, round: RoundKind, prover: PartyIndex) -> ProofContext {
        proof_context(self.params, self.nonce, round, prover)
    }
}

/// Proof context of proofs created by `prover` in given round
pub(crate) fn proof_context<E: Curve>(
    params: &Parameters<E>,
    nonce: &BigNumber,
    round: RoundKind,
    prover: PartyIndex,
) -> ProofContext {
    let ssid = Ssid::compute::<E>(params.parties(), nonce, round.ssid_round());
    ProofContext::new::<E>(
        ssid.with_prover(prover),
        params.version().rejection_sampler(),
        *params.security(),
    )
}
