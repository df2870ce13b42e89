//! Protocol messages
//!
//! Every round that sends something has its own content type. [`Msg`] enumerates all of them;
//! [`Envelope`] adds the sender and the recipient (`None` for broadcast messages).

use generic_ec::{Curve, Point, Scalar};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    paillier::Ciphertext,
    party::PartyIndex,
    round::RoundKind,
    zkp::{
        affg::AffgProof, dec::DecProof, enc::EncProof, logstar::LogstarProof, mul::MulProof,
        mulstar::MulstarProof,
    },
};

/// Message of the presigning or signing protocol
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "interactive", derive(round_based::ProtocolMessage))]
#[serde(bound = "")]
#[allow(clippy::large_enum_variant)]
pub enum Msg<E: Curve> {
    /// Presign round 1 message
    PresignRound1(PresignRound1),
    /// Presign round 2 message
    PresignRound2(PresignRound2<E>),
    /// Presign round 3 message
    PresignRound3(PresignRound3<E>),
    /// Presign identification message
    PresignIdentification(PresignIdentification),
    /// Sign round 1 message
    SignRound1(SignRound1<E>),
    /// Sign identification message
    SignIdentification(SignIdentification<E>),
}

/// Presign round 1 message (P2P)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresignRound1 {
    /// $K_i = \text{Enc}_i(k_i)$
    pub k: Ciphertext,
    /// $G_i = \text{Enc}_i(\gamma_i)$
    pub g: Ciphertext,
    /// Proof that $K_i$ encrypts a value in range
    pub enc_proof: EncProof,
}

/// Presign round 2 message (P2P)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PresignRound2<E: Curve> {
    /// $\Gamma_i = \gamma_i \cdot G$
    pub big_gamma_share: Point<E>,
    /// $D_{j,i}$ of the delta MtA
    pub d_delta: Ciphertext,
    /// $F_{j,i}$ of the delta MtA
    pub f_delta: Ciphertext,
    /// $D_{j,i}$ of the chi MtA
    pub d_chi: Ciphertext,
    /// $F_{j,i}$ of the chi MtA
    pub f_chi: Ciphertext,
    /// Affine operation proof of the delta MtA
    pub affg_delta: AffgProof<E>,
    /// Affine operation proof of the chi MtA
    pub affg_chi: AffgProof<E>,
    /// Proof that $\Gamma_i$ matches $G_i$
    pub logstar: LogstarProof<E>,
}

/// Presign round 3 message (P2P)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PresignRound3<E: Curve> {
    /// $\delta_i$
    pub delta_share: Scalar<E>,
    /// $\Delta_i = k_i \cdot \Gamma$
    pub big_delta_share: Point<E>,
    /// Proof that $\Delta_i$ matches $K_i$
    pub logstar: LogstarProof<E>,
}

/// Presign identification message (P2P)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresignIdentification {
    /// $H_i = \text{Enc}_i(k_i \gamma_i)$
    pub h: Ciphertext,
    /// Proof that $H_i$ is the product of plaintexts of $K_i$ and $G_i$
    pub mul_proof: MulProof,
    /// Recombined encryption of $\delta_i$
    pub delta_share_enc: Ciphertext,
    /// Proof that the recombined ciphertext decrypts to $\delta_i$
    pub dec_proof: DecProof,
    /// $D$ ciphertexts of the delta MtA received from every party
    pub d_deltas: Vec<Option<Ciphertext>>,
    /// $F$ ciphertexts of the delta MtA sent to every party
    pub f_deltas: Vec<Option<Ciphertext>>,
}

/// Sign round 1 message (broadcast)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SignRound1<E: Curve> {
    /// $\sigma_i$
    pub sigma_share: Scalar<E>,
    /// Nonce point $R$ as seen by the sender
    pub big_r: Point<E>,
}

/// Sign identification message (broadcast)
///
/// Proofs are bound to ring-Pedersen parameters of the verifier, so there's one proof per party.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SignIdentification<E: Curve> {
    /// $H_i = \text{Enc}_i(k_i w_i)$
    pub h: Ciphertext,
    /// Proofs that $H_i = K_i^{w_i} \rho^{N_i}$, indexed by verifier
    pub mulstar_proofs: Vec<Option<MulstarProof<E>>>,
    /// $D$ ciphertexts of the chi MtA received from every party
    pub d_chis: Vec<Option<Ciphertext>>,
    /// $F$ ciphertexts of the chi MtA sent to every party
    pub f_chis: Vec<Option<Ciphertext>>,
    /// Proofs that recombined encryption of $\sigma_i$ decrypts to $\sigma_i$, indexed by verifier
    pub dec_proofs: Vec<Option<DecProof>>,
    /// $\text{Enc}_i(q^3; 1)$
    pub q3_enc: Ciphertext,
}

/// Message addressed to a party
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Envelope<E: Curve> {
    /// Sender
    pub from: PartyIndex,
    /// Recipient, `None` for broadcast
    pub to: Option<PartyIndex>,
    /// Content
    pub content: Msg<E>,
}

impl<E: Curve> Envelope<E> {
    pub(crate) fn p2p(from: PartyIndex, to: PartyIndex, content: Msg<E>) -> Self {
        Self {
            from,
            to: Some(to),
            content,
        }
    }

    pub(crate) fn broadcast(from: PartyIndex, content: Msg<E>) -> Self {
        Self {
            from,
            to: None,
            content,
        }
    }
}

impl<E: Curve> Msg<E> {
    /// Round that produced the message
    pub fn round(&self) -> RoundKind {
        match self {
            Msg::PresignRound1(_) => RoundKind::Presign1,
            Msg::PresignRound2(_) => RoundKind::Presign2,
            Msg::PresignRound3(_) => RoundKind::Presign3,
            Msg::PresignIdentification(_) => RoundKind::PresignIdentification,
            Msg::SignRound1(_) => RoundKind::Sign1,
            Msg::SignIdentification(_) => RoundKind::SignIdentification,
        }
    }

    /// Whether the message is sent to every party at once
    pub fn is_broadcast(&self) -> bool {
        self.round().is_broadcast()
    }

    /// Structural validation of a message sent by `from` in a session of `n` parties
    ///
    /// Doesn't verify any proof.
    pub fn validate_basic(&self, from: PartyIndex, n: u16) -> Result<(), MalformedMessage> {
        match self {
            Msg::PresignRound1(m) => {
                positive(&m.k, "K")?;
                positive(&m.g, "G")
            }
            Msg::PresignRound2(m) => {
                non_zero(&m.big_gamma_share, "Gamma")?;
                positive(&m.d_delta, "D delta")?;
                positive(&m.f_delta, "F delta")?;
                positive(&m.d_chi, "D chi")?;
                positive(&m.f_chi, "F chi")
            }
            Msg::PresignRound3(m) => non_zero(&m.big_delta_share, "Delta"),
            Msg::PresignIdentification(m) => {
                positive(&m.h, "H")?;
                positive(&m.delta_share_enc, "delta share encryption")?;
                per_party(&m.d_deltas, from, n, "D deltas")?;
                per_party(&m.f_deltas, from, n, "F deltas")
            }
            Msg::SignRound1(m) => non_zero(&m.big_r, "R"),
            Msg::SignIdentification(m) => {
                positive(&m.h, "H")?;
                positive(&m.q3_enc, "q^3 encryption")?;
                per_party(&m.mulstar_proofs, from, n, "mul* proofs")?;
                per_party(&m.d_chis, from, n, "D chis")?;
                per_party(&m.f_chis, from, n, "F chis")?;
                per_party(&m.dec_proofs, from, n, "dec proofs")
            }
        }
    }
}

fn positive(x: &BigNumber, field: &'static str) -> Result<(), MalformedMessage> {
    if x > &BigNumber::zero() {
        Ok(())
    } else {
        Err(MalformedMessage::NonPositive(field))
    }
}

fn non_zero<E: Curve>(point: &Point<E>, field: &'static str) -> Result<(), MalformedMessage> {
    if point.is_zero() {
        Err(MalformedMessage::PointAtInfinity(field))
    } else {
        Ok(())
    }
}

/// Checks that the vector has an entry for every party except the sender
fn per_party<T>(
    entries: &[Option<T>],
    from: PartyIndex,
    n: u16,
    field: &'static str,
) -> Result<(), MalformedMessage> {
    if entries.len() != usize::from(n) {
        return Err(MalformedMessage::InvalidLength {
            field,
            expected: n,
            got: entries.len(),
        });
    }
    for (j, entry) in (0..n).zip(entries) {
        match (j == from, entry.is_some()) {
            (true, true) => return Err(MalformedMessage::UnexpectedEntry(field)),
            (false, false) => return Err(MalformedMessage::MissingEntry { field, party: j }),
            _ => {}
        }
    }
    Ok(())
}

/// Typed access to a content of [`Msg`]
pub(crate) trait RoundMessage<E: Curve>: Sized {
    /// Round producing messages of this type
    const ROUND: RoundKind;
    fn from_msg(msg: &Msg<E>) -> Option<&Self>;
}

macro_rules! round_message {
    ($variant:ident, $round:ident, $ty:ty) => {
        impl<E: Curve> RoundMessage<E> for $ty {
            const ROUND: RoundKind = RoundKind::$round;
            fn from_msg(msg: &Msg<E>) -> Option<&Self> {
                match msg {
                    Msg::$variant(m) => Some(m),
                    _ => None,
                }
            }
        }
    };
}

round_message!(PresignRound1, Presign1, PresignRound1);
round_message!(PresignRound2, Presign2, PresignRound2<E>);
round_message!(PresignRound3, Presign3, PresignRound3<E>);
round_message!(PresignIdentification, PresignIdentification, PresignIdentification);
round_message!(SignRound1, Sign1, SignRound1<E>);
round_message!(SignIdentification, SignIdentification, SignIdentification<E>);

/// Message is structurally invalid
#[derive(Debug, Error)]
pub enum MalformedMessage {
    /// Message claims to come from the local party
    #[error("message claims to come from the local party")]
    FromSelf,
    /// Sender is not in the party set
    #[error("sender is not in the party set")]
    UnknownSender,
    /// P2P message addressed to another party
    #[error("message is addressed to another party")]
    NotAddressedToUs,
    /// Broadcast message sent P2P or vice versa
    #[error("message delivered via wrong channel")]
    WrongDelivery,
    /// Message belongs to another protocol
    #[error("message belongs to another protocol")]
    WrongProtocol,
    /// Integer field is not positive
    #[error("{0} is not positive")]
    NonPositive(&'static str),
    /// Point field is the identity
    #[error("{0} is point at infinity")]
    PointAtInfinity(&'static str),
    /// Per-party vector has wrong length
    #[error("{field} has {got} entries, expected {expected}")]
    InvalidLength {
        /// Field name
        field: &'static str,
        /// Number of parties
        expected: u16,
        /// Actual length
        got: usize,
    },
    /// Per-party vector lacks an entry
    #[error("{field} lacks entry for party {party}")]
    MissingEntry {
        /// Field name
        field: &'static str,
        /// Index of the missing entry
        party: PartyIndex,
    },
    /// Per-party vector has an entry for the sender itself
    #[error("{0} has entry for the sender")]
    UnexpectedEntry(&'static str),
}
